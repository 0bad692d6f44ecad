use crate::backend::{Backend, BackendKind};
use crate::connection::{check_status, join_segments, path_segments, send, Connection, Target};
use crate::decode::{decode_base64, into_text};
use async_trait::async_trait;
use pipeconf_core::{Coordinates, DirEntry, EntryKind, FetchError};
use reqwest::{Client, Url};
use serde::Deserialize;

pub const PUBLIC_API_HOST: &str = "api.github.com";
const ENTERPRISE_API_SUFFIX: &str = "/api/v3";
const API_VERSION: &str = "2022-11-28";

/// Item of the repository contents API
#[derive(Debug, Deserialize)]
struct ContentItem {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// A directory comes back as an array, a single file as an object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Directory(Vec<ContentItem>),
    File(Box<ContentItem>),
}

impl ContentItem {
    fn entry_kind(&self) -> EntryKind {
        match self.kind.as_str() {
            "file" => EntryKind::File,
            "dir" => EntryKind::Directory,
            "symlink" => EntryKind::Symlink,
            "submodule" => EntryKind::Submodule,
            _ => EntryKind::Other,
        }
    }

    /// File text as the contents client hands it out. The payload's
    /// `encoding` is honoured here, so callers never decode again.
    fn decoded_content(&self) -> Result<String, FetchError> {
        let content = self.content.as_deref().unwrap_or_default();
        match self.encoding.as_deref() {
            Some("base64") => into_text(decode_base64(content)?),
            Some("") | None => Ok(content.to_string()),
            Some(other) => Err(FetchError::Decode(format!(
                "unsupported content encoding {:?} for {}",
                other, self.path
            ))),
        }
    }
}

/// Base URL for API calls: the endpoint itself for github.com, otherwise
/// the Enterprise `/api/v3` root of a self-hosted instance.
pub fn api_base_url(conn: &Connection) -> Result<Url, FetchError> {
    if conn.endpoint().contains(PUBLIC_API_HOST) {
        conn.api_base("")
    } else {
        conn.api_base(ENTERPRISE_API_SUFFIX)
    }
}

/// GitHub and GitHub Enterprise, via the repository contents API
#[derive(Debug, Clone)]
pub struct GitHubBackend {
    connection: Connection,
}

impl GitHubBackend {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    async fn get_contents(
        &self,
        client: &Client,
        coords: &Coordinates,
        path: &str,
        target: Target<'_>,
    ) -> Result<ContentsResponse, FetchError> {
        let base = api_base_url(&self.connection)?;
        let url = join_segments(
            &base,
            ["repos", coords.namespace.as_str(), coords.repository.as_str(), "contents"]
                .into_iter()
                .chain(path_segments(path)),
        )?;

        let request = client
            .get(url)
            .query(&[("ref", coords.branch.as_str())])
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);

        let response = send(self.connection.authorize(request)).await?;
        let response = check_status(response, target).await?;

        response
            .json::<ContentsResponse>()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl Backend for GitHubBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::GitHub
    }

    fn connection(&self) -> &Connection {
        &self.connection
    }

    async fn list_entries(&self, client: &Client, coords: &Coordinates) -> Result<Vec<DirEntry>, FetchError> {
        match self
            .get_contents(client, coords, &coords.path, Target::Directory(&coords.path))
            .await?
        {
            ContentsResponse::Directory(items) => Ok(items
                .into_iter()
                .map(|item| {
                    let kind = item.entry_kind();
                    DirEntry::new(item.name, item.path, kind)
                })
                .collect()),
            ContentsResponse::File(_) => Err(FetchError::NotADirectory(coords.path.clone())),
        }
    }

    async fn fetch_file(&self, client: &Client, coords: &Coordinates, entry: &DirEntry) -> Result<String, FetchError> {
        match self
            .get_contents(client, coords, &entry.path, Target::File(&entry.path))
            .await?
        {
            ContentsResponse::File(item) => item.decoded_content(),
            ContentsResponse::Directory(_) => Err(FetchError::InvalidResponse(format!(
                "expected a file at {}",
                entry.path
            ))),
        }
    }
}
