use crate::backend::{Backend, BackendKind};
use crate::connection::{check_status, join_segments, path_segments, send, Connection, Target};
use crate::decode::into_text;
use async_trait::async_trait;
use pipeconf_core::{Coordinates, DirEntry, EntryKind, FetchError};
use reqwest::{Client, Url};
use serde::Deserialize;

const API_SUFFIX: &str = "/api/v1";

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Directory(Vec<ContentsEntry>),
    File(Box<ContentsEntry>),
}

impl ContentsEntry {
    fn entry_kind(&self) -> EntryKind {
        match self.kind.as_str() {
            "file" => EntryKind::File,
            "dir" => EntryKind::Directory,
            "symlink" => EntryKind::Symlink,
            "submodule" => EntryKind::Submodule,
            _ => EntryKind::Other,
        }
    }
}

/// Gitea (and Forgejo), via the contents and raw file APIs
#[derive(Debug, Clone)]
pub struct GiteaBackend {
    connection: Connection,
}

impl GiteaBackend {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// `repos/<namespace>/<repo>/<endpoint>/<path..>`
    fn repo_url(&self, coords: &Coordinates, endpoint: &str, path: &str) -> Result<Url, FetchError> {
        let base = self.connection.api_base(API_SUFFIX)?;
        join_segments(
            &base,
            ["repos", coords.namespace.as_str(), coords.repository.as_str(), endpoint]
                .into_iter()
                .chain(path_segments(path)),
        )
    }
}

#[async_trait]
impl Backend for GiteaBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Gitea
    }

    fn connection(&self) -> &Connection {
        &self.connection
    }

    async fn list_entries(&self, client: &Client, coords: &Coordinates) -> Result<Vec<DirEntry>, FetchError> {
        let url = self.repo_url(coords, "contents", &coords.path)?;
        let request = client.get(url).query(&[("ref", coords.branch.as_str())]);

        let response = send(self.connection.authorize(request)).await?;
        let response = check_status(response, Target::Directory(&coords.path)).await?;

        match response
            .json::<ContentsResponse>()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?
        {
            ContentsResponse::Directory(entries) => Ok(entries
                .into_iter()
                .map(|entry| {
                    let kind = entry.entry_kind();
                    DirEntry::new(entry.name, entry.path, kind)
                })
                .collect()),
            ContentsResponse::File(file) => Err(FetchError::NotADirectory(file.path)),
        }
    }

    async fn fetch_file(&self, client: &Client, coords: &Coordinates, entry: &DirEntry) -> Result<String, FetchError> {
        let url = self.repo_url(coords, "raw", &entry.path)?;
        let request = client.get(url).query(&[("ref", coords.branch.as_str())]);

        let response = send(self.connection.authorize(request)).await?;
        let response = check_status(response, Target::File(&entry.path)).await?;

        // Raw endpoint: the body is the file itself, no decoding step
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Unreachable(e.to_string()))?;
        into_text(bytes.to_vec())
    }
}
