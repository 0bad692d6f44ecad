use crate::connection::Connection;
use async_trait::async_trait;
use pipeconf_core::{Coordinates, DirEntry, FetchError, FileRecord, PipeconfError};
use reqwest::Client;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Supported Git-hosting services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    GitHub,
    GitLab,
    Gitea,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::GitHub, BackendKind::GitLab, BackendKind::Gitea];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::GitHub => "github",
            BackendKind::GitLab => "gitlab",
            BackendKind::Gitea => "gitea",
        }
    }
}

impl FromStr for BackendKind {
    type Err = PipeconfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PipeconfError::UnsupportedBackend(s.to_string()))
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Git-hosting service that can list a directory and read files from it.
///
/// Implementors supply the listing call and the per-file read, including
/// whatever decoding their API needs. `fetch_directory` drives both and is
/// the same for every service.
#[async_trait]
pub trait Backend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn connection(&self) -> &Connection;

    /// List the entries of `coords.path` on `coords.branch`
    async fn list_entries(&self, client: &Client, coords: &Coordinates) -> Result<Vec<DirEntry>, FetchError>;

    /// Read one file and return its decoded text
    async fn fetch_file(&self, client: &Client, coords: &Coordinates, entry: &DirEntry) -> Result<String, FetchError>;

    /// Fetch every `.yml`/`.yaml` file directly under `coords.path`.
    ///
    /// A failed listing fails the call. A file that cannot be read or decoded
    /// is logged and left out.
    async fn fetch_directory(&self, coords: &Coordinates) -> Result<Vec<FileRecord>, FetchError> {
        let client = self.connection().http_client()?;

        let entries = self.list_entries(&client, coords).await.map_err(|e| {
            debug!(backend = %self.kind(), error = %e, "Failed to list directory");
            e
        })?;

        debug!(backend = %self.kind(), count = entries.len(), "Found items in directory");

        let mut records = Vec::new();
        for entry in &entries {
            if !entry.is_yaml_file() {
                debug!(name = %entry.name, kind = %entry.kind, "Skipping entry");
                continue;
            }

            match self.fetch_file(&client, coords, entry).await {
                Ok(content) => {
                    debug!(name = %entry.name, bytes = content.len(), "Loaded file");
                    records.push(FileRecord::new(entry, content));
                }
                Err(e) => {
                    warn!(path = %entry.path, error = %e, "Failed to fetch file, skipping");
                }
            }
        }

        info!(
            backend = %self.kind(),
            location = %coords,
            files = records.len(),
            "Directory fetch completed"
        );

        Ok(records)
    }
}
