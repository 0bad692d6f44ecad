use crate::backend::{Backend, BackendKind};
use crate::connection::{Connection, TlsMode};
use crate::gitea::GiteaBackend;
use crate::github::GitHubBackend;
use crate::gitlab::GitLabBackend;
use pipeconf_core::{Coordinates, EventContext, FetchError, FileRecord, PipeconfError, Result};
use pipeconf_template::TemplateSet;
use tracing::info;

/// Process-wide provider settings, fixed at startup
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// `github`, `gitlab` or `gitea`, in any case
    pub backend_type: String,
    pub endpoint: String,
    pub token: String,
    pub tls: TlsMode,
    pub templates: TemplateSet,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend_type: BackendKind::Gitea.as_str().to_string(),
            endpoint: "https://git.local.lan".to_string(),
            token: String::new(),
            tls: TlsMode::default(),
            templates: TemplateSet::default(),
        }
    }
}

/// Resolves an event to the override files stored on the configured backend
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: ProviderConfig,
}

impl Dispatcher {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn resolve_coordinates(&self, event: &EventContext) -> Result<Coordinates> {
        Ok(self.config.templates.resolve(event)?)
    }

    /// Build the adapter named by `backend_type`. The endpoint must be an
    /// absolute URL.
    pub fn select_backend(&self) -> Result<Box<dyn Backend>> {
        let kind: BackendKind = self.config.backend_type.parse()?;
        let connection = Connection::new(&self.config.endpoint, &self.config.token, self.config.tls);
        connection.api_base("").map_err(configuration_error)?;

        Ok(match kind {
            BackendKind::GitHub => Box::new(GitHubBackend::new(connection)),
            BackendKind::GitLab => Box::new(GitLabBackend::new(connection)),
            BackendKind::Gitea => Box::new(GiteaBackend::new(connection)),
        })
    }

    /// Render the coordinates, pick the backend and fetch the directory.
    /// Template failures return before any backend is contacted.
    pub async fn resolve_files(&self, event: &EventContext) -> Result<Vec<FileRecord>> {
        let coords = self.resolve_coordinates(event)?;
        let backend = self.select_backend()?;

        info!(
            backend = %backend.kind(),
            namespace = %coords.namespace,
            repository = %coords.repository,
            branch = %coords.branch,
            path = %coords.path,
            "Fetching config directory"
        );

        backend.fetch_directory(&coords).await.map_err(configuration_error)
    }
}

/// Client setup failures are operator mistakes, not a missing directory
fn configuration_error(err: FetchError) -> PipeconfError {
    match err {
        FetchError::Client(message) => PipeconfError::InvalidConfiguration(message),
        other => PipeconfError::Fetch(other),
    }
}
