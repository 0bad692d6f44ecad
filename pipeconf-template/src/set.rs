use crate::parser::parse_template;
use crate::render::render;
use pipeconf_core::{Coordinates, EventContext, TemplateError};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_NAMESPACE_TEMPLATE: &str = "{{ .Repo.Owner }}";
pub const DEFAULT_REPONAME_TEMPLATE: &str = "woodpeckerfiles";
pub const DEFAULT_BRANCH_TEMPLATE: &str = "{{ .Pipeline.Branch }}";
pub const DEFAULT_PATH_TEMPLATE: &str = "{{ .Repo.Name }}/{{ .Pipeline.Branch }}";

/// The four coordinate templates, rendered independently per request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateSet {
    pub namespace: String,
    pub repository: String,
    pub branch: String,
    pub path: String,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE_TEMPLATE.to_string(),
            repository: DEFAULT_REPONAME_TEMPLATE.to_string(),
            branch: DEFAULT_BRANCH_TEMPLATE.to_string(),
            path: DEFAULT_PATH_TEMPLATE.to_string(),
        }
    }
}

impl TemplateSet {
    pub fn new(
        namespace: impl Into<String>,
        repository: impl Into<String>,
        branch: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            repository: repository.into(),
            branch: branch.into(),
            path: path.into(),
        }
    }

    /// Render namespace, repository, branch and path, in that order.
    /// The first failure is returned and the remaining slots are not rendered.
    pub fn resolve(&self, event: &EventContext) -> Result<Coordinates, TemplateError> {
        let coordinates = Coordinates {
            namespace: render(&self.namespace, event)?,
            repository: render(&self.repository, event)?,
            branch: render(&self.branch, event)?,
            path: render(&self.path, event)?,
        };

        debug!(
            namespace = %coordinates.namespace,
            repository = %coordinates.repository,
            branch = %coordinates.branch,
            path = %coordinates.path,
            "Resolved coordinates"
        );

        Ok(coordinates)
    }

    /// Check that all four templates parse. Field names are only checked
    /// at render time, against a real event.
    pub fn validate(&self) -> Result<(), TemplateError> {
        for template in [&self.namespace, &self.repository, &self.branch, &self.path] {
            parse_template(template)?;
        }
        Ok(())
    }
}
