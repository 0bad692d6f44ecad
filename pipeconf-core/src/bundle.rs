use crate::models::FileRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A named pipeline configuration handed back to the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigDocument {
    pub name: String,
    pub data: String,
}

/// Response body of a successful configuration request
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigBundle {
    pub configs: Vec<ConfigDocument>,
}

impl ConfigBundle {
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }
}

/// Strip a trailing `.yml`, then a trailing `.yaml`, from a file name
pub fn strip_yaml_extension(name: &str) -> &str {
    let name = name.strip_suffix(".yml").unwrap_or(name);
    name.strip_suffix(".yaml").unwrap_or(name)
}

/// Turn fetched files into configuration documents.
///
/// Content is passed through byte for byte. Each document is also parsed as
/// YAML, but only to log a diagnostic: a document that fails to parse is
/// still returned. Documents whose stripped names collide are all kept.
pub fn build_response(records: Vec<FileRecord>) -> ConfigBundle {
    let configs = records
        .into_iter()
        .map(|record| {
            debug!(file = %record.name, bytes = record.content.len(), "Assembling config");
            match validate_yaml(&record.content) {
                Ok(documents) => debug!(file = %record.name, documents, "YAML validation passed"),
                Err(e) => warn!(file = %record.name, error = %e, "YAML validation failed"),
            }

            ConfigDocument {
                name: strip_yaml_extension(&record.name).to_string(),
                data: record.content,
            }
        })
        .collect();

    ConfigBundle { configs }
}

fn validate_yaml(content: &str) -> std::result::Result<usize, serde_yaml::Error> {
    let mut documents = 0;
    for document in serde_yaml::Deserializer::from_str(content) {
        serde_yaml::Value::deserialize(document)?;
        documents += 1;
    }
    Ok(documents)
}
