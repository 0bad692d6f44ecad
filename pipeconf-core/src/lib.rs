pub mod bundle;
pub mod error;
pub mod models;

pub use bundle::{build_response, strip_yaml_extension, ConfigBundle, ConfigDocument};
pub use error::{FetchError, PipeconfError, Result, TemplateError};
pub use models::*;
