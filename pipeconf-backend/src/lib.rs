pub mod backend;
pub mod connection;
pub mod decode;
pub mod dispatcher;
pub mod gitea;
pub mod github;
pub mod gitlab;

pub use backend::{Backend, BackendKind};
pub use connection::{Connection, TlsMode};
pub use dispatcher::{Dispatcher, ProviderConfig};
pub use gitea::GiteaBackend;
pub use github::GitHubBackend;
pub use gitlab::GitLabBackend;
