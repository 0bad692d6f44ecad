use pipeconf_core::FetchError;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};

const USER_AGENT: &str = concat!("pipeconf/", env!("CARGO_PKG_VERSION"));

/// Whether TLS certificates presented by the backend are checked.
///
/// Backends are often internal servers with self-signed certificates, so the
/// service skips verification unless told otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsMode {
    Verify,
    #[default]
    SkipVerify,
}

impl TlsMode {
    pub fn from_skip_verify(skip: bool) -> Self {
        if skip {
            TlsMode::SkipVerify
        } else {
            TlsMode::Verify
        }
    }

    pub fn skips_verification(&self) -> bool {
        matches!(self, TlsMode::SkipVerify)
    }
}

/// Endpoint, credential and trust settings for one backend
#[derive(Debug, Clone)]
pub struct Connection {
    endpoint: String,
    token: String,
    tls: TlsMode,
}

impl Connection {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>, tls: TlsMode) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            tls,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn tls(&self) -> TlsMode {
        self.tls
    }

    /// Build a new HTTP client. Called once per directory fetch; clients are
    /// not shared between requests.
    pub fn http_client(&self) -> Result<Client, FetchError> {
        Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(self.tls.skips_verification())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))
    }

    /// Endpoint with `suffix` appended unless it already ends with it
    pub fn api_base(&self, suffix: &str) -> Result<Url, FetchError> {
        let trimmed = self.endpoint.trim_end_matches('/');
        let base = if suffix.is_empty() || trimmed.ends_with(suffix) {
            trimmed.to_string()
        } else {
            format!("{}{}", trimmed, suffix)
        };
        Url::parse(&base)
            .map_err(|e| FetchError::Client(format!("invalid endpoint {:?}: {}", self.endpoint, e)))
    }

    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.token)
        }
    }
}

/// Append path segments to `base`. Each segment is percent-encoded on its
/// own, so a `/` inside a segment becomes `%2F`.
pub(crate) fn join_segments<'a, I>(base: &Url, segments: I) -> Result<Url, FetchError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| FetchError::Client(format!("endpoint {} cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Split a repository path into its non-empty components
pub(crate) fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// What a request was trying to read, for error reporting
pub(crate) enum Target<'a> {
    Directory(&'a str),
    File(&'a str),
}

pub(crate) async fn send(request: RequestBuilder) -> Result<Response, FetchError> {
    request
        .send()
        .await
        .map_err(|e| FetchError::Unreachable(e.to_string()))
}

/// Map a non-success status onto the fetch error taxonomy
pub(crate) async fn check_status(response: Response, target: Target<'_>) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    let path = match target {
        Target::Directory(path) if status == StatusCode::NOT_FOUND => {
            return Err(FetchError::DirectoryNotFound(path.to_string()));
        }
        Target::Directory(path) | Target::File(path) => path,
    };

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(FetchError::Unauthorized(format!("{}: {}", status, message.trim())));
    }

    Err(FetchError::Api {
        status: status.as_u16(),
        message: format!("{}: {}", path, message.trim()),
    })
}
