use clap::{builder::BoolishValueParser, ArgAction, Parser};
use pipeconf_backend::{BackendKind, ProviderConfig, TlsMode};
use pipeconf_template::set::{
    DEFAULT_BRANCH_TEMPLATE, DEFAULT_NAMESPACE_TEMPLATE, DEFAULT_PATH_TEMPLATE, DEFAULT_REPONAME_TEMPLATE,
};
use pipeconf_template::TemplateSet;

pub const DEFAULT_SERVER_URL: &str = "https://git.local.lan";

/// Process configuration, read once at startup from flags or environment.
///
/// Template settings accept a Woodpecker-style variable and fall back to the
/// Drone-style one. Empty values count as unset.
#[derive(Parser, Debug, Clone)]
#[command(name = "pipeconf-server")]
#[command(about = "Serves pipeline configs stored in a Git-hosting backend", long_about = None)]
pub struct Settings {
    /// Backend type: gitea, github or gitlab [default: gitea]
    #[arg(long, env = "SERVERTYPE")]
    pub server_type: Option<String>,

    /// API token sent as a bearer credential
    #[arg(long, env = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Backend endpoint [default: https://git.local.lan]
    #[arg(long, env = "SERVER_URL")]
    pub server_url: Option<String>,

    /// Gitea endpoint, overrides --server-url for the gitea backend
    #[arg(long, env = "GITEA_URL")]
    pub gitea_url: Option<String>,

    /// Gitea token, overrides --token for the gitea backend
    #[arg(long, env = "GITEA_TOKEN", hide_env_values = true)]
    pub gitea_token: Option<String>,

    /// Namespace template [default: {{ .Repo.Owner }}]
    #[arg(long, env = "WOODPECKER_CONFIG_NAMESPACE_TEMP")]
    pub namespace_template: Option<String>,

    #[arg(long, env = "DRONE_CONFIG_NAMESPACE_TEMP", hide = true)]
    pub drone_namespace_template: Option<String>,

    /// Repository name template [default: woodpeckerfiles]
    #[arg(long, env = "WOODPECKER_CONFIG_REPONAME_TEMP")]
    pub reponame_template: Option<String>,

    #[arg(long, env = "DRONE_CONFIG_REPONAME_TEMP", hide = true)]
    pub drone_reponame_template: Option<String>,

    /// Branch template [default: {{ .Pipeline.Branch }}]
    #[arg(long, env = "WOODPECKER_CONFIG_BRANCH_TEMP")]
    pub branch_template: Option<String>,

    #[arg(long, env = "DRONE_CONFIG_BRANCH_TEMP", hide = true)]
    pub drone_branch_template: Option<String>,

    /// Path template [default: {{ .Repo.Name }}/{{ .Pipeline.Branch }}]
    #[arg(long, env = "WOODPECKER_CONFIG_YAMLPATH_TEMP")]
    pub path_template: Option<String>,

    #[arg(long, env = "DRONE_CONFIG_YAMLPATH_TEMP", hide = true)]
    pub drone_path_template: Option<String>,

    /// Accept any TLS certificate from the backend
    #[arg(
        long,
        env = "TLS_SKIP_VERIFY",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub tls_skip_verify: bool,

    /// Debug logging
    #[arg(long, env = "PLUGIN_DEBUG", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub debug: bool,

    /// Address to listen on
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8000")]
    pub listen: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn first_set<'a>(primary: &'a Option<String>, fallback: &'a Option<String>, default: &'a str) -> &'a str {
    non_empty(primary).or_else(|| non_empty(fallback)).unwrap_or(default)
}

impl Settings {
    pub fn server_type(&self) -> &str {
        non_empty(&self.server_type).unwrap_or(BackendKind::Gitea.as_str())
    }

    pub fn templates(&self) -> TemplateSet {
        TemplateSet::new(
            first_set(&self.namespace_template, &self.drone_namespace_template, DEFAULT_NAMESPACE_TEMPLATE),
            first_set(&self.reponame_template, &self.drone_reponame_template, DEFAULT_REPONAME_TEMPLATE),
            first_set(&self.branch_template, &self.drone_branch_template, DEFAULT_BRANCH_TEMPLATE),
            first_set(&self.path_template, &self.drone_path_template, DEFAULT_PATH_TEMPLATE),
        )
    }

    pub fn provider_config(&self) -> ProviderConfig {
        let backend_type = self.server_type().to_string();
        let is_gitea = backend_type.eq_ignore_ascii_case(BackendKind::Gitea.as_str());

        let mut endpoint = non_empty(&self.server_url).unwrap_or(DEFAULT_SERVER_URL);
        let mut token = non_empty(&self.token).unwrap_or_default();
        if is_gitea {
            endpoint = non_empty(&self.gitea_url).unwrap_or(endpoint);
            token = non_empty(&self.gitea_token).unwrap_or(token);
        }

        ProviderConfig {
            backend_type,
            endpoint: endpoint.to_string(),
            token: token.to_string(),
            tls: TlsMode::from_skip_verify(self.tls_skip_verify),
            templates: self.templates(),
        }
    }
}

/// First and last eight characters of long tokens, for startup logs
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 16 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 8..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "*".repeat(chars.len())
    }
}
