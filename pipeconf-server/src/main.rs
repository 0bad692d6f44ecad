use clap::Parser;
use pipeconf_backend::Dispatcher;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod error;
mod routes;
mod settings;

use routes::{router, AppState};
use settings::{mask_token, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::parse();

    // RUST_LOG wins; otherwise PLUGIN_DEBUG picks the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if settings.debug { "debug" } else { "info" })
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = settings.provider_config();

    info!(
        server_type = %config.backend_type,
        endpoint = %config.endpoint,
        token = %mask_token(&config.token),
        namespace_tmpl = %config.templates.namespace,
        reponame_tmpl = %config.templates.repository,
        branch_tmpl = %config.templates.branch,
        path_tmpl = %config.templates.path,
        debug = settings.debug,
        "Starting pipeconf-server"
    );

    if config.token.is_empty() {
        warn!("No token configured, backend requests are sent unauthenticated");
    }
    if config.tls.skips_verification() {
        warn!("TLS certificate verification is disabled for backend requests");
    }
    if let Err(e) = config.templates.validate() {
        warn!(error = %e, "Template does not parse, every request will be rejected");
    }

    let dispatcher = Dispatcher::new(config);
    if let Err(e) = dispatcher.select_backend() {
        error!(error = %e, "Backend settings are unusable, every request will fail");
    }

    let state = AppState::new(dispatcher, settings.debug);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&settings.listen).await?;
    info!("Server listening on http://{}", settings.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
