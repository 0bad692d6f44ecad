use clap::{Args, Parser, Subcommand};
use pipeconf_core::{ConfigBundle, EventContext};
use pipeconf_template::TemplateSet;
use reqwest::{Client, StatusCode};
use std::fs;
use std::process;
use tracing::debug;

#[derive(Parser)]
#[command(name = "pipeconf")]
#[command(about = "Pipeconf config provider CLI client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Server URL
    #[arg(long, default_value = "http://localhost:8000")]
    server: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health
    Health,

    /// Ask the server for the configs matching an event
    Resolve {
        /// Path to the event JSON
        #[arg(short, long)]
        event: String,
    },

    /// Render the coordinate templates locally against an event
    Render {
        /// Path to the event JSON
        #[arg(short, long)]
        event: String,

        #[command(flatten)]
        templates: TemplateArgs,
    },
}

#[derive(Args)]
struct TemplateArgs {
    /// Namespace template
    #[arg(long)]
    namespace: Option<String>,

    /// Repository name template
    #[arg(long)]
    reponame: Option<String>,

    /// Branch template
    #[arg(long)]
    branch: Option<String>,

    /// Directory path template
    #[arg(long)]
    path: Option<String>,
}

impl TemplateArgs {
    fn into_template_set(self) -> TemplateSet {
        let defaults = TemplateSet::default();
        TemplateSet {
            namespace: self.namespace.unwrap_or(defaults.namespace),
            repository: self.reponame.unwrap_or(defaults.repository),
            branch: self.branch.unwrap_or(defaults.branch),
            path: self.path.unwrap_or(defaults.path),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Health => {
            let url = format!("{}/health", cli.server);
            let response = client.get(&url).send().await?;
            if response.status().is_success() {
                println!("Server is healthy");
                process::exit(0);
            } else {
                eprintln!("Server is unhealthy");
                process::exit(1);
            }
        }
        Commands::Resolve { event } => {
            resolve_configs(&client, &cli.server, &event).await?;
        }
        Commands::Render { event, templates } => {
            render_coordinates(&event, templates.into_template_set())?;
        }
    }

    Ok(())
}

fn read_event_file(path: &str) -> anyhow::Result<String> {
    fs::read_to_string(path).map_err(|e| anyhow::anyhow!("Failed to read event at {}: {}", path, e))
}

async fn resolve_configs(client: &Client, server: &str, event_path: &str) -> anyhow::Result<()> {
    let body = read_event_file(event_path)?;
    // Validate locally so typos fail before the round trip
    serde_json::from_str::<EventContext>(&body)
        .map_err(|e| anyhow::anyhow!("Invalid event JSON in {}: {}", event_path, e))?;

    let url = format!("{}/ciconfig", server);
    debug!(%url, "Posting event");
    let response = client
        .post(&url)
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await?;

    match response.status() {
        StatusCode::OK => {
            let bundle: ConfigBundle = response.json().await?;
            println!("✓ {} config(s) returned:\n", bundle.len());
            for config in bundle.configs {
                println!("--- {} ---", config.name);
                println!("{}", config.data.trim_end());
                println!();
            }
        }
        StatusCode::NO_CONTENT => {
            println!("No override: the repository's own config will be used");
        }
        status => {
            let error_text = response.text().await.unwrap_or_default();
            eprintln!("Failed to resolve configs ({}): {}", status, error_text);
            process::exit(1);
        }
    }

    Ok(())
}

fn render_coordinates(event_path: &str, templates: TemplateSet) -> anyhow::Result<()> {
    let body = read_event_file(event_path)?;
    let event: EventContext = serde_json::from_str(&body)
        .map_err(|e| anyhow::anyhow!("Invalid event JSON in {}: {}", event_path, e))?;

    let coords = templates
        .resolve(&event)
        .map_err(|e| anyhow::anyhow!("Failed to render templates: {}", e))?;

    println!("Namespace:  {}", coords.namespace);
    println!("Repository: {}", coords.repository);
    println!("Branch:     {}", coords.branch);
    println!("Path:       {}", coords.path);
    Ok(())
}
