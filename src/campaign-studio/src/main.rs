//! Campaign Studio: author email campaigns from the terminal.
//!
//! Talks to a campaign backend over REST, or runs a local one with `serve`.

mod commands;

use campaign_core::config::AppConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "campaign-studio")]
#[command(about = "Create and edit email campaigns with live MJML preview")]
#[command(version)]
struct Cli {
    /// Config file name without extension
    #[arg(long, global = true, default_value = "campaign-studio")]
    config: String,

    /// Backend base URL (overrides config)
    #[arg(long, global = true, env = "CAMPAIGN_STUDIO__API__BASE_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the local development backend
    Serve {
        /// HTTP port (overrides config)
        #[arg(long, env = "CAMPAIGN_STUDIO__SERVER__HTTP_PORT")]
        http_port: Option<u16>,

        /// Skip the Prometheus exporter
        #[arg(long, default_value_t = false)]
        no_metrics: bool,
    },
    /// Render MJML to preview HTML from a file or stdin
    Preview {
        file: Option<PathBuf>,

        /// Re-render whenever the file changes
        #[arg(long, default_value_t = false, requires = "file")]
        watch: bool,
    },
    /// Log in and persist the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CAMPAIGN_STUDIO_PASSWORD")]
        password: String,
    },
    /// Clear the persisted session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List available templates
    Templates,
    /// List available segments
    Segments,
    /// Create a campaign through the wizard
    Create(CreateArgs),
    /// Edit an existing campaign through the wizard
    Edit(EditArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub template: i64,
    #[arg(long)]
    pub segment: i64,
    /// Send time (RFC 3339 or YYYY-MM-DDTHH:MM, UTC). Omit to save as draft.
    #[arg(long)]
    pub send_at: Option<String>,
    /// MJML file replacing the template content
    #[arg(long)]
    pub content: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: i64,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub template: Option<i64>,
    #[arg(long)]
    pub segment: Option<i64>,
    #[arg(long, conflicts_with = "draft")]
    pub send_at: Option<String>,
    /// Drop the schedule and save as draft
    #[arg(long, default_value_t = false)]
    pub draft: bool,
    #[arg(long)]
    pub content: Option<PathBuf>,
    /// Replace the current content with the template's markup
    #[arg(long, default_value_t = false, conflicts_with = "content")]
    pub reset_content: bool,
}

fn init_tracing(serving: bool) {
    let default_filter = if serving {
        "campaign_studio=info,campaign_api=info,tower_http=info"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    if serving {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Command::Serve { .. }));

    let mut config = AppConfig::load_from(&cli.config).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }

    match cli.command {
        Command::Serve {
            http_port,
            no_metrics,
        } => {
            if let Some(port) = http_port {
                config.server.http_port = port;
            }
            info!(
                host = %config.server.host,
                http_port = config.server.http_port,
                metrics_port = config.server.metrics_port,
                "Configuration loaded"
            );
            commands::serve(config, !no_metrics).await
        }
        Command::Preview { file, watch } => match (file, watch) {
            (Some(path), true) => commands::watch_preview(&path, config.preview.debounce()).await,
            (file, _) => commands::preview(file.as_deref()),
        },
        Command::Login { email, password } => commands::login(&config, &email, &password).await,
        Command::Logout => commands::logout(&config),
        Command::Whoami => commands::whoami(&config).await,
        Command::Templates => commands::templates(&config).await,
        Command::Segments => commands::segments(&config).await,
        Command::Create(args) => commands::create(&config, args).await.map(|_| ()),
        Command::Edit(args) => commands::edit(&config, args).await.map(|_| ()),
    }
}
