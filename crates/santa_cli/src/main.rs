mod commands;
mod output;

use clap::{Parser, Subcommand};
use miette::Result;
use owo_colors::OwoColorize;
use santa_server::{ServerConfig, start_server, state::open_exchange};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "santa-cli")]
#[command(about = "Secret Santa exchange operator CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Database file path (overrides config)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Create an administrator account
    CreateAdmin {
        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Login handle
        #[arg(long)]
        username: Option<String>,
    },
    /// List users with their assignment status
    Users,
    /// Generate a new set of assignments
    Generate,
    /// Show every giver → receiver pair
    Assignments,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .with_syntax_highlighting(miette::highlighters::SyntectHighlighter::default())
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    // Initialize tracing
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = if cli.debug {
        EnvFilter::new("santa_core=debug,santa_server=debug,santa_cli=debug,tower_http=debug")
    } else {
        EnvFilter::new("santa_core=info,santa_server=info,santa_cli=info,warn")
    };

    fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339())
        .compact()
        .init();

    // Load configuration
    let mut config = ServerConfig::load(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(db_path) = &cli.db_path {
        info!("Overriding database path with: {:?}", db_path);
        config.database_url = format!("surrealkv://{}", db_path.display());
    }

    tracing::debug!("Using database {}", config.database_url);

    match cli.command {
        Commands::Serve => {
            println!(
                "{} {}",
                "Serving on".bright_green(),
                config.bind_address.bright_cyan()
            );
            start_server(config).await?;
        }
        Commands::CreateAdmin { name, username } => {
            let exchange = open_exchange(&config).await?;
            commands::admin::create_admin(&exchange, name, username).await?;
        }
        Commands::Users => commands::admin::users(&*open_exchange(&config).await?).await?,
        Commands::Generate => commands::exchange::generate(&*open_exchange(&config).await?).await?,
        Commands::Assignments => {
            commands::exchange::assignments(&*open_exchange(&config).await?).await?
        }
    }

    Ok(())
}
