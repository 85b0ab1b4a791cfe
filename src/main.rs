use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wikigate::auth::{ApiTokenAuth, AuthStrategy};
use wikigate::client::ConfluenceClient;
use wikigate::config::{Config, ConfigLoader, ConfluenceConfig};
use wikigate::types::{GateError, Result};

#[derive(Parser)]
#[command(name = "wikigate")]
#[command(version, about = "Confluence content gateway for AI agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Load configuration from this file instead of the default chain
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify credentials against the Confluence instance
    Verify,

    /// Search pages with a CQL query
    Search {
        #[arg(help = "CQL query, e.g. 'text ~ \"deployment\"'")]
        cql: String,
        #[arg(long, short, help = "Maximum results (1-100)")]
        limit: Option<u32>,
        #[arg(long, help = "Pagination offset")]
        start: Option<u32>,
        #[arg(long, help = "Emit JSON instead of text")]
        json: bool,
    },

    /// Retrieve a page's content
    Page {
        #[arg(help = "Page ID")]
        page_id: String,
        #[arg(long, help = "Return raw storage format instead of Markdown")]
        html: bool,
        #[arg(long, help = "Emit JSON instead of text")]
        json: bool,
    },

    /// List direct children of a page
    Children {
        #[arg(help = "Parent page ID")]
        page_id: String,
        #[arg(long, short, help = "Maximum results (1-100)")]
        limit: Option<u32>,
        #[arg(long, help = "Pagination offset")]
        start: Option<u32>,
        #[arg(long, help = "Emit JSON instead of text")]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show merged configuration (secrets masked in text output)
    Show {
        #[arg(long, help = "Emit JSON instead of text")]
        json: bool,
    },
    /// Show configuration file paths
    Path,
    /// Write a starter configuration file
    Init {
        #[arg(long, short, help = "Initialize the global config instead of the project config")]
        global: bool,
        #[arg(long, help = "Overwrite an existing config file")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!();
        eprintln!(
            "{}",
            style("wikigate encountered an unexpected error:").red().bold()
        );
        eprintln!("  {}", message);
        if let Some(location) = panic_info.location() {
            eprintln!(
                "{}",
                style(format!(
                    "Location: {}:{}:{}",
                    location.file(),
                    location.line(),
                    location.column()
                ))
                .dim()
            );
        }

        // Default hook prints the backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(details) = e.details() {
                eprintln!("  {}", style(details).dim());
            }
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => {
                let config = load_config(&cli.config)?;
                if json {
                    // api_token is never serialized
                    println!("{}", serde_json::to_string_pretty(&config)?);
                } else {
                    println!("{:#?}", config);
                }
                Ok(())
            }
            ConfigAction::Path => {
                ConfigLoader::show_path();
                Ok(())
            }
            ConfigAction::Init { global, force } => {
                let path = if global {
                    ConfigLoader::global_config_path().ok_or_else(|| {
                        GateError::Config(
                            "Cannot resolve config directory (set HOME or XDG_CONFIG_HOME)"
                                .to_string(),
                        )
                    })?
                } else {
                    ConfigLoader::project_config_path()
                };
                ConfigLoader::init(&path, force)?;
                println!(
                    "{} Wrote starter config to {}",
                    style("✓").green().bold(),
                    path.display()
                );
                Ok(())
            }
        },
        command => {
            let config = load_config(&cli.config)?;
            let rt = Runtime::new()?;
            rt.block_on(run_command(command, config.confluence))
        }
    }
}

fn load_config(path: &Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

async fn run_command(command: Commands, settings: ConfluenceConfig) -> Result<()> {
    let auth = Arc::new(ApiTokenAuth::new(
        settings.user_email.clone(),
        settings.api_token.clone(),
        Some(settings.base_url.clone()),
    )?);

    if let Commands::Verify = command {
        auth.authenticate().await?;
        println!(
            "{} Credentials verified for {}",
            style("✓").green().bold(),
            settings.base_url
        );
        return Ok(());
    }

    let mut client = ConfluenceClient::new(
        &settings.base_url,
        auth,
        settings.timeout_secs,
        settings.max_retries,
    );
    client.connect()?;

    let outcome = dispatch(&client, command).await;
    client.close();
    outcome
}

async fn dispatch(client: &ConfluenceClient, command: Commands) -> Result<()> {
    match command {
        Commands::Search {
            cql,
            limit,
            start,
            json,
        } => {
            let page = client.search_pages(&cql, limit, start).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
                return Ok(());
            }

            let total = page
                .total_size
                .map(|t| t.to_string())
                .unwrap_or_else(|| "?".to_string());
            println!("{} result(s) of {}", page.size, total);
            for hit in &page.results {
                println!(
                    "{}  {}",
                    style(&hit.title).bold(),
                    style(format!("[{}]", hit.id)).dim()
                );
                println!("  {}", style(&hit.url).dim());
                if let Some(excerpt) = &hit.excerpt {
                    println!("  {}", excerpt);
                }
            }
        }

        Commands::Page { page_id, html, json } => {
            let page = client.get_page_content(&page_id, !html).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
                return Ok(());
            }

            println!(
                "{} {}",
                style(&page.title).bold(),
                style(format!("(v{})", page.version)).dim()
            );
            println!("{}", style(&page.url).dim());
            println!();
            println!("{}", page.content);
        }

        Commands::Children {
            page_id,
            limit,
            start,
            json,
        } => {
            let page = client.get_child_pages(&page_id, limit, start).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
                return Ok(());
            }

            println!("{} child page(s)", page.size);
            for child in &page.results {
                println!(
                    "{:>4}. {}  {}",
                    child.position,
                    style(&child.title).bold(),
                    style(format!("[{}]", child.id)).dim()
                );
            }
        }

        // Verify and Config are handled before dispatch
        Commands::Verify | Commands::Config { .. } => {}
    }

    Ok(())
}
