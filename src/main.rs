use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use fiabe::config::{Config, ImageProviderKind};
use fiabe::rest;
use fiabe::story::{self, FormState};
use fiabe::styles;

#[derive(Parser)]
#[command(name = "fiabe")]
#[command(about = "Illustrated story wizard: outline synthesis and scene illustration")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Port to listen on (defaults to rest_api.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Use local SVG placeholders instead of the remote image API
        #[arg(long)]
        placeholder: bool,
    },

    /// Synthesize a story and print it as JSON
    Story {
        /// JSON file holding the form (defaults to the default form)
        #[arg(short, long)]
        form: Option<PathBuf>,
    },

    /// List the illustration styles
    Styles,

    /// Print the effective configuration as TOML
    Config,

    /// Print the OpenAPI document
    Openapi {
        /// Emit YAML instead of JSON
        #[arg(long)]
        yaml: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    let logging_handle = fiabe::logging::init_logging(&config, cli.debug)?;

    match cli.command {
        Commands::Serve { port, placeholder } => {
            cmd_serve(config, port, placeholder).await?;
        }
        Commands::Story { form } => {
            cmd_story(form)?;
        }
        Commands::Styles => {
            cmd_styles();
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
        Commands::Openapi { yaml } => {
            cmd_openapi(yaml)?;
        }
    }

    if let Some(log_path) = logging_handle.log_file_path {
        tracing::debug!(path = %log_path.display(), "Session log written");
    }

    Ok(())
}

async fn cmd_serve(mut config: Config, port: Option<u16>, placeholder: bool) -> Result<()> {
    if placeholder {
        config.images.provider = ImageProviderKind::Placeholder;
    }
    let port = port.unwrap_or(config.rest_api.port);

    println!("Starting fiabe REST API server...");
    println!("  Port:   {}", port);
    println!("  Images: {}", config.images.provider.display_name());
    println!("  State:  {}", config.state_path().display());
    println!("  Endpoints:");
    println!("    POST  /generate-story                Synthesize a story");
    println!("    POST  /generate-images               Illustrate an outline");
    println!("    GET   /api/v1/health                 Health check");
    println!("    GET   /api/v1/styles                 List styles");
    println!("    GET   /api/v1/session                Current wizard session");
    println!("    PATCH /api/v1/session/form           Edit the form");
    println!("    POST  /api/v1/session/advance        Details -> Style");
    println!("    POST  /api/v1/session/back           Return to an earlier step");
    println!("    POST  /api/v1/session/storyboard     Generate the storyboard");
    println!("    POST  /api/v1/session/illustrations  Generate illustrations");
    println!("    POST  /api/v1/session/reset          Start over");
    println!();

    let state = rest::ApiState::from_config(config)?;
    rest::serve(state, port).await?;

    Ok(())
}

fn cmd_story(form_path: Option<PathBuf>) -> Result<()> {
    let form = match form_path {
        Some(path) => {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read form file {}", path.display()))?;
            serde_json::from_str::<FormState>(&contents)
                .with_context(|| format!("Failed to parse form file {}", path.display()))?
        }
        None => FormState::default(),
    };

    let story = story::synthesize(&form)?;
    println!("{}", serde_json::to_string_pretty(&story)?);
    Ok(())
}

fn cmd_styles() {
    println!("Styles ({})", styles::list_styles().len());
    println!("{}", "─".repeat(60));
    for style in styles::list_styles() {
        println!("{:<22} {}", style.id, style.name);
        println!("{:<22} {}", "", style.description);
        println!("{:<22} {}", "", style.palette.join(" "));
    }
}

fn cmd_openapi(yaml: bool) -> Result<()> {
    let doc = if yaml {
        rest::ApiDoc::yaml()?
    } else {
        rest::ApiDoc::json()?
    };
    println!("{doc}");
    Ok(())
}
