//! textmod CLI binary.
//!
//! Text moderation service.
//!
//! # Commands
//!
//! - `serve` - Start the HTTP moderation server
//! - `moderate` - Moderate a single text or request document
//! - `categories` - List the category taxonomy

use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use textmod::{
    classifier,
    config::Config,
    moderation::{ErrorResponse, Moderator},
    server::{create_router, AppState, ServerConfig},
    taxonomy::{self, CATEGORY_THEMES, DEFAULT_CATEGORIES},
    VERSION,
};

#[derive(Parser)]
#[command(name = "textmod")]
#[command(version = VERSION)]
#[command(about = "textmod - Taxonomy-driven text moderation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP moderation server
    Serve {
        /// Listen host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Bind to all interfaces
        #[arg(long)]
        bind_all: bool,

        /// Config file (default: <config dir>/textmod/config.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Native model file or directory (selects the native backend)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Flag threshold (0.0 - 1.0)
        #[arg(long)]
        threshold: Option<f64>,

        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,

        /// Emit logs as JSON lines
        #[arg(long)]
        log_json: bool,
    },

    /// Moderate a single text
    Moderate {
        /// Text to moderate (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Treat input as a full JSON moderation request
        #[arg(short, long)]
        request: bool,

        /// Config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pretty-print the response
        #[arg(long)]
        pretty: bool,

        /// Verbose logging (stderr)
        #[arg(short, long)]
        verbose: bool,
    },

    /// List moderation categories
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            bind_all,
            config,
            model,
            threshold,
            verbose,
            log_json,
        } => cmd_serve(ServeArgs {
            host,
            port,
            bind_all,
            config,
            model,
            threshold,
            verbose,
            log_json,
        }),

        Commands::Moderate {
            input,
            file,
            request,
            config,
            pretty,
            verbose,
        } => cmd_moderate(input, file, request, config, pretty, verbose),

        Commands::Categories { json } => cmd_categories(json),
    }
}

struct ServeArgs {
    host: Option<String>,
    port: Option<u16>,
    bind_all: bool,
    config: Option<PathBuf>,
    model: Option<PathBuf>,
    threshold: Option<f64>,
    verbose: bool,
    log_json: bool,
}

fn init_logging(verbose: bool, json: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    init_logging(args.verbose, args.log_json);

    // Build config: file, then env, then flags
    let mut settings = Config::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        settings.server.host = host;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    if let Some(threshold) = args.threshold {
        settings.moderation.threshold = threshold;
    }
    if let Some(path) = args.model {
        settings.classifier.backend = textmod::config::ClassifierBackend::Native;
        settings.classifier.model_path = Some(path);
    }
    settings.validate()?;

    let mut config = ServerConfig::from_config(settings)?;
    if args.bind_all {
        config = config.bind_all();
    }

    // Classifier loads once here; failure aborts startup
    let state = Arc::new(AppState::try_new(config.clone()).context("Failed to load classifier")?);
    let app = create_router(Arc::clone(&state));

    tracing::info!("Starting textmod server on {}", config.addr);
    tracing::info!(
        "Classifier: {}, threshold {}, display threshold {}",
        state.classifier_name(),
        config.settings.moderation.threshold,
        config.settings.moderation.display_threshold
    );
    match config.settings.moderation.classify_timeout() {
        Some(timeout) => tracing::info!("Classification deadline: {}ms", timeout.as_millis()),
        None => tracing::warn!("Classification deadline disabled"),
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(config.addr).await?;
        axum::serve(listener, app).await?;
        Ok::<_, anyhow::Error>(())
    })
}

fn cmd_moderate(
    input: Option<String>,
    file: Option<PathBuf>,
    request: bool,
    config: Option<PathBuf>,
    pretty: bool,
    verbose: bool,
) -> anyhow::Result<()> {
    if verbose {
        init_logging(true, false);
    }

    let content = read_input(input, file)?;
    let body: Value = if request {
        serde_json::from_str(&content).context("Request is not valid JSON")?
    } else {
        json!({ "content": { "text": content.trim_end_matches('\n') } })
    };

    let settings = Config::load(config.as_deref())?;
    let shared = classifier::init_shared(&settings.classifier)?;
    let moderator = Moderator::from_config(&settings, shared);

    match moderator.process(&body) {
        Ok(response) => {
            println!("{}", to_json(&response, pretty)?);
            Ok(())
        },
        Err(e) => {
            if !e.is_validation() {
                tracing::error!(code = e.code(), error = %e, "Moderation failed");
            }
            println!("{}", to_json(&ErrorResponse::from(&e), pretty)?);
            std::process::exit(1);
        },
    }
}

fn cmd_categories(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        let themes: Vec<Value> = CATEGORY_THEMES
            .iter()
            .map(|(theme, codes)| json!({ "theme": theme, "codes": codes }))
            .collect();
        let output = json!({ "themes": themes, "defaults": DEFAULT_CATEGORIES });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for (theme, codes) in CATEGORY_THEMES {
        println!("{theme}:");
        for code in *codes {
            let marker = if DEFAULT_CATEGORIES.contains(code) {
                " (default)"
            } else {
                ""
            };
            println!("  {code}{marker}");
        }
        println!();
    }

    println!("Defaults (used when a request selects nothing valid):");
    for code in DEFAULT_CATEGORIES {
        match taxonomy::theme_of(code) {
            Some(theme) => println!("  {code} ({theme})"),
            None => println!("  {code}"),
        }
    }

    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

fn read_input(input: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(path) = file {
        Ok(std::fs::read_to_string(path)?)
    } else if let Some(s) = input {
        if s == "-" {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        } else {
            Ok(s)
        }
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}
