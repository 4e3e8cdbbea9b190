// nl2bash Guard - Main Entry Point
//
// Command-line front end for the command risk classifier:
// - assess: classify commands locally
// - rules: print the active rule catalog
// - serve: run the HTTP request boundary

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nl2bash_guard::api::{self, AppState};
use nl2bash_guard::config::Config;
use nl2bash_guard::safety::{
    Assessment, CandidateResult, RiskClassifier, RuleCategory, Sanitizer,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

/// Exit code when an assessed batch is hard-blocked
const EXIT_BLOCKED: u8 = 2;

/// nl2bash Guard: risk classifier for generated shell commands
#[derive(Parser, Debug)]
#[command(name = "nl2bash-guard")]
#[command(version)]
#[command(
    about = "Classifies generated shell commands as safe, needing confirmation, or refused",
    long_about = None
)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to the config file (defaults to the XDG config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assess one or more commands as a single batch
    Assess {
        /// Commands to assess
        #[arg(required = true)]
        commands: Vec<String>,

        /// Dry-run alternatives to carry into the assessment
        #[arg(long = "dry-run")]
        dry_run: Vec<String>,

        /// Print the assessment as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the active rule catalog
    Rules {
        /// Only show one category (hard_block, high_risk, medium_risk, read_only_hint)
        #[arg(long)]
        category: Option<RuleCategory>,
    },
    /// Run the HTTP request boundary (/api/assess; /api/generate is library-only)
    Serve {
        /// Interface to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    init_logging(&config, args.verbose)?;
    debug!("nl2bash-guard v{} starting...", env!("CARGO_PKG_VERSION"));

    // The catalog is compiled once here and shared read-only afterwards
    let classifier = Arc::new(config.build_classifier()?);

    match args.command {
        Some(Commands::Assess {
            commands,
            dry_run,
            json,
        }) => {
            let sanitized = Sanitizer::new(Arc::clone(&classifier)).sanitize(CandidateResult {
                commands: commands.clone(),
                dry_run_commands: dry_run,
                ..Default::default()
            });
            let verdict = sanitized.verdict();
            print_assessment(&commands, &verdict, json)?;
            if verdict.blocked {
                return Ok(ExitCode::from(EXIT_BLOCKED));
            }
        }
        Some(Commands::Rules { category }) => {
            print_rules(&classifier, category);
        }
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let addr = config.server.socket_addr()?;
            let state = AppState::new(Sanitizer::new(classifier))
                .with_metrics(config.metrics.enabled);
            api::serve(addr, state).await?;
        }
        None => {
            info!("No command specified. Use \"nl2bash-guard --help\" for usage.");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Initialize tracing from config; `--verbose` forces debug
fn init_logging(config: &Config, verbose: bool) -> Result<()> {
    let level = if verbose {
        Level::DEBUG
    } else {
        config.log_level()?
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.logging.format.to_lowercase().as_str() {
        "json" => builder.json().init(),
        "pretty" => builder.pretty().init(),
        _ => builder.compact().init(),
    }

    Ok(())
}

fn print_assessment(commands: &[String], assessment: &Assessment, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(assessment)
            .context("Failed to serialize assessment")?;
        println!("{}", text);
        return Ok(());
    }

    for command in commands.iter().filter(|c| !c.trim().is_empty()) {
        println!("$ {}", command.trim());
    }
    println!();

    if assessment.blocked {
        println!("🚫 REFUSED [{}]", assessment.risk_level.badge());
    } else if assessment.needs_confirmation {
        println!("⚠️  CONFIRM [{}]", assessment.risk_level.badge());
    } else {
        println!("✅ SAFE [{}]", assessment.risk_level.badge());
    }

    if !assessment.reasons.is_empty() {
        println!("\nReasons:");
        for reason in &assessment.reasons {
            println!("  - {}", reason);
        }
    }

    // A refused batch never offers anything to run
    if !assessment.blocked && !assessment.suggested_dry_run_commands.is_empty() {
        println!("\nDry run:");
        for suggestion in &assessment.suggested_dry_run_commands {
            println!("  {}", suggestion);
        }
    }

    Ok(())
}

fn print_rules(classifier: &RiskClassifier, only: Option<RuleCategory>) {
    let catalog = classifier.catalog();
    for category in RuleCategory::ALL {
        if only.is_some_and(|c| c != category) {
            continue;
        }
        let rules = catalog.rules(category);
        println!("{} ({})", category, rules.len());
        for rule in rules {
            println!("  {:<18} {:<45} {}", rule.name(), rule.pattern(), rule.reason());
        }
        println!();
    }
}
