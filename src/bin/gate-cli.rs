use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use edge_gate::config::{load_config, GateConfig};
use edge_gate::policy::{Decision, PolicyEngine};
use edge_gate::routing::{GateScope, PathClassifier};

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Offline tooling for the edge gate", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a config file
    Check {
        path: PathBuf,
    },
    /// Show how a request path would be classified and decided
    Classify {
        path: String,
        /// Config file; built-in defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Decide as a signed-in user
        #[arg(short, long)]
        authenticated: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { path } => match load_config(&path) {
            Ok(config) => {
                println!("Config OK");
                println!("  listen:     {}", config.listener.bind_address);
                println!("  upstream:   {}", config.upstream.address);
                println!("  site:       {}", config.site.base_url());
                println!(
                    "  rate limit: {} requests / {}s",
                    config.rate_limit.points, config.rate_limit.duration_secs
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        Commands::Classify {
            path,
            config,
            authenticated,
        } => {
            let config = match config {
                Some(file) => match load_config(&file) {
                    Ok(config) => config,
                    Err(e) => {
                        eprintln!("Error: {e}");
                        return ExitCode::FAILURE;
                    }
                },
                None => GateConfig::default(),
            };
            println!("{}", classify(&config, &path, authenticated));
            ExitCode::SUCCESS
        }
    }
}

fn classify(config: &GateConfig, path: &str, authenticated: bool) -> String {
    let scope = GateScope::from_config(&config.paths);
    let class = PathClassifier::from_config(&config.paths).classify(path);
    let engine = PolicyEngine::from_config(&config.paths, config.rate_limit.duration_secs);

    let decision = if scope.applies_to(path) {
        match engine.decide(&class, authenticated) {
            Decision::Allow => json!({ "outcome": "allow" }),
            Decision::RedirectTo(target) => json!({ "outcome": "redirect", "location": target }),
            Decision::Reject { status, .. } => json!({ "outcome": "reject", "status": status.as_u16() }),
        }
    } else {
        json!({ "outcome": "bypass" })
    };

    let report = json!({
        "path": path,
        "gated": scope.applies_to(path),
        "authenticated": authenticated,
        "class": {
            "api": class.is_api,
            "public_api": class.is_public_api,
            "protected_api": class.is_protected_api(),
            "auth_page": class.is_auth_page,
            "root": class.is_root,
            "protected_page": class.is_protected_page,
        },
        "rate_limited_path": class.is_protected_api(),
        "decision": decision,
    });

    serde_json::to_string_pretty(&report).unwrap_or_else(|_| report.to_string())
}
