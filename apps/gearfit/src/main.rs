//! # gearfit - Gear Build Finder
//!
//! The main binary for the gearfit build engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                   apps/gearfit (THE BINARY)                │
//! │                                                            │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────────┐  │
//! │  │    CLI      │   │   Config    │   │  Item sources   │  │
//! │  │   (clap)    │   │   (toml)    │   │ (reqwest, file) │  │
//! │  └──────┬──────┘   └──────┬──────┘   └────────┬────────┘  │
//! │         └─────────────────┼───────────────────┘           │
//! │                           ▼                               │
//! │                   ┌───────────────┐                       │
//! │                   │ gearfit-core  │                       │
//! │                   │  (THE LOGIC)  │                       │
//! │                   └───────────────┘                       │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! gearfit --source-url https://example.invalid/items.json catalog --force
//! gearfit check --level 90 --item helmet=Cap --item ring1=Band
//! gearfit recommend --slot boots --item helmet=Cap
//! gearfit solve --level 101 --class mage --no-mythic
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // GEARFIT_LOG_FORMAT=json enables machine-parseable logs.
    let log_format = std::env::var("GEARFIT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gearfit=info,gearfit_core=info".into());

    // Logs go to stderr so JSON command output on stdout stays parseable.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = gearfit::cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = gearfit::cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  gearfit v{}
  skill-point aware gear builds
"#,
        env!("CARGO_PKG_VERSION")
    );
}
