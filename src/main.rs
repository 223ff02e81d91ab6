//! Transport configuration inspector.
//!
//! Resolves the server transport configuration exactly as a coordinator
//! process would at startup and prints it.
//!
//! ```text
//! tc-transport-config [--config PATH] [--set KEY=VALUE]... [--log-level LEVEL] <COMMAND>
//!
//!   show [--format json|toml]   resolved snapshot on stdout
//!   explain                     which source supplies each key
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use tc_transport_config::config::keys;
use tc_transport_config::config::Overrides;
use tc_transport_config::observability::init_logging;
use tc_transport_config::TransportContext;

#[derive(Parser)]
#[command(name = "tc-transport-config")]
#[command(about = "Resolve and inspect the coordinator's server transport configuration", long_about = None)]
struct Cli {
    /// Config-center TOML document
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override a key, e.g. --set transport.soBackLogSize=2048
    #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, String)>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved snapshot
    Show {
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Print the winning source of every key
    Explain,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Toml,
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    Ok((key.trim().to_string(), value.to_string()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let mut overrides = Overrides::new();
    for (key, value) in &cli.set {
        overrides.set_raw(key, value)?;
    }

    let ctx = TransportContext::from_system(cli.config.as_deref(), overrides)?;

    match cli.command {
        Commands::Show { format } => {
            let server = ctx.server_config().build()?;
            let snapshot = ctx.snapshot(&server);
            let rendered = match format {
                Format::Json => serde_json::to_string_pretty(&snapshot)?,
                Format::Toml => toml::to_string_pretty(&snapshot)?,
            };
            println!("{rendered}");
        }
        Commands::Explain => {
            let scope = ctx.resolver().scope(ctx.overrides());
            for info in keys::catalog() {
                println!(
                    "{:<52} {:<8} {:<7} {}",
                    info.name,
                    format!("{:?}", info.scope).to_lowercase(),
                    info.kind.to_string(),
                    scope.origin_of(&info)
                );
            }
        }
    }

    Ok(())
}
