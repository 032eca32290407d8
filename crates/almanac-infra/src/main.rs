mod commands;

use almanac_infra_synth::TemplateFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "almanac-infra")]
#[command(about = "Declare and synthesize the AntAlmanac cloud stacks", long_about = None)]
struct Cli {
    /// Project root searched for `.env`
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble every stack and write templates plus a manifest
    Synth {
        /// Output directory (default: <root>/cdk.out)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Template format (json, yaml)
        #[arg(short, long, default_value = "json")]
        format: TemplateFormat,
        /// Print templates instead of writing them
        #[arg(long)]
        stdout: bool,
        /// Build the preview environment for this pull request
        #[arg(long = "pr", value_name = "ID")]
        pull_request: Option<String>,
    },
    /// List stacks and the environments they deploy to
    List {
        /// Build the preview environment for this pull request
        #[arg(long = "pr", value_name = "ID")]
        pull_request: Option<String>,
    },
    /// Assemble every stack and report configuration gaps
    Validate {
        /// Build the preview environment for this pull request
        #[arg(long = "pr", value_name = "ID")]
        pull_request: Option<String>,
    },
    /// Show version information
    Version,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        // no configuration needed
        Commands::Version => {
            println!("almanac-infra {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Synth {
            out,
            format,
            stdout,
            pull_request,
        } => {
            let config = commands::load_config(&cli.root, pull_request)?;
            if stdout {
                commands::synth::print(&config, format)?;
            } else {
                let out = out.unwrap_or_else(|| cli.root.join(almanac_infra_synth::DEFAULT_OUT_DIR));
                commands::synth::handle(&config, &out, format).await?;
            }
        }
        Commands::List { pull_request } => {
            let config = commands::load_config(&cli.root, pull_request)?;
            commands::list::handle(&config)?;
        }
        Commands::Validate { pull_request } => {
            let config = commands::load_config(&cli.root, pull_request)?;
            commands::validate::handle(&config)?;
        }
    }

    Ok(())
}
