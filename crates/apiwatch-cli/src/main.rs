//! apiwatch: watch an API documentation page for endpoint changes.

use std::path::PathBuf;
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use apiwatch::{extract_endpoints, read_snapshot, to_snapshot_text, write_snapshot};
use apiwatch_cli::config::{RunArgs, SourceArgs, DEFAULT_INTERVAL_SECS};
use apiwatch_cli::{report, HttpClient, Runner};

#[derive(Parser)]
#[command(
    name = "apiwatch",
    about = "Scrape an API documentation page and report endpoint changes",
    version,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch once, compare with the stored endpoints and archive changes (default).
    Check(RunArgs),

    /// Run `check` forever on a fixed interval.
    Watch {
        #[command(flatten)]
        run: RunArgs,

        /// Seconds to sleep between runs.
        #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS)]
        interval: u64,
    },

    /// Print the endpoints extracted from the page.
    Extract {
        #[command(flatten)]
        source: SourceArgs,

        /// Write the snapshot to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print endpoints whose normalized path is missing from a reference set.
    Report {
        #[command(flatten)]
        source: SourceArgs,

        /// Read endpoints from a stored snapshot instead of the page.
        #[arg(long, conflicts_with_all = ["url", "html"])]
        snapshot: Option<PathBuf>,

        /// JSON file with the reference path set.
        #[arg(short, long)]
        reference: PathBuf,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   apiwatch completions bash > ~/.local/share/bash-completion/completions/apiwatch
    ///   apiwatch completions zsh > ~/.zfunc/_apiwatch
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    match cli.command.unwrap_or(Commands::Check(cli.run)) {
        Commands::Check(args) => {
            let config = args.resolve()?;
            let http = HttpClient::new(config.timeout)?;
            let runner = Runner::new(config, http);
            if runner.run_once().await.is_failure() {
                std::process::exit(1);
            }
        }

        Commands::Watch { run, interval } => {
            let config = run.resolve()?;
            let http = HttpClient::new(config.timeout)?;
            Runner::new(config, http)
                .watch(Duration::from_secs(interval))
                .await;
        }

        Commands::Extract { source, output } => {
            let http = HttpClient::new(source.timeout())?;
            let markup = http.load_markup(&source.resolve()).await?;
            let registry = extract_endpoints(&markup)?;
            match output {
                Some(path) => {
                    write_snapshot(&registry, &path)?;
                    tracing::info!("Wrote {} endpoints to {}", registry.len(), path.display());
                }
                None => print!("{}", to_snapshot_text(&registry)?),
            }
        }

        Commands::Report {
            source,
            snapshot,
            reference,
        } => {
            let registry = match snapshot {
                Some(path) => read_snapshot(&path)?,
                None => {
                    let http = HttpClient::new(source.timeout())?;
                    extract_endpoints(&http.load_markup(&source.resolve()).await?)?
                }
            };
            report::print_report(&registry, &reference)?;
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "apiwatch", &mut std::io::stdout());
        }
    }

    Ok(())
}
