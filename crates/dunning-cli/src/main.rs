mod display;
mod ingest;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dunning_core::{IngestConfig, MailSettings, ResumeStrategy};
use dunning_store::DuckStore;
use tracing_subscriber::EnvFilter;

use ingest::{Backends, Outcome};

#[derive(Parser)]
#[command(name = "dunning", version, about = "Bill debts from CSV batches, skipping ones already billed")]
struct Cli {
    /// DuckDB database file (`:memory:` for a throwaway ledger).
    #[arg(long, env = "DATABASE_URL", default_value = "dunning.duckdb", global = true)]
    database: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bill every new debt in a CSV batch.
    Ingest {
        /// Batch file; must end in `.csv`.
        file: PathBuf,

        #[command(flatten)]
        backends: BackendArgs,
    },
    /// List bills already issued.
    History,
}

#[derive(Args)]
struct BackendArgs {
    /// Base URL of the bill-rendering service. Bills get a fixed URL when unset.
    #[arg(long, env = "DUNNING_BILL_ENDPOINT")]
    bill_endpoint: Option<String>,

    /// Base URL of the mail relay. Delivery is skipped when unset.
    #[arg(long, env = "DUNNING_MAIL_ENDPOINT")]
    mail_endpoint: Option<String>,

    #[arg(long, env = "DUNNING_MAIL_SENDER")]
    mail_sender: Option<String>,

    #[arg(long, env = "DUNNING_MAIL_SUBJECT")]
    mail_subject: Option<String>,

    #[arg(long, env = "DUNNING_MAIL_PORT")]
    mail_port: Option<u16>,

    /// How billed history is skipped: `last-returned` or `membership`.
    #[arg(long, default_value_t = ResumeStrategy::default())]
    resume: ResumeStrategy,
}

impl BackendArgs {
    fn mail_settings(&self) -> MailSettings {
        let defaults = MailSettings::default();
        MailSettings {
            subject: self.mail_subject.clone().unwrap_or(defaults.subject),
            port: self.mail_port.unwrap_or(defaults.port),
            sender: self.mail_sender.clone().unwrap_or(defaults.sender),
        }
    }
}

fn open_store(database: &str) -> anyhow::Result<DuckStore> {
    if database == ":memory:" {
        return Ok(DuckStore::open()?);
    }
    DuckStore::open_persistent(Path::new(database))
        .with_context(|| format!("opening bill ledger at {database}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("dunning v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    match cli.command {
        Command::Ingest { file, backends } => {
            let mail = backends.mail_settings();
            let config = IngestConfig::default()
                .with_mail(mail.clone())
                .with_resume(backends.resume);
            let clients = Backends::from_endpoints(backends.bill_endpoint, backends.mail_endpoint, mail);

            // The ledger connection lives for this one run.
            let mut store = open_store(&cli.database)?;
            let outcome = ingest::submit_path(&mut store, &config, &clients, &file).await?;
            drop(store);

            match outcome {
                Outcome::Billed(report) => {
                    display::print_report(&report);
                    Ok(ExitCode::SUCCESS)
                }
                Outcome::Rejected(response) => {
                    display::print_rejection(&response)?;
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::History => {
            let store = open_store(&cli.database)?;
            print!("{}", display::format_history(&store.list_bills()?));
            Ok(ExitCode::SUCCESS)
        }
    }
}
