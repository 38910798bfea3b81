//! Binary entry point: parse arguments, open a backend, dispatch.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use flagbit_core::FeatureBitRepository;
use flagbit_infra::{DbManager, JsonTableStore, SqliteFeatureBitRepository, TableFeatureBitRepository};
use tracing_subscriber::EnvFilter;

use flagbit_cli::commands::{AddCommand, GenerateCommand, ListCommand, RemoveCommand};
use flagbit_cli::{Cli, Command, CommandContext, ConnectionArgs};

const DB_POOL_SIZE: u32 = 4;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(message) => {
            println!("{message}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<String> {
    let repo = build_repository(&cli.connection).await?;
    let context = CommandContext::from_env();

    match &cli.command {
        Command::Add(args) => AddCommand::new(args, repo.as_ref(), &context).run().await,
        Command::Remove(args) => RemoveCommand::new(args, repo.as_ref(), &context).run().await,
        Command::List(args) => ListCommand::new(args, repo.as_ref()).run().await,
        Command::Generate(args) => GenerateCommand::new(args, repo.as_ref()).run().await,
    }
}

async fn build_repository(
    connection: &ConnectionArgs,
) -> anyhow::Result<Box<dyn FeatureBitRepository>> {
    if let Some(path) = &connection.database {
        tracing::debug!(path = %path.display(), "opening sqlite backend");
        let db = DbManager::new(path, DB_POOL_SIZE)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        db.run_migrations()?;
        return Ok(Box::new(SqliteFeatureBitRepository::new(Arc::new(db))));
    }
    if let Some(path) = &connection.table_store {
        tracing::debug!(path = %path.display(), "opening table-store backend");
        let store = JsonTableStore::new(path);
        return Ok(Box::new(TableFeatureBitRepository::new(Arc::new(store))));
    }
    // clap's arg group guarantees one of the two is present.
    anyhow::bail!("no storage backend selected");
}
