use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use catalog_api::{config, db, migrator::Migrator};

/// Applies or rolls back the catalog schema
#[derive(Parser)]
#[command(name = "migration", version)]
struct Cli {
    /// Overrides the configured database URL
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending migrations (default)
    Up,
    /// Roll back migrations, newest first
    Down {
        /// Number of migrations to roll back; all when omitted
        #[arg(short, long)]
        steps: Option<u32>,
    },
    /// List applied and pending migrations
    Status,
    /// Drop every table and re-apply all migrations
    Fresh,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut cfg = config::load_config()?;
    if let Some(url) = cli.database_url {
        cfg.database_url = url;
    }
    config::init_tracing(cfg.log_level(), cfg.log_json);

    let conn = db::establish_connection_from_app_config(&cfg).await?;
    match cli.command.unwrap_or(Command::Up) {
        Command::Up => {
            db::run_migrations(&conn).await?;
        }
        Command::Down { steps } => {
            Migrator::down(&conn, steps).await?;
            info!(steps = ?steps, "Rolled back migrations");
        }
        Command::Status => {
            Migrator::status(&conn).await?;
        }
        Command::Fresh => {
            Migrator::fresh(&conn).await?;
            info!("Schema recreated");
        }
    }
    Ok(())
}
