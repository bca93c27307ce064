mod samples;

use anyhow::Context;
use clap::{Parser, Subcommand};
use nexus_core::Settings;
use nexus_db::Store;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "nexus-admin", version, about = "Set up and maintain the Nexus database")]
struct Cli {
    /// Database to operate on (defaults to DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Recreate the schema contents and load sample data
    Setup {
        /// Stop after wiping; load nothing
        #[arg(long)]
        no_samples: bool,
        /// Password given to every sample login
        #[arg(long, default_value = "password")]
        password: String,
    },
    /// Print people, logins and relationships
    Check,
    /// Give every person a login with the same password
    Passwords {
        #[arg(default_value = "password")]
        password: String,
    },
    /// Delete people above an id, with their logins and relationships
    Clean {
        #[arg(default_value_t = 5)]
        threshold: i64,
    },
    /// Set a person's username and password
    Login {
        person_id: i64,
        username: String,
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let url = cli
        .database_url
        .unwrap_or_else(|| Settings::from_env().database_url);
    let store = Store::connect(&url)
        .await
        .with_context(|| format!("opening database {url}"))?;
    store.migrate().await.context("applying migrations")?;

    match cli.command {
        Command::Setup {
            no_samples,
            password,
        } => {
            store.wipe().await?;
            if no_samples {
                println!("Database reset without sample data.");
                return Ok(());
            }
            let report = samples::insert_samples(&store).await?;
            let logins = store.set_all_passwords(&password).await?;
            println!(
                "Loaded {} people, {} relationships ({} skipped), {} logins.",
                report.people, report.relationships, report.skipped, logins
            );
            print!("{}", store.summary().await?);
        }
        Command::Check => print!("{}", store.summary().await?),
        Command::Passwords { password } => {
            let count = store.set_all_passwords(&password).await?;
            println!("Updated passwords for {count} people.");
        }
        Command::Clean { threshold } => {
            let report = store.clean_test_data(threshold).await?;
            println!(
                "Removed {} people, {} logins and {} relationships above id {threshold}.",
                report.people, report.logins, report.relationships
            );
        }
        Command::Login {
            person_id,
            username,
            password,
        } => {
            store.ensure_login(person_id, &username, &password).await?;
            println!("Login for person {person_id} set to '{username}'.");
        }
    }
    Ok(())
}
