mod cli;
mod credentials;
mod run;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use twin_core::config::load_dotenv;
use twin_core::TwinConfig;

use crate::cli::{CliArgs, Command};
use crate::credentials::CredentialStore;
use crate::terminal::Terminal;

fn main() -> Result<()> {
    load_dotenv();

    // Logs go to stderr so reports on stdout stay clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = TwinConfig::for_profile(args.profile.as_deref().unwrap_or(""));
    config.validate().context("invalid configuration")?;
    config.log_summary();

    let terminal = Terminal::new();

    match args.command {
        Command::Run(run_args) => {
            if let Err(e) = run::execute(&config, run_args, &terminal) {
                terminal.print_error(&format!("{e:#}"))?;
                return Err(e);
            }
        }
        Command::Register {
            user,
            role,
            password,
        } => {
            let mut store = CredentialStore::open(&config.auth.users_file)?;
            store.register(&user, &password, &role)?;
            info!(path = %store.path().display(), "Credential store updated");
            terminal.print_info("Account created! You can now log in.")?;
        }
        Command::Login { user, password } => {
            let store = CredentialStore::open(&config.auth.users_file)?;
            let session = store.verify(&user, &password)?;
            info!(user = %session.user, role = %session.role, "Login succeeded");
            terminal.print_info(&format!("Welcome, {} ({})", session.user, session.role))?;
        }
        Command::Users => {
            let store = CredentialStore::open(&config.auth.users_file)?;
            for (user, role) in store.users() {
                println!("{user}\t{role}");
            }
        }
    }

    Ok(())
}
