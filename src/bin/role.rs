//! Role-management CLI.
//!
//! ```text
//! easybook-role list
//! easybook-role show <email>
//! easybook-role grant <email>
//! easybook-role revoke <email>
//! ```
//!
//! Exit codes: 0 on success, 1 for validation problems and unknown
//! users, 2 for unexpected failures.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

use easybook::persistence::{Store, users};

#[derive(Debug, Parser)]
#[command(name = "easybook-role", about = "Manage easybook user roles")]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every user with their role
    List,
    /// Show one user's role
    Show { email: String },
    /// Grant the admin role
    Grant { email: String },
    /// Revoke the admin role
    Revoke { email: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(15))
        .connect(&cli.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(err) => {
            eprintln!("Role command failed: {err}");
            return ExitCode::from(2);
        }
    };
    let store = Store::new(pool);

    match run(&store, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CommandError::NotFound(email)) => {
            eprintln!("User not found: {email}");
            ExitCode::FAILURE
        }
        Err(CommandError::Invalid(message)) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
        Err(CommandError::Store(err)) => {
            eprintln!("Role command failed: {err}");
            ExitCode::from(2)
        }
    }
}

enum CommandError {
    NotFound(String),
    Invalid(String),
    Store(sqlx::Error),
}

impl From<sqlx::Error> for CommandError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(err)
    }
}

async fn run(store: &Store, command: Command) -> Result<(), CommandError> {
    match command {
        Command::List => {
            let rows = users::list_user_roles(store.pool()).await?;
            if rows.is_empty() {
                println!("No users found.");
                return Ok(());
            }
            for (email, role) in rows {
                println!("{email} | role={}", display_role(&role));
            }
            Ok(())
        }
        Command::Show { email } => {
            let user = find_user(store, &email).await?;
            println!("{} | role={}", user.email, display_role(&user.role));
            Ok(())
        }
        Command::Grant { email } => set_role(store, &email, "admin").await,
        Command::Revoke { email } => set_role(store, &email, "user").await,
    }
}

async fn set_role(store: &Store, email: &str, target_role: &str) -> Result<(), CommandError> {
    let user = find_user(store, email).await?;
    let email = user.email;

    if display_role(&user.role) == target_role {
        println!("No changes: {email} already has role '{target_role}'.");
        return Ok(());
    }

    users::set_user_role(store.pool(), &email, target_role).await?;
    println!("Updated: {email} -> role='{target_role}'");
    Ok(())
}

async fn find_user(store: &Store, email: &str) -> Result<users::UserRow, CommandError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(CommandError::Invalid(
            "Email is required for this action.".to_string(),
        ));
    }

    users::find_user_by_email(store.pool(), &email)
        .await?
        .ok_or(CommandError::NotFound(email))
}

fn display_role(role: &str) -> &str {
    match role.trim() {
        "" => "user",
        role => role,
    }
}
