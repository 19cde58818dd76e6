use std::process::ExitCode;

use audit_portal::{
    auth::hash_password,
    config::AppConfig,
    models::NewAdmin,
    repository::{DUPLICATE_ADMIN_EMAIL, PostgresRepository, Repository, RepositoryError},
};
use clap::Parser;

/// Provision an administrator account in the document store.
#[derive(Parser, Debug)]
#[command(name = "create-admin", version, about)]
struct Args {
    /// Login email; stored trimmed and lowercased.
    #[arg(long)]
    email: String,

    /// Display name.
    #[arg(long)]
    name: String,

    /// Unique institutional admin code.
    #[arg(long)]
    admin_code: String,

    /// Plaintext password. Only its argon2 hash is stored.
    #[arg(long)]
    password: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "audit_portal=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::load();

    let Some(db_url) = config.db_url.as_deref() else {
        tracing::error!("DATABASE_URL must be set to provision admins");
        return ExitCode::FAILURE;
    };

    if args.password.len() < 8 {
        tracing::error!("password must be at least 8 characters");
        return ExitCode::FAILURE;
    }

    let repo = match PostgresRepository::connect(db_url, &config).await {
        Ok(repo) => repo,
        Err(e) => {
            tracing::error!("failed to open the document store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Skip the argon2 work when the email is already registered.
    match repo.find_admin_by_email(&args.email).await {
        Ok(Some(existing)) => {
            tracing::error!(admin_id = %existing.id, "{}", DUPLICATE_ADMIN_EMAIL);
            repo.close().await;
            return ExitCode::FAILURE;
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!("failed to look up admin: {}", e);
            repo.close().await;
            return ExitCode::FAILURE;
        }
    }

    let password_hash = match hash_password(&args.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("failed to hash password: {}", e);
            repo.close().await;
            return ExitCode::FAILURE;
        }
    };

    let result = repo
        .create_admin(NewAdmin {
            email: args.email,
            password_hash,
            name: args.name,
            admin_code: args.admin_code,
        })
        .await;
    repo.close().await;

    match result {
        Ok(admin) => {
            tracing::info!(admin_id = %admin.id, email = %admin.email, "admin created");
            ExitCode::SUCCESS
        }
        Err(RepositoryError::Conflict(message)) => {
            tracing::error!("{}", message);
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("failed to create admin: {}", e);
            ExitCode::FAILURE
        }
    }
}
