use clap::Parser;
use lab_backend::domain::models::auth::Role;
use lab_backend::domain::services::auth_service::create_account;
use lab_backend::error::AppError;
use lab_backend::infra::factory::connect_repositories;

/// Adds a staff or admin account to the lab database.
#[derive(Parser, Debug)]
#[command(name = "add_user")]
#[command(about = "Create a user account for the lab backend")]
struct Cli {
    /// Login name of the new account
    username: String,

    /// Plain-text password, stored as an argon2 hash
    password: String,

    /// `admin` or `employee`
    #[arg(short, long, default_value = "employee")]
    role: String,

    /// Database to write to (falls back to DATABASE_URL)
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = add_user(cli).await {
        eprintln!("add_user failed: {}", e);
        std::process::exit(1);
    }
}

async fn add_user(cli: Cli) -> Result<(), AppError> {
    let role: Role = cli.role.parse()?;
    let repos = connect_repositories(&cli.database_url).await?;

    match create_account(repos.user_repo.as_ref(), &cli.username, &cli.password, role).await? {
        Some(user) => println!("User '{}' added successfully as {}", user.username, user.role),
        None => println!("User '{}' already exists!", cli.username.trim()),
    }
    Ok(())
}
