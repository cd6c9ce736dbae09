use crate::account::{PasswordHasherConfig, UserDirectory};
use crate::config::AppConfig;
use crate::error::ServiceError;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create an account without going through the HTTP API
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// List registered usernames
    List,
}

pub async fn handle_account_command(cmd: AccountCommands, config: &AppConfig) -> Result<(), ServiceError> {
    let directory = UserDirectory::open(
        config.users_path(),
        PasswordHasherConfig::new(config.auth.hash_cost),
    )
    .await?;

    match cmd {
        AccountCommands::Register { username, password } => {
            let account = directory.register(&username, &password).await?;
            println!("Account '{}' created (id {}).", account.username, account.id);
        }
        AccountCommands::List => {
            let accounts = directory.all().await?;
            if accounts.is_empty() {
                println!("No accounts registered.");
            }
            for account in accounts {
                println!("{}\t{}", account.id, account.username);
            }
        }
    }
    Ok(())
}
