mod logging;
mod menu;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::Password;

use crate::application::LedgerService;
use crate::config::LedgerConfig;
use crate::domain::{format_cents, parse_cents, Cents, Currency};

pub use logging::init_logging;

/// Kassa - bank ledger
#[derive(Parser)]
#[command(name = "kassa")]
#[command(about = "Users, accounts, deposits, withdrawals and atomic transfers")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "KASSA_DATABASE", default_value = LedgerConfig::DEFAULT_DATABASE)]
    pub database: PathBuf,

    /// Maximum time to wait for a busy account, in milliseconds
    #[arg(long, env = "KASSA_LOCK_TIMEOUT_MS", default_value_t = 5000)]
    pub lock_timeout_ms: u64,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// User management commands
    #[command(subcommand)]
    User(UserCommands),

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Add money to an account
    Deposit {
        /// Account number
        account: String,

        /// Amount (e.g., "50.00" or "50")
        amount: String,
    },

    /// Take money out of an account
    Withdraw {
        /// Account number
        account: String,

        /// Amount (e.g., "50.00" or "50")
        amount: String,
    },

    /// Move money between two accounts
    Transfer {
        /// Amount to transfer (e.g., "50.00" or "50")
        amount: String,

        /// Source account number
        #[arg(long)]
        from: String,

        /// Destination account number
        #[arg(long)]
        to: String,

        /// Password of the source account owner (prompted if omitted)
        #[arg(long, env = "KASSA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Show the balance of an account
    Balance {
        /// Account number
        account: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive numbered menu
    Menu,
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a new user
    Create {
        /// User id (must be unique)
        user_id: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Password (prompted if omitted)
        #[arg(long, env = "KASSA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Show a user and their accounts
    Show {
        /// User id
        user_id: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account for a user
    Open {
        /// Account number (must be unique)
        account_number: String,

        /// Owner user id
        #[arg(short, long)]
        user: String,

        /// Currency code: USD, EUR, KZT
        #[arg(short, long, default_value = "USD")]
        currency: String,
    },

    /// Show an account with its owner and balance
    Show {
        /// Account number
        account_number: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the accounts of a user
    List {
        /// Owner user id
        #[arg(short, long)]
        user: String,
    },
}

impl Cli {
    pub fn config(&self) -> LedgerConfig {
        LedgerConfig::new(&self.database)
            .with_lock_timeout(Duration::from_millis(self.lock_timeout_ms))
    }

    pub async fn run(self) -> Result<()> {
        let config = self.config();
        let service = LedgerService::open(&config)
            .await
            .with_context(|| format!("Cannot open ledger at {}", config.database_path.display()))?;

        let result = run_command(&service, self.command, &config).await;
        service.close().await;
        result
    }
}

async fn run_command(service: &LedgerService, command: Commands, config: &LedgerConfig) -> Result<()> {
    match command {
        Commands::Init => {
            println!("Database initialized: {}", config.database_path.display());
        }

        Commands::User(user_cmd) => run_user_command(service, user_cmd).await?,

        Commands::Account(account_cmd) => run_account_command(service, account_cmd).await?,

        Commands::Deposit { account, amount } => {
            let amount_cents = parse_amount(&amount)?;
            let balance = service.deposit(&account, amount_cents).await?;
            println!("Deposit successful. New balance: {}", format_cents(balance));
        }

        Commands::Withdraw { account, amount } => {
            let amount_cents = parse_amount(&amount)?;
            let balance = service.withdraw(&account, amount_cents).await?;
            println!("Withdrawal successful. New balance: {}", format_cents(balance));
        }

        Commands::Transfer {
            amount,
            from,
            to,
            password,
        } => {
            let amount_cents = parse_amount(&amount)?;
            let password = match password {
                Some(p) => p,
                None => Password::new()
                    .with_prompt(format!("Password for the owner of {}", from))
                    .interact()?,
            };

            let receipt = service
                .transfer(&from, &to, amount_cents, &password)
                .await?;

            println!("{}", receipt);
            println!(
                "  {}: {}   {}: {}",
                receipt.from_account,
                format_cents(receipt.from_balance),
                receipt.to_account,
                format_cents(receipt.to_balance)
            );
        }

        Commands::Balance { account, json } => {
            let account = service.get_account(&account).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&account)?);
            } else {
                println!(
                    "{}: {} {}",
                    account.account_number,
                    format_cents(account.balance),
                    account.currency
                );
            }
        }

        Commands::Menu => menu::run_menu(service).await?,
    }

    Ok(())
}

async fn run_user_command(service: &LedgerService, cmd: UserCommands) -> Result<()> {
    match cmd {
        UserCommands::Create {
            user_id,
            name,
            password,
        } => {
            let password = match password {
                Some(p) => p,
                None => Password::new()
                    .with_prompt("Password")
                    .with_confirmation("Repeat password", "Passwords do not match")
                    .interact()?,
            };
            let user = service.create_user(&user_id, &name, &password).await?;
            println!("User created: {} ({})", user.user_id, user.name);
        }

        UserCommands::Show { user_id, json } => {
            let user = service.get_user(&user_id).await?;
            let accounts = service.list_accounts(&user_id).await?;
            if json {
                let value = serde_json::json!({ "user": user, "accounts": accounts });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{} ({})", user.user_id, user.name);
                print_accounts(&accounts);
            }
        }
    }
    Ok(())
}

async fn run_account_command(service: &LedgerService, cmd: AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Open {
            account_number,
            user,
            currency,
        } => {
            let currency = parse_currency(&currency)?;
            let account = service.create_account(&user, &account_number, currency).await?;
            println!(
                "Account created: {} ({}) for {}",
                account.account_number, account.currency, account.owner_id
            );
        }

        AccountCommands::Show {
            account_number,
            json,
        } => {
            let account = service.get_account(&account_number).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&account)?);
            } else {
                println!("Account:  {}", account.account_number);
                println!("Owner:    {}", account.owner_id);
                println!("Currency: {}", account.currency);
                println!("Balance:  {}", format_cents(account.balance));
                println!("Opened:   {}", account.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }

        AccountCommands::List { user } => {
            let accounts = service.list_accounts(&user).await?;
            print_accounts(&accounts);
        }
    }
    Ok(())
}

fn print_accounts(accounts: &[crate::domain::Account]) {
    if accounts.is_empty() {
        println!("  (no accounts)");
        return;
    }
    for account in accounts {
        println!(
            "  {:<20} {:>16} {}",
            account.account_number,
            format_cents(account.balance),
            account.currency
        );
    }
}

fn parse_amount(input: &str) -> Result<Cents> {
    parse_cents(input).with_context(|| format!("Invalid amount '{}'. Use '50.00' or '50'", input))
}

fn parse_currency(input: &str) -> Result<Currency> {
    Currency::from_code(input).ok_or_else(|| {
        anyhow!(
            "Unknown currency '{}'. Use one of: {}",
            input,
            Currency::ALL.map(|c| c.as_str()).join(", ")
        )
    })
}
