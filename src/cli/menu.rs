use anyhow::Result;
use dialoguer::{Input, Password};

use crate::application::LedgerService;
use crate::domain::{format_cents, parse_cents, Cents, Currency};

use super::parse_currency;

/// Entries of the interactive menu, numbered as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    CreateUser,
    CreateAccount,
    Deposit,
    Withdraw,
    Transfer,
    Exit,
}

impl MenuChoice {
    const ALL: [MenuChoice; 6] = [
        MenuChoice::CreateUser,
        MenuChoice::CreateAccount,
        MenuChoice::Deposit,
        MenuChoice::Withdraw,
        MenuChoice::Transfer,
        MenuChoice::Exit,
    ];

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::CreateUser),
            "2" => Some(MenuChoice::CreateAccount),
            "3" => Some(MenuChoice::Deposit),
            "4" => Some(MenuChoice::Withdraw),
            "5" => Some(MenuChoice::Transfer),
            "6" => Some(MenuChoice::Exit),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            MenuChoice::CreateUser => "Create user",
            MenuChoice::CreateAccount => "Create account",
            MenuChoice::Deposit => "Deposit",
            MenuChoice::Withdraw => "Withdraw",
            MenuChoice::Transfer => "Transfer",
            MenuChoice::Exit => "Exit",
        }
    }
}

/// Run the numbered menu until the user picks Exit.
///
/// A failed operation is reported and the menu continues; only terminal
/// I/O errors end the loop.
pub async fn run_menu(service: &LedgerService) -> Result<()> {
    loop {
        println!("\nChoose an action:");
        for (i, choice) in MenuChoice::ALL.iter().enumerate() {
            println!("{}. {}", i + 1, choice.label());
        }

        let input: String = Input::new().with_prompt(">").interact_text()?;
        let Some(choice) = MenuChoice::parse(&input) else {
            println!("Invalid choice. Try again.");
            continue;
        };

        if choice == MenuChoice::Exit {
            println!("Exiting application.");
            return Ok(());
        }

        if let Err(e) = run_choice(service, choice).await {
            println!("Error: {:#}", e);
        }
    }
}

async fn run_choice(service: &LedgerService, choice: MenuChoice) -> Result<()> {
    match choice {
        MenuChoice::CreateUser => {
            let user_id = prompt("Enter user ID")?;
            let name = prompt("Enter name")?;
            let password = Password::new().with_prompt("Enter password").interact()?;
            service.create_user(&user_id, &name, &password).await?;
            println!("User created successfully.");
        }
        MenuChoice::CreateAccount => {
            let user_id = prompt("Enter user ID")?;
            let account_number = prompt("Enter account number")?;
            let currency = parse_currency(&prompt("Enter currency (USD/EUR/KZT)")?)?;
            service
                .create_account(&user_id, &account_number, currency)
                .await?;
            println!("Account created successfully.");
        }
        MenuChoice::Deposit => {
            let account_number = prompt("Enter account number")?;
            let amount = prompt_amount("Enter deposit amount")?;
            let balance = service.deposit(&account_number, amount).await?;
            let currency = service.get_account(&account_number).await?.currency;
            println!(
                "Deposit successful. New balance: {}",
                with_currency(balance, currency)
            );
        }
        MenuChoice::Withdraw => {
            let account_number = prompt("Enter account number")?;
            let amount = prompt_amount("Enter withdrawal amount")?;
            let balance = service.withdraw(&account_number, amount).await?;
            let currency = service.get_account(&account_number).await?.currency;
            println!(
                "Withdrawal successful. New balance: {}",
                with_currency(balance, currency)
            );
        }
        MenuChoice::Transfer => {
            let from = prompt("Enter source account number")?;
            let to = prompt("Enter destination account number")?;
            let amount = prompt_amount("Enter transfer amount")?;
            let password = Password::new()
                .with_prompt("Enter password of the source account owner")
                .interact()?;
            let receipt = service.transfer(&from, &to, amount, &password).await?;
            println!("{}", receipt);
        }
        MenuChoice::Exit => {}
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    Ok(Input::<String>::new().with_prompt(label).interact_text()?)
}

fn prompt_amount(label: &str) -> Result<Cents> {
    let raw = prompt(label)?;
    Ok(parse_cents(&raw)?)
}

fn with_currency(cents: Cents, currency: Currency) -> String {
    format!("{} {}", format_cents(cents), currency)
}
