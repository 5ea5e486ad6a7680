//! SmilePet CLI - database management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the checkout_billing table
//! smilepet-cli billing setup
//!
//! # Insert a billing record
//! smilepet-cli billing insert --owner 42 --email ana@example.com --name "Ana Souza" \
//!     --document 123.456.789-09 --postal-code 01310-100 --city "São Paulo" --state SP
//!
//! # List recent records as JSON
//! smilepet-cli billing list --owner 42
//! ```
//!
//! # Commands
//!
//! - `billing setup` - Create the `checkout_billing` table
//! - `billing insert` - Insert one record from flags or `--file`
//! - `billing list` - Print recent records

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use smilepet_core::BillingDetails;

mod commands;

use commands::billing::{self, InsertInput};

#[derive(Parser)]
#[command(name = "smilepet-cli")]
#[command(author, version, about = "SmilePet CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage saved checkout billing details
    Billing {
        #[command(subcommand)]
        action: BillingAction,
    },
}

#[derive(Subcommand)]
enum BillingAction {
    /// Create the `checkout_billing` table if missing
    Setup,
    /// Insert one billing record
    Insert(InsertArgs),
    /// Print recent billing records as JSON
    List {
        /// Only records for this owner (user id or email)
        #[arg(short, long)]
        owner: Option<String>,

        /// Maximum number of records
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },
}

#[derive(Args)]
struct InsertArgs {
    /// Read the record from a JSON file instead of flags
    #[arg(short, long, conflicts_with_all = ["owner", "email", "name"])]
    file: Option<PathBuf>,

    /// Owner tag (user id or email)
    #[arg(short, long)]
    owner: Option<String>,

    /// Contact email
    #[arg(short, long)]
    email: Option<String>,

    /// Full name
    #[arg(short, long, default_value = "")]
    name: String,

    /// CPF or CNPJ
    #[arg(long, default_value = "")]
    document: String,

    #[arg(long, default_value = "")]
    phone: String,

    /// CEP
    #[arg(long, default_value = "")]
    postal_code: String,

    #[arg(long, default_value = "")]
    street: String,

    #[arg(long, default_value = "")]
    number: String,

    #[arg(long)]
    complement: Option<String>,

    /// Bairro
    #[arg(long, default_value = "")]
    district: String,

    #[arg(long, default_value = "")]
    city: String,

    /// UF
    #[arg(long, default_value = "")]
    state: String,
}

impl From<InsertArgs> for InsertInput {
    fn from(args: InsertArgs) -> Self {
        Self {
            file: args.file,
            owner: args.owner,
            email: args.email,
            billing: BillingDetails {
                name: args.name,
                document: args.document,
                phone: args.phone,
                postal_code: args.postal_code,
                street: args.street,
                number: args.number,
                complement: args.complement,
                district: args.district,
                city: args.city,
                state: args.state,
            },
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Billing { action } => match action {
            BillingAction::Setup => billing::setup().await?,
            BillingAction::Insert(args) => {
                let id = billing::insert(args.into()).await?;
                #[allow(clippy::print_stdout)]
                {
                    println!("{id}");
                }
            }
            BillingAction::List { owner, limit } => {
                let records = billing::list(owner.as_deref(), limit).await?;
                #[allow(clippy::print_stdout)]
                {
                    println!("{}", serde_json::to_string_pretty(&records)?);
                }
            }
        },
    }
    Ok(())
}
