//! tutordesk - study tools for an online tutoring practice

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use tutordesk::cart::Customer;
use tutordesk::commands::AppState;
use tutordesk::contact::ContactForm;
use tutordesk::llm::Config;

#[derive(Parser)]
#[command(name = "tutordesk")]
#[command(about = "AI problem breakdowns, revision timetables and a resource cart", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print records as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log more (repeat for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile saved model output without calling the API
    Reconcile {
        /// File with the raw model text (stdin when omitted)
        file: Option<PathBuf>,

        /// The original problem statement
        #[arg(long)]
        problem: String,
    },

    /// Break a problem down step by step
    Breakdown { problem: String },

    /// Get a study tip for a topic
    Tip { topic: String },

    /// Get a motivational quote
    Quote,

    /// Generate a revision timetable from a JSON request file
    Timetable { request: PathBuf },

    /// Manage the resource cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },

    /// Send a message through the contact form
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        message: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add one unit of a product
    Add { product_id: String },
    /// Set a quantity (0 removes)
    Update { product_id: String, quantity: u32 },
    Remove { product_id: String },
    Clear,
    Show,
    /// Place the order
    Checkout {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tutordesk::init_tracing(match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    });

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let state = AppState::from_config(&config, cli.json);

    let output = match cli.command {
        Commands::Reconcile { file, problem } => {
            let raw = match file {
                Some(path) => std::fs::read(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut raw = Vec::new();
                    std::io::stdin()
                        .read_to_end(&mut raw)
                        .context("Failed to read stdin")?;
                    raw
                }
            };
            state.reconcile_bytes(&raw, &problem)?
        }
        Commands::Breakdown { problem } => state.breakdown(&problem).await?,
        Commands::Tip { topic } => state.study_tip(&topic).await,
        Commands::Quote => state.quote().await,
        Commands::Timetable { request } => state.timetable(&request).await?,
        Commands::Cart { action } => match action {
            CartAction::Add { product_id } => state.cart_add(&product_id)?,
            CartAction::Update {
                product_id,
                quantity,
            } => state.cart_update(&product_id, quantity)?,
            CartAction::Remove { product_id } => state.cart_remove(&product_id)?,
            CartAction::Clear => state.cart_clear()?,
            CartAction::Show => state.cart_show()?,
            CartAction::Checkout { name, email } => state.checkout(Customer {
                full_name: name,
                email,
            })?,
        },
        Commands::Contact {
            name,
            email,
            subject,
            message,
        } => {
            state
                .contact(&ContactForm {
                    name,
                    email,
                    subject,
                    message,
                })
                .await?
        }
    };

    println!("{}", output.trim_end());
    Ok(())
}
