//! Outlay CLI - Expense tracking in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::expense::{AddArgs, EditArgs};
use commands::transfer::ExportFormat;
use commands::{categories, expense, list, summary, transfer, user};
use outlay_core::config::Config;
use outlay_core::services::init_logging;
use outlay_core::ExpenseId;

/// Outlay - expense tracking in your terminal
#[derive(Parser)]
#[command(name = "outlay", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and log in
    Register {
        /// Email address
        #[arg(long)]
        email: Option<String>,
        /// Username
        #[arg(long)]
        username: Option<String>,
        /// Password (or set OUTLAY_PASSWORD)
        #[arg(short, long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Log in by email or username
    Login {
        /// Email or username
        identifier: Option<String>,
        /// Password (or set OUTLAY_PASSWORD)
        #[arg(short, long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Log out
    Logout,

    /// Show the logged-in user
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change email or username
    Profile {
        /// New email address
        #[arg(long)]
        email: Option<String>,
        /// New username
        #[arg(long)]
        username: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record an expense
    Add {
        /// What the money was spent on
        description: Option<String>,
        /// Amount, e.g. 12.50
        amount: Option<String>,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Category
        #[arg(short, long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change fields of an expense
    Edit {
        /// Expense ID
        id: ExpenseId,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New amount
        #[arg(long)]
        amount: Option<String>,
        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// New category
        #[arg(short, long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove an expense
    Remove {
        /// Expense ID
        id: ExpenseId,
        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Show a single expense
    Show {
        /// Expense ID
        id: ExpenseId,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List expenses, newest first
    List {
        /// Case-insensitive description search
        #[arg(short, long)]
        search: Option<String>,
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,
        /// Show at most this many
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show categories and their usage
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show spending statistics
    Summary {
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        as_of: Option<String>,
        /// Include the 30-day daily breakdown
        #[arg(long)]
        daily: bool,
        /// Show every month instead of the last six
        #[arg(long)]
        history: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export expenses
    Export {
        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormat,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace all expenses with an exported JSON file
    Import {
        /// Path to JSON file (`-` or omitted reads stdin)
        file: Option<PathBuf>,
        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = commands::get_data_dir()
        .ok()
        .and_then(|dir| Config::load(&dir).ok())
        .and_then(|config| config.log_level);
    init_logging(log_level.as_deref());

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Register { email, username, password, json } => {
            user::run_register(email, username, password, json)
        }
        Commands::Login { identifier, password, json } => user::run_login(identifier, password, json),
        Commands::Logout => user::run_logout(),
        Commands::Whoami { json } => user::run_whoami(json),
        Commands::Profile { email, username, json } => user::run_profile(email, username, json),
        Commands::Add { description, amount, date, category, json } => {
            expense::run_add(AddArgs { description, amount, date, category, json })
        }
        Commands::Edit { id, description, amount, date, category, json } => {
            expense::run_edit(EditArgs { id, description, amount, date, category, json })
        }
        Commands::Remove { id, yes } => expense::run_remove(id, yes),
        Commands::Show { id, json } => expense::run_show(id, json),
        Commands::List { search, category, limit, json } => list::run(search, category, limit, json),
        Commands::Categories { json } => categories::run(json),
        Commands::Summary { as_of, daily, history, json } => summary::run(as_of, daily, history, json),
        Commands::Export { format, output } => transfer::run_export(format, output),
        Commands::Import { file, yes, json } => transfer::run_import(file, yes, json),
    }
}
