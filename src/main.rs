mod audit;
mod cli;
mod dashboard;
mod dates;
mod db;
mod error;
mod export;
mod fmt;
mod models;
mod money;
mod pnl;
mod series;
mod settings;
mod store;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{
    Cli, Commands, ExpenseTypesCommands, ExpensesCommands, ExportCommands, InvoicesCommands,
    ReportCommands, SalesCommands,
};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init {
            data_dir,
            business_name,
            currency,
        } => cli::init::run(data_dir, business_name, currency),
        Commands::Sales { command } => match command {
            SalesCommands::Add {
                amount,
                date,
                sale_type,
                description,
            } => cli::sales::add(amount, &date, &sale_type, &description),
            SalesCommands::List { year } => cli::sales::list(year),
        },
        Commands::Invoices { command } => match command {
            InvoicesCommands::Add {
                number,
                date,
                invoice_type,
                items,
                seller,
                documented_date,
                payment_method,
                payment_date,
            } => cli::invoices::add(
                &number,
                &date,
                &invoice_type,
                &items,
                seller,
                documented_date,
                &payment_method,
                payment_date,
            ),
            InvoicesCommands::List { year } => cli::invoices::list(year),
        },
        Commands::ExpenseTypes { command } => match command {
            ExpenseTypesCommands::Add { name, id } => cli::expenses::add_type(&name, id.as_deref()),
            ExpenseTypesCommands::List => cli::expenses::list_types(),
            ExpenseTypesCommands::Delete { id } => cli::expenses::delete_type(&id),
        },
        Commands::Expenses { command } => match command {
            ExpensesCommands::Add {
                amount,
                date,
                type_id,
                description,
                payment_method,
                payment_date,
            } => cli::expenses::add(amount, &date, &type_id, &description, &payment_method, payment_date),
            ExpensesCommands::List { year } => cli::expenses::list(year),
        },
        Commands::Report { command } => match command {
            ReportCommands::Pnl { year } => cli::report::pnl(year),
            ReportCommands::Dashboard { from_date, to_date } => cli::report::dashboard(from_date, to_date),
            ReportCommands::Drilldown { year, month, row } => cli::report::drilldown(year, &month, &row),
            ReportCommands::Audit => cli::report::audit_report(),
        },
        Commands::Export { command } => match command {
            ExportCommands::Pnl { year, output } => cli::export::pnl(year, output),
            ExportCommands::Series {
                from_date,
                to_date,
                output,
            } => cli::export::series(from_date, to_date, output),
            ExportCommands::Sales {
                from_date,
                to_date,
                output,
            } => cli::export::sales(from_date, to_date, output),
            ExportCommands::Invoices {
                from_date,
                to_date,
                output,
            } => cli::export::invoices(from_date, to_date, output),
            ExportCommands::Expenses {
                from_date,
                to_date,
                output,
            } => cli::export::expenses(from_date, to_date, output),
        },
        Commands::Import { file } => cli::import::run(&file),
        Commands::Demo => cli::demo::run(),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
