//! Custos CLI - Command-line interface for the meeting-capture ingestion pipeline.

use clap::Parser;
use custos_cli::commands;
use custos_cli::{init_tracing, open_store, Cli, Command, Config, Formatter};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> custos_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load(Some(config_path.as_path()))?;
    init_tracing(&config.logging.filter);

    // Determine output format
    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    // Only config commands run without opening the database
    let db_path = cli.database.unwrap_or_else(|| config.database_path());
    let open = || open_store(&db_path);

    match cli.command {
        Command::Config(args) => commands::execute_config(args, &config, &config_path, &formatter)?,
        Command::Submit(args) => commands::execute_submit(args, &mut open()?, &config, &formatter)?,
        Command::Status(args) => commands::execute_status(args, &open()?, &config, &formatter)?,
        Command::Retry(args) => commands::execute_retry(args, &mut open()?, &config, &formatter)?,
        Command::RunOnce(args) => {
            commands::execute_run_once(args, &mut open()?, &config, &formatter)?
        }
        Command::Work => commands::execute_work(&mut open()?, &config, &formatter).await?,
        Command::Jobs(args) => commands::execute_jobs(args, &open()?, &config, &formatter)?,
        Command::Dedupe => commands::execute_dedupe(&mut open()?, &formatter)?,
        Command::Repair => commands::execute_repair(&mut open()?, &formatter)?,
        Command::Health => commands::execute_health(&open()?, &formatter)?,
        Command::Audit(args) => commands::execute_audit(args, &open()?, &formatter)?,
        Command::Meeting(args) => commands::execute_meeting(args, &mut open()?, &formatter)?,
        Command::Person(args) => commands::execute_person(args, &mut open()?, &formatter)?,
    }

    Ok(())
}
