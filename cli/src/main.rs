mod commands;
mod config;
mod logging;
mod notify;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use crate::commands::{
    cmd_export, cmd_import, cmd_task_add, cmd_task_done, cmd_task_list, cmd_weight_add,
    cmd_weight_list, cmd_weight_unit,
};
use crate::config::Config;
use crate::notify::BellNotifier;
use taskman_core::service::TaskmanService;

#[derive(Parser)]
#[command(
    name = "taskman",
    version,
    about = "Track daily tasks and body weight",
    long_about = "Track daily to-do tasks and body weight in a local SQLite file.\n\
                  Completing a task removes it. Weights are stored in kilograms."
)]
struct Cli {
    /// Database file to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    /// Don't ring the terminal bell after adding or completing
    #[arg(long, global = true)]
    quiet_bell: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage daily tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Track body weight
    Weight {
        #[command(subcommand)]
        command: WeightCommands,
    },
    /// Export all tasks and weights as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Append tasks and weights from a JSON export
    Import {
        /// Path to the export file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Add a task (at most 70 characters)
    Add {
        /// Task title
        title: String,
        /// Day for the task (YYYY-MM-DD, DD.MM.YYYY or today/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Complete a task. It is removed for good.
    Done {
        /// Task ID (as shown by `task list`)
        id: i64,
        /// Day the task belongs to (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List tasks for a day (default: today)
    List {
        /// Day to show: a date, today/yesterday/tomorrow, or an offset like +1 / -1
        #[arg(allow_hyphen_values = true, allow_negative_numbers = true)]
        day: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WeightCommands {
    /// Log a weight entry
    Add {
        /// Weight value (5 to 999.999)
        value: f64,
        /// Unit: kg or lb (default: the display unit)
        #[arg(short, long)]
        unit: Option<String>,
        /// Date (YYYY-MM-DD, DD.MM.YYYY or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all weight entries and the latest change
    List {
        /// Unit to display: kg or lb (default: the display unit)
        #[arg(short, long)]
        unit: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or set the default display unit
    Unit {
        /// New unit: kg or lb
        unit: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let _logger = logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?.with_overrides(cli.db, cli.quiet_bell);
    log::debug!(
        "data dir {}, database {}",
        config.data_dir.display(),
        config.db_path.display()
    );
    let mut svc = TaskmanService::new(&config.db_path, Box::new(BellNotifier::new(config.bell)))?;

    match cli.command {
        Commands::Task { command } => match command {
            TaskCommands::Add { title, date, json } => cmd_task_add(&mut svc, &title, date, json),
            TaskCommands::Done { id, date, json } => cmd_task_done(&svc, id, date, json),
            TaskCommands::List { day, json } => cmd_task_list(&svc, day, json),
        },
        Commands::Weight { command } => match command {
            WeightCommands::Add {
                value,
                unit,
                date,
                json,
            } => cmd_weight_add(&svc, value, unit.as_deref(), date, json),
            WeightCommands::List { unit, json } => cmd_weight_list(&svc, unit.as_deref(), json),
            WeightCommands::Unit { unit, json } => cmd_weight_unit(&svc, unit.as_deref(), json),
        },
        Commands::Export { output } => cmd_export(&svc, output.as_ref()),
        Commands::Import { file, json } => cmd_import(&mut svc, &file, json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_task_list_with_negative_offset() {
        let cli = Cli::try_parse_from(["taskman", "task", "list", "-1"]).unwrap();
        match cli.command {
            Commands::Task {
                command: TaskCommands::List { day, .. },
            } => assert_eq!(day.as_deref(), Some("-1")),
            _ => panic!("expected task list"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "taskman",
            "weight",
            "add",
            "100",
            "--unit",
            "lb",
            "--db",
            "/tmp/t.db",
            "-vv",
            "--quiet-bell",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/t.db")));
        assert_eq!(cli.verbose, 2);
        assert!(cli.quiet_bell);
    }
}
