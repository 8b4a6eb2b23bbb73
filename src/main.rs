use clap::{Parser, Subcommand};
use datepop::{cmd, data};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "datepop", about = "form with pop-over date pickers")]
struct Cli {
    /// Path to the data directory containing config and form files (default: ./config)
    #[arg(long, default_value = "./config")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write default config.yaml and an empty form.json
    Init,
    /// Print the saved form values
    Show,
    /// Print the six-week grid of a month
    Grid {
        /// Month to show (e.g. 2026-10); defaults to the current month
        month: Option<String>,
        /// Date to mark as selected (YYYY-MM-DD)
        #[arg(short, long)]
        selected: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = if cli.data_dir.is_absolute() {
        cli.data_dir.clone()
    } else {
        std::env::current_dir()?.join(&cli.data_dir)
    };
    data::persistence::set_data_dir(data_dir.clone());

    // Auto-init when the data directory is missing or empty and the user did not
    // explicitly invoke the `init` subcommand.
    let is_init_command = matches!(cli.command, Some(Commands::Init));
    if !is_init_command && dir_needs_init(&data_dir) {
        eprintln!(
            "Data directory '{}' is missing or empty, running init...",
            data_dir.display()
        );
        cmd::init::run()?;
    }

    match cli.command {
        None => cmd::root::run(),
        Some(Commands::Init) => cmd::init::run(),
        Some(Commands::Show) => cmd::show::run(),
        Some(Commands::Grid { month, selected }) => {
            cmd::grid::run(month.as_deref(), selected.as_deref())
        }
    }
}

/// Returns true when `dir` does not exist or exists but contains no files.
fn dir_needs_init(dir: &std::path::Path) -> bool {
    if !dir.exists() {
        return true;
    }
    dir.read_dir()
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
