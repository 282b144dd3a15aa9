#![forbid(unsafe_code)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use statusbar_organizer::constants::attributes;
use statusbar_organizer::{BarItem, JsonFileStore, MemoryBar, MemoryItem, Organizer};

#[derive(Parser, Debug)]
#[command(name = "statusbar-organizer", version, about = "Manage status bar presets")]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Act on the fullscreen preset
    #[arg(long, global = true)]
    fullscreen: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List presets and their commands
    Presets,
    /// Copy the active preset into a new one and switch to it
    Create,
    Rename { old: String, new: String },
    Delete { name: String },
    Switch { name: String },
    /// Use a separate preset while fullscreen
    SeparateFullscreen { state: Toggle },
    /// Upgrade the settings file to the current format
    Migrate,
    /// Reconcile a status bar snapshot with the active preset and reorder it
    Apply {
        /// JSON array of status bar items; identities are written back to it
        #[arg(long)]
        bar: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Toggle {
    On,
    Off,
}

fn init_logging() -> Result<()> {
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")
}

fn load_bar(path: &Path) -> Result<Vec<MemoryItem>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read status bar snapshot: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse status bar snapshot: {}", path.display()))
}

fn save_bar(path: &Path, items: &[MemoryItem]) -> Result<()> {
    let json = serde_json::to_string_pretty(items).context("Failed to serialize status bar")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write status bar snapshot: {}", path.display()))
}

fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let store = JsonFileStore::new(cli.settings.unwrap_or_else(JsonFileStore::default_path));
    info!(path = %store.path().display(), "Using settings file");

    match cli.command {
        Command::Apply { bar } => apply(&bar, store, cli.fullscreen),
        command => {
            let mut organizer = Organizer::activate(MemoryBar::default(), store, cli.fullscreen);
            let result = run_preset_command(&mut organizer, command);
            organizer.deactivate();
            result
        }
    }
}

fn run_preset_command(
    organizer: &mut Organizer<MemoryBar, JsonFileStore>,
    command: Command,
) -> Result<()> {
    match command {
        Command::Presets => {
            let commands = organizer.preset_commands();
            for (entry, command) in organizer.preset_entries().iter().zip(&commands) {
                let marker = if entry.active { "*" } else { " " };
                println!("{marker} {:<25}  {}", entry.name, command.id);
            }
        }
        Command::Create => {
            let name = organizer.create_preset();
            println!("Created and switched to \"{name}\"");
        }
        Command::Rename { old, new } => match organizer.rename_preset(&old, &new) {
            Some(name) => println!("Renamed \"{old}\" to \"{name}\""),
            None => bail!("Cannot rename \"{old}\": unknown preset or unchanged name"),
        },
        Command::Delete { name } => {
            if !organizer.delete_preset(&name) {
                bail!("Unknown preset \"{name}\"");
            }
            println!("Deleted \"{name}\", active preset is \"{}\"", organizer.active_preset());
        }
        Command::Switch { name } => {
            if !organizer.switch_preset(&name) {
                bail!("Unknown preset \"{name}\"");
            }
            println!("Switched to \"{name}\"");
        }
        Command::SeparateFullscreen { state } => {
            organizer.set_separate_fullscreen(matches!(state, Toggle::On));
        }
        Command::Migrate => {
            println!("Settings are at version {}", organizer.settings().version);
        }
        Command::Apply { .. } => bail!("apply needs a status bar snapshot"),
    }
    Ok(())
}

fn apply(path: &Path, store: JsonFileStore, fullscreen: bool) -> Result<()> {
    let bar = MemoryBar::new(load_bar(path)?);
    let mut organizer = Organizer::activate(bar.clone(), store, fullscreen);

    organizer.open_menu();
    organizer.run_due();

    let items = bar.snapshot();
    let rank_of = |key: &str| {
        items
            .iter()
            .find(|item| item.attribute(attributes::ELEMENT_ID).as_deref() == Some(key))
            .and_then(|item| item.order)
    };

    println!("Preset \"{}\"", organizer.active_preset());
    for row in organizer.row_views() {
        let rank = rank_of(&row.key).map_or_else(|| "-".to_string(), |rank| rank.to_string());
        let state = match (row.exists, row.visible) {
            (false, _) => "missing",
            (true, true) => "shown",
            (true, false) => "hidden",
        };
        let preview = row.preview.as_deref().unwrap_or("");
        println!("{rank:>3}  {:<30}  {:<7}  {:<30}  {preview}", row.label, state, row.key);
    }

    organizer.close_menu();
    organizer.deactivate();
    save_bar(path, &items)
}
