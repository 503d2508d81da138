use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use tab_settings::commands::{migration, presets, settings};
use tab_settings::services::host::LogHost;
use tab_settings::services::tab_settings::TabSettings;
use tab_settings::utils::preset_data::PresetValue;
use tab_settings::utils::settings::load_config;
use tab_settings::utils::storage::FileStorage;

const DATA_DIR_NAME: &str = "tab-settings";

#[derive(Parser)]
#[command(author, version, about = "Manage presets of a configurable tab widget", long_about = None)]
struct Cli {
    /// Widget configuration (JSON, camelCase keys)
    #[arg(long)]
    config: PathBuf,
    /// Directory holding saved presets and input values
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List presets (special, saved, native)
    List,
    /// Show the preset selector entries
    Menu,
    /// Select a preset by id
    Select { preset_id: String },
    /// Print the share link of a saved preset
    Share { preset_id: Option<String> },
    /// Import a preset from a share link
    Import { url: String },
    /// Save the given values as a new preset
    Save {
        name: String,
        /// Option value as OPTION_ID=VALUE (repeatable)
        #[arg(long = "value", value_parser = parse_assignment)]
        values: Vec<(String, PresetValue)>,
    },
    /// Prepare an editable copy of a preset
    Copy { preset_id: String },
    /// Delete a saved preset
    Delete { preset_id: String },
    /// List fonts used across presets
    Fonts,
    /// Show the active value of every option
    Options,
    /// Show the active value of one option
    Get { option_id: String },
    /// Set an input value
    Set { option_id: String, value: String },
    /// Restore an input to its default
    Reset { option_id: String },
    /// Show the current font and background
    Appearance,
    /// Run stored preset migrations
    Migrate,
}

fn parse_assignment(raw: &str) -> Result<(String, PresetValue), String> {
    let (option_id, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected OPTION_ID=VALUE, got '{raw}'"))?;
    let option_id = option_id.trim();
    if option_id.is_empty() {
        return Err(format!("missing option id in '{raw}'"));
    }
    Ok((option_id.to_string(), settings::parse_value_argument(value)))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| format!("Failed to encode output: {e}"))?;
    println!("{text}");
    Ok(())
}

fn resolve_data_dir(data_dir: Option<PathBuf>) -> Result<PathBuf, String> {
    match data_dir {
        Some(path) => Ok(path),
        None => dirs::data_dir()
            .map(|base| base.join(DATA_DIR_NAME))
            .ok_or_else(|| "Failed to resolve the platform data directory; pass --data-dir".to_string()),
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let storage = FileStorage::new(resolve_data_dir(cli.data_dir)?);
    log::debug!("using storage at {}", storage.root().display());

    if matches!(cli.command, Command::Migrate) {
        return print_json(&migration::migration_run(&storage)?);
    }

    let config = load_config(&cli.config).map_err(|e| e.to_string())?;
    let mut tab = TabSettings::new(config, storage, LogHost).map_err(|e| e.to_string())?;

    match cli.command {
        Command::List => print_json(&presets::presets_list(&tab)?),
        Command::Menu => print_json(&presets::presets_menu(&tab)?),
        Command::Select { preset_id } => {
            presets::presets_select(&mut tab, preset_id)?;
            print_json(&settings::settings_appearance(&tab)?)
        }
        Command::Share { preset_id } => print_json(&presets::presets_share(&tab, preset_id)?),
        Command::Import { url } => print_json(&presets::presets_import(&mut tab, url)?),
        Command::Save { name, values } => {
            let input = presets::PresetSaveInput {
                name,
                values: values.into_iter().collect(),
            };
            print_json(&presets::presets_save(&mut tab, input)?)
        }
        Command::Copy { preset_id } => print_json(&presets::presets_copy(&mut tab, preset_id)?),
        Command::Delete { preset_id } => print_json(&presets::presets_delete(&mut tab, preset_id)?),
        Command::Fonts => print_json(&presets::presets_fonts(&tab)?),
        Command::Options => print_json(&settings::settings_get(&tab)?),
        Command::Get { option_id } => print_json(&settings::settings_get_option(&tab, option_id)?),
        Command::Set { option_id, value } => {
            let value = settings::parse_value_argument(&value);
            print_json(&settings::settings_update_option(&mut tab, option_id, value)?)
        }
        Command::Reset { option_id } => {
            print_json(&settings::settings_reset_option(&mut tab, option_id)?)
        }
        Command::Appearance => print_json(&settings::settings_appearance(&tab)?),
        Command::Migrate => Ok(()),
    }
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{error}");
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
