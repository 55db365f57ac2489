// Cursormap CLI
// Inspect, validate and replay key substitution filters

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use cursormap_core::config::parse_number;
use cursormap_core::patch_block;
use cursormap_core::{
    Config, EngineConfig, EventKind, EventMask, EventRecord, KeyPreset, Modifiers, RemapEngine,
    ScriptedSource, SubstitutionTable,
};

/// Key substitution filter tools
#[derive(Parser, Debug)]
#[command(name = "cursormap")]
#[command(author = "cursormap contributors")]
#[command(version)]
#[command(about = "Key substitution filter tools", long_about = None)]
struct Args {
    /// Enable debug logging (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a config and print the resolved table
    Check {
        /// TOML configuration file (default: ~/.config/cursormap/config.toml)
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },
    /// Decode the patch block embedded in a filter image
    Inspect {
        /// Binary image containing a KEYMAP>> block
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },
    /// Print a patch block as hex
    Dump {
        /// TOML configuration file
        #[arg(short, long, value_name = "CONFIG", conflicts_with = "preset")]
        config: Option<PathBuf>,

        /// Arrow preset: brackets, ijkl, wasd, keypad
        #[arg(short, long, value_name = "PRESET")]
        preset: Option<String>,
    },
    /// Feed a scripted event sequence through the filter
    Replay {
        /// TOML configuration file
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,

        /// TOML event script ([[event]] entries)
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
    },
}

/// Replay script root
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Script {
    #[serde(default)]
    event: Vec<ScriptEvent>,
}

/// One scripted event
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptEvent {
    kind: String,
    #[serde(default)]
    key: Option<ScriptValue>,
    #[serde(default, rename = "char")]
    char_code: Option<ScriptValue>,
    #[serde(default)]
    modifiers: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptValue {
    Int(i64),
    Text(String),
}

impl ScriptValue {
    /// Numeric byte value (`key`)
    fn number(&self) -> Result<u8> {
        let value = match self {
            ScriptValue::Int(value) => *value,
            ScriptValue::Text(text) => parse_number(text)?,
        };
        u8::try_from(value).with_context(|| format!("value {} does not fit a byte", value))
    }

    /// Character byte value (`char`); a one-character string stands for its own code
    fn character(&self) -> Result<u8> {
        match self {
            ScriptValue::Text(text) if text.len() == 1 => Ok(text.as_bytes()[0]),
            other => other.number(),
        }
    }
}

impl ScriptEvent {
    fn to_record(&self) -> Result<EventRecord> {
        let what = self
            .kind
            .parse::<EventKind>()
            .map_err(anyhow::Error::msg)?;
        let key = self.key.as_ref().map(ScriptValue::number).transpose()?.unwrap_or(0);
        let char_code = self
            .char_code
            .as_ref()
            .map(ScriptValue::character)
            .transpose()?
            .unwrap_or(0);
        let modifiers = match &self.modifiers {
            Some(text) => text.parse::<Modifiers>().map_err(anyhow::Error::msg)?,
            None => Modifiers::empty(),
        };
        Ok(EventRecord::key(what, key, char_code, modifiers))
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_toml_path(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Config::load_default().context("failed to load default config"),
    }
}

fn print_engine_config(config: &EngineConfig) {
    println!("mode: {}", config.mode);
    println!("continuation: {}", config.continuation);
    for (i, entry) in config.table.entries().iter().enumerate() {
        println!(
            "  [{}] key {:#04X} -> {}",
            i, entry.source_key, entry.replacement
        );
    }
}

fn check(config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;
    match &config.source_path {
        Some(path) => println!("config: {}", path.display()),
        None => println!("config: built-in"),
    }
    print_engine_config(&config.engine);
    println!("Configuration is valid");
    Ok(())
}

fn inspect(image: &Path) -> Result<()> {
    let bytes = fs::read(image).with_context(|| format!("failed to read {}", image.display()))?;
    let block = patch_block::decode(&bytes)
        .with_context(|| format!("no usable patch block in {}", image.display()))?;
    println!("patch block at offset {:#x}", block.offset);
    print_engine_config(&block.to_engine_config());
    Ok(())
}

fn dump(config: Option<PathBuf>, preset: Option<String>) -> Result<()> {
    let (table, mode) = match preset {
        Some(name) => {
            let preset = KeyPreset::from_name(&name)
                .with_context(|| format!("unknown preset '{}'", name))?;
            let defaults = EngineConfig::default();
            (SubstitutionTable::from_preset(preset), defaults.mode)
        }
        None => {
            let config = load_config(config.as_deref())?;
            (config.engine.table, config.engine.mode)
        }
    };

    let block = patch_block::encode(&table, mode);
    let hex: Vec<String> = block.iter().map(|byte| format!("{:02X}", byte)).collect();
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", hex.join(" "))?;
    Ok(())
}

fn replay(config: Option<PathBuf>, script: &Path) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let content = fs::read_to_string(script)
        .with_context(|| format!("failed to read script {}", script.display()))?;
    let script: Script = toml::from_str(&content).context("failed to parse script")?;
    if script.event.is_empty() {
        bail!("script has no [[event]] entries");
    }

    let events = script
        .event
        .iter()
        .map(ScriptEvent::to_record)
        .collect::<Result<Vec<_>>>()?;
    let count = events.len();

    let mut engine = RemapEngine::new(ScriptedSource::new(), config.engine);
    for (i, event) in events.into_iter().enumerate() {
        engine.source_mut().push(event);
        let mut filtered = EventRecord::default();
        let Some(outcome) = engine.filter_next(EventMask::EVERY_EVENT, &mut filtered) else {
            println!("{:>3}: no event", i);
            continue;
        };

        println!(
            "{:>3}: {:<8} {:#06X} [{}] -> {:#06X} [{}] {:?}",
            i,
            event.what.to_string(),
            event.key_payload(),
            event.modifiers,
            filtered.key_payload(),
            filtered.modifiers,
            outcome
        );
    }
    log::debug!("replayed {} events", count);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Check { config } => check(config),
        Command::Inspect { image } => inspect(&image),
        Command::Dump { config, preset } => dump(config, preset),
        Command::Replay { config, script } => replay(config, &script),
    }
}
