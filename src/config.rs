use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::Deserialize;

use crate::contact::{Location, DEFAULT_LOGO};

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "firmdex";

#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    /// Store file override; the platform data dir is used when unset.
    pub store_path: Option<PathBuf>,
    pub default_logo: String,
    pub map: MapConfig,
    pub commands: Commands,
    pub keys: Keys,
}

#[derive(Debug, Clone)]
pub struct MapConfig {
    pub center: Location,
    /// Visible longitude span in degrees at startup.
    pub span: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: Location::new(35.6892, 51.389),
            span: 24.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Commands {
    pub dial: Option<CommandExec>,
}

#[derive(Debug, Clone)]
pub struct CommandExec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandExec {
    fn from_def(def: CommandDef) -> Option<Self> {
        match def {
            CommandDef::Simple(cmd) => {
                let trimmed = cmd.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Self {
                        program: trimmed.to_string(),
                        args: Vec::new(),
                    })
                }
            }
            CommandDef::List(mut parts) => {
                if parts.is_empty() {
                    return None;
                }
                let program = parts.remove(0);
                Some(Self {
                    program,
                    args: parts,
                })
            }
        }
    }
}

// =============================================================================
// Key Bindings - lists of binding strings per context
// =============================================================================

#[derive(Debug, Clone)]
pub struct Keys {
    pub global: GlobalKeys,
    pub list: ListKeys,
    pub popover: PopoverKeys,
    pub modal: ModalKeys,
    pub form: FormKeys,
    pub picker: PickerKeys,
}

#[derive(Debug, Clone)]
pub struct GlobalKeys {
    pub quit: Vec<String>,
    pub search: Vec<String>,
    pub add: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ListKeys {
    pub next: Vec<String>,
    pub prev: Vec<String>,
    pub open: Vec<String>,
    pub page_down: Vec<String>,
    pub page_up: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PopoverKeys {
    pub next: Vec<String>,
    pub prev: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ModalKeys {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FormKeys {
    pub next_field: Vec<String>,
    pub prev_field: Vec<String>,
    pub submit: Vec<String>,
    pub cancel: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PickerKeys {
    pub zoom_in: Vec<String>,
    pub zoom_out: Vec<String>,
    pub locate: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

impl Default for Keys {
    fn default() -> Self {
        Self {
            global: GlobalKeys {
                quit: vec!["q".into()],
                search: vec!["/".into()],
                add: vec!["a".into()],
            },
            list: ListKeys {
                next: vec!["j".into(), "down".into()],
                prev: vec!["k".into(), "up".into()],
                open: vec!["enter".into()],
                page_down: vec!["pagedown".into()],
                page_up: vec!["pageup".into()],
            },
            popover: PopoverKeys {
                next: vec!["j".into(), "down".into()],
                prev: vec!["k".into(), "up".into()],
                confirm: vec!["enter".into()],
                cancel: vec!["esc".into(), "q".into()],
            },
            modal: ModalKeys {
                confirm: vec!["y".into(), "enter".into()],
                cancel: vec!["n".into(), "esc".into()],
            },
            form: FormKeys {
                next_field: vec!["tab".into(), "down".into()],
                prev_field: vec!["backtab".into(), "up".into()],
                submit: vec!["enter".into()],
                cancel: vec!["esc".into()],
            },
            picker: PickerKeys {
                zoom_in: vec!["+".into(), "=".into()],
                zoom_out: vec!["-".into()],
                locate: vec!["g".into()],
                confirm: vec!["enter".into()],
                cancel: vec!["esc".into(), "q".into()],
            },
        }
    }
}

// =============================================================================
// File-shape structs (what the TOML actually contains)
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    store_path: Option<String>,
    default_logo: Option<String>,
    #[serde(default)]
    map: MapFile,
    #[serde(default)]
    commands: CommandsFile,
    #[serde(default)]
    keys: KeysFile,
}

#[derive(Debug, Default, Deserialize)]
struct MapFile {
    center_lat: Option<f64>,
    center_lng: Option<f64>,
    span: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct CommandsFile {
    dial: Option<CommandDef>,
}

/// A command is either a plain program name or an argv list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CommandDef {
    Simple(String),
    List(Vec<String>),
}

#[derive(Debug, Default, Deserialize)]
struct KeysFile {
    #[serde(default)]
    global: KeyMapFile,
    #[serde(default)]
    list: KeyMapFile,
    #[serde(default)]
    popover: KeyMapFile,
    #[serde(default)]
    modal: KeyMapFile,
    #[serde(default)]
    form: KeyMapFile,
    #[serde(default)]
    picker: KeyMapFile,
}

#[derive(Debug, Default, Deserialize)]
struct KeyMapFile {
    quit: Option<Vec<String>>,
    search: Option<Vec<String>>,
    add: Option<Vec<String>>,
    next: Option<Vec<String>>,
    prev: Option<Vec<String>>,
    open: Option<Vec<String>>,
    page_down: Option<Vec<String>>,
    page_up: Option<Vec<String>>,
    confirm: Option<Vec<String>>,
    cancel: Option<Vec<String>>,
    next_field: Option<Vec<String>>,
    prev_field: Option<Vec<String>>,
    submit: Option<Vec<String>>,
    zoom_in: Option<Vec<String>>,
    zoom_out: Option<Vec<String>>,
    locate: Option<Vec<String>>,
}

fn override_keys(target: &mut Vec<String>, value: Option<Vec<String>>) {
    if let Some(value) = value {
        *target = value;
    }
}

impl Config {
    fn from_file(config_path: PathBuf, file: ConfigFile) -> Self {
        let defaults = MapConfig::default();
        let map = MapConfig {
            center: Location::new(
                file.map.center_lat.unwrap_or(defaults.center.lat),
                file.map.center_lng.unwrap_or(defaults.center.lng),
            ),
            span: file.map.span.unwrap_or(defaults.span),
        };

        let mut keys = Keys::default();
        override_keys(&mut keys.global.quit, file.keys.global.quit);
        override_keys(&mut keys.global.search, file.keys.global.search);
        override_keys(&mut keys.global.add, file.keys.global.add);
        override_keys(&mut keys.list.next, file.keys.list.next);
        override_keys(&mut keys.list.prev, file.keys.list.prev);
        override_keys(&mut keys.list.open, file.keys.list.open);
        override_keys(&mut keys.list.page_down, file.keys.list.page_down);
        override_keys(&mut keys.list.page_up, file.keys.list.page_up);
        override_keys(&mut keys.popover.next, file.keys.popover.next);
        override_keys(&mut keys.popover.prev, file.keys.popover.prev);
        override_keys(&mut keys.popover.confirm, file.keys.popover.confirm);
        override_keys(&mut keys.popover.cancel, file.keys.popover.cancel);
        override_keys(&mut keys.modal.confirm, file.keys.modal.confirm);
        override_keys(&mut keys.modal.cancel, file.keys.modal.cancel);
        override_keys(&mut keys.form.next_field, file.keys.form.next_field);
        override_keys(&mut keys.form.prev_field, file.keys.form.prev_field);
        override_keys(&mut keys.form.submit, file.keys.form.submit);
        override_keys(&mut keys.form.cancel, file.keys.form.cancel);
        override_keys(&mut keys.picker.zoom_in, file.keys.picker.zoom_in);
        override_keys(&mut keys.picker.zoom_out, file.keys.picker.zoom_out);
        override_keys(&mut keys.picker.locate, file.keys.picker.locate);
        override_keys(&mut keys.picker.confirm, file.keys.picker.confirm);
        override_keys(&mut keys.picker.cancel, file.keys.picker.cancel);

        Self {
            config_path,
            store_path: file.store_path.map(PathBuf::from),
            default_logo: file
                .default_logo
                .unwrap_or_else(|| DEFAULT_LOGO.to_string()),
            map,
            commands: Commands {
                dial: file.commands.dial.and_then(CommandExec::from_def),
            },
            keys,
        }
    }

    fn defaults_at(config_path: PathBuf) -> Self {
        Self::from_file(config_path, ConfigFile::default())
    }
}

fn default_config_path() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine config directories")?;
    Ok(base.config_dir().join(APP_NAME).join(CONFIG_FILE_NAME))
}

/// Load configuration, or the built-in defaults when no file exists yet.
pub fn load() -> Result<Config> {
    let path = default_config_path()?;
    if !path.exists() {
        return Ok(Config::defaults_at(path));
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file: ConfigFile = toml::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Config::from_file(path, file))
}
