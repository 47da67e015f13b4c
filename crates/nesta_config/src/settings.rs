//! The settings store and its option table.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ini;

/// Default config file, looked up in the working directory
pub const CONFIG_FILENAME: &str = "nesta.conf";
/// The section the compiler reads from the config file
pub const CONFIG_SECTION: &str = "nesta";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Ini(#[from] ini::IniError),
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("invalid value '{value}' for option '{option}'")]
    InvalidValue { option: String, value: String },
}

/// Boolean spellings accepted in config files and on the command line
#[must_use]
pub fn string_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" | "on" | "enable" => Some(true),
        "false" | "f" | "no" | "n" | "0" | "off" | "disable" => Some(false),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub default_encoding: Option<String>,
    pub source_encoding: Option<String>,
    pub dest_encoding: Option<String>,
    pub enable_imports: bool,
    pub enable_solve: bool,
    pub enable_flatten: bool,
    pub curfile_relative_imports: bool,
    pub toplevel_relative_imports: bool,
    pub stop_on_import_not_found: bool,
    pub stop_on_import_syntax_error: bool,
    pub import_directories: Vec<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_encoding: None,
            source_encoding: None,
            dest_encoding: None,
            enable_imports: true,
            enable_solve: true,
            enable_flatten: true,
            curfile_relative_imports: true,
            toplevel_relative_imports: true,
            stop_on_import_not_found: false,
            stop_on_import_syntax_error: true,
            import_directories: Vec::new(),
        }
    }
}

impl Settings {
    /// Applies one option by name. Both layers (file and command line) feed
    /// through here, so the accepted values are identical.
    pub fn set(&mut self, option: &str, value: &str) -> Result<(), SettingsError> {
        let invalid = || SettingsError::InvalidValue {
            option: option.to_string(),
            value: value.to_string(),
        };
        let bool_value = || string_bool(value).ok_or_else(invalid);

        match option.to_ascii_lowercase().as_str() {
            "default_encoding" => self.default_encoding = Some(value.to_string()),
            "source_encoding" => self.source_encoding = Some(value.to_string()),
            "dest_encoding" => self.dest_encoding = Some(value.to_string()),
            "enable_imports" => self.enable_imports = bool_value()?,
            "enable_solve" => self.enable_solve = bool_value()?,
            "enable_flatten" => self.enable_flatten = bool_value()?,
            "curfile_relative_imports" => self.curfile_relative_imports = bool_value()?,
            "toplevel_relative_imports" => self.toplevel_relative_imports = bool_value()?,
            "stop_on_import_not_found" => self.stop_on_import_not_found = bool_value()?,
            "stop_on_import_syntax_error" => self.stop_on_import_syntax_error = bool_value()?,
            "import_directories" => {
                self.import_directories = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(PathBuf::from)
                    .collect();
            }
            _ => return Err(SettingsError::UnknownOption(option.to_string())),
        }
        Ok(())
    }

    /// Merges the `[nesta]` section of an INI file into these settings
    pub fn apply_file(&mut self, path: &Path) -> Result<(), SettingsError> {
        log::debug!("reading config file {}", path.display());
        let text = std::fs::read_to_string(path)?;
        let sections = ini::parse(&text)?;
        if let Some(section) = sections.get(CONFIG_SECTION) {
            for (key, value) in section {
                self.set(key, value)?;
            }
        }
        Ok(())
    }

    /// Builds settings from defaults plus an optional config file. An
    /// explicitly given path must exist; the default lookup is silent when
    /// no file is present.
    pub fn load(conf: Option<&Path>) -> Result<Settings, SettingsError> {
        let mut settings = Settings::default();
        match conf {
            Some(path) => settings.apply_file(path)?,
            None => {
                let default = Path::new(CONFIG_FILENAME);
                if default.exists() {
                    settings.apply_file(default)?;
                }
            }
        }
        Ok(settings)
    }
}
