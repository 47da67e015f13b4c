//! Configuration loading for the Nesta CLI.
//!
//! Settings layer in precedence order: built-in defaults, then an INI-style
//! config file, then command-line values. The same `set(option, value)`
//! entry point serves both the file and the command line, so every option
//! accepts the same spellings everywhere.

pub mod ini;
pub mod settings;

pub use settings::{Settings, SettingsError, CONFIG_FILENAME, CONFIG_SECTION};
