//! Compiler configuration.

use std::path::PathBuf;

use crate::emitter::ColorFormatPref;

/// Everything a [`crate::compiler::Compiler`] needs to know. The CLI builds
/// this from its layered settings; library users fill it directly.
#[derive(Clone, Debug)]
pub struct CompilerConfig {
    /// Encoding assumed when the sniff finds nothing
    pub default_encoding: Option<String>,
    /// Forces the input encoding, ignoring `@charset` and BOMs
    pub source_encoding: Option<String>,
    /// Output encoding; defaults to the input's encoding
    pub dest_encoding: Option<String>,
    pub enable_imports: bool,
    pub enable_solve: bool,
    /// Flattening additionally requires solving to be enabled
    pub enable_flatten: bool,
    pub curfile_relative_imports: bool,
    pub toplevel_relative_imports: bool,
    pub stop_on_import_not_found: bool,
    pub stop_on_import_syntax_error: bool,
    pub import_directories: Vec<PathBuf>,
    pub line_width: usize,
    pub color_format: ColorFormatPref,
}

impl Default for CompilerConfig {
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
            line_width: 80,
            color_format: ColorFormatPref::Any,
        }
    }
}
