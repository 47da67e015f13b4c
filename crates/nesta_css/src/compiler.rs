//! The compiler driver: reader, parser, inliner, solver, flattener, emitter,
//! in that order, each pass gated by its configuration switch.

use std::io::Write;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use nesta_shared::errors::{CssError, CssResult};

use crate::config::CompilerConfig;
use crate::emitter::Emitter;
use crate::flattener;
use crate::functions::FunctionRegistry;
use crate::inliner::{ImportFinder, Inliner};
use crate::node::Stylesheet;
use crate::reader::{self, ReadOutcome};
use crate::solver::Solver;
use crate::Ncss;

fn absolute_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// One compiler instance per compile configuration. Instances share nothing,
/// so independent inputs can be compiled by independent instances; the
/// function registry is read-only after construction.
pub struct Compiler {
    config: CompilerConfig,
    registry: FunctionRegistry,
    finders: Vec<Box<dyn ImportFinder>>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

impl Compiler {
    #[must_use]
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            registry: FunctionRegistry::with_builtins(),
            finders: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Extend the function registry before the first compile
    pub fn registry_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.registry
    }

    /// Adds a user-supplied import finder; finders run after the
    /// file-relative lookups, in registration order
    pub fn add_finder(&mut self, finder: Box<dyn ImportFinder>) {
        self.finders.push(finder);
    }

    /// Compiles one file into another
    pub fn compile_file(&self, input: &Path, output: &Path) -> CssResult<()> {
        let outcome = reader::read_file(
            input,
            self.config.source_encoding.as_deref(),
            self.config.default_encoding.as_deref(),
        )?;
        let sheet = self.run_passes(&outcome, input)?;
        let text = self.emit(&sheet);
        let bytes = reader::encode_css(&text, self.dest_encoding(&outcome)?);

        let mut file = std::fs::File::create(output)?;
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(())
    }

    /// Compiles raw bytes (e.g. from stdin) to encoded output bytes
    pub fn compile_bytes(&self, bytes: &[u8], filename: &str) -> CssResult<Vec<u8>> {
        let outcome = reader::read_bytes(
            bytes,
            self.config.source_encoding.as_deref(),
            self.config.default_encoding.as_deref(),
        )?;
        let sheet = self.run_passes(&outcome, Path::new(filename))?;
        let text = self.emit(&sheet);
        Ok(reader::encode_css(&text, self.dest_encoding(&outcome)?))
    }

    /// Compiles an already-decoded string to a string
    pub fn compile_string(&self, source: &str, filename: &str) -> CssResult<String> {
        let outcome = reader::read_str(
            source,
            self.config.source_encoding.as_deref(),
            self.config.default_encoding.as_deref(),
        )?;
        let sheet = self.run_passes(&outcome, Path::new(filename))?;
        Ok(self.emit(&sheet))
    }

    fn run_passes(&self, outcome: &ReadOutcome, source_path: &Path) -> CssResult<Stylesheet> {
        let mut sheet = Ncss::parse_str(&outcome.text, &source_path.display().to_string())?;
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("parsed tree:\n{}", crate::walker::Walker::new(&sheet).walk_to_string());
        }
        self.verify_charset(&sheet, outcome)?;

        if self.config.enable_imports {
            let toplevel = absolute_path(source_path);
            Inliner::new(&self.config, &self.finders, toplevel).run(&mut sheet)?;
        }
        if self.config.enable_solve {
            Solver::new(&self.registry).solve_stylesheet(&mut sheet)?;
        }
        if self.config.enable_flatten && self.config.enable_solve {
            flattener::flatten_stylesheet(&mut sheet)?;
        }

        Ok(sheet)
    }

    /// When the encoding sniff matched a `@charset` pattern, the parsed tree
    /// must name the same encoding.
    fn verify_charset(&self, sheet: &Stylesheet, outcome: &ReadOutcome) -> CssResult<()> {
        if !outcome.charset_rule_required {
            return Ok(());
        }
        let Some(charset) = &sheet.charset else {
            return Err(CssError::Runtime(format!(
                "detected encoding '{}' requires a matching @charset rule",
                outcome.encoding.name()
            )));
        };
        let named = reader::lookup_encoding(&charset.name)?;
        if named != outcome.encoding {
            return Err(CssError::Runtime(format!(
                "@charset rule names '{}' but the detected encoding is '{}'",
                charset.name,
                outcome.encoding.name()
            )));
        }
        Ok(())
    }

    fn emit(&self, sheet: &Stylesheet) -> String {
        Emitter::new()
            .with_line_width(self.config.line_width)
            .with_color_format(self.config.color_format)
            .emit_stylesheet(sheet)
    }

    fn dest_encoding(&self, outcome: &ReadOutcome) -> CssResult<&'static Encoding> {
        match &self.config.dest_encoding {
            Some(label) => reader::lookup_encoding(label),
            None => Ok(outcome.encoding),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn compile(source: &str) -> String {
        Compiler::default()
            .compile_string(source, "<string>")
            .unwrap()
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("nesta-compiler-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn empty_input_empty_output() {
        assert_eq!(compile(""), "");
    }

    #[test]
    fn nesting_flattens() {
        assert_eq!(
            compile("outer { inner { rule: value; } }"),
            "outer {}\nouter inner {\n    rule: value;\n}\n"
        );
    }

    #[test]
    fn arithmetic_folds() {
        assert_eq!(
            compile("a { x: 1+2+3+4; y: 2*2+3*4; z: 8/4+1; }"),
            "a {\n    x: 10;\n    y: 16;\n    z: 3;\n}\n"
        );
    }

    #[test]
    fn bare_slash_stays_a_separator() {
        assert_eq!(compile("a { w: 6/3; }"), "a {\n    w: 6/3;\n}\n");
    }

    #[test]
    fn variables_respect_lexical_scope() {
        assert_eq!(
            compile("$x: 8; s1 { $x: 5; r1: $x; } s2 { r2: $x; }"),
            "s1 {\n    r1: 5;\n}\ns2 {\n    r2: 8;\n}\n"
        );
    }

    #[test]
    fn unit_conversion() {
        assert_eq!(
            compile("p { a: 1px + 1in; b: 99px - 1in; }"),
            "p {\n    a: 97px;\n    b: 3px;\n}\n"
        );
    }

    #[test]
    fn ancestor_reference_fuses() {
        assert_eq!(compile("a { &.b:c {} }"), "a {}\na.b:c {}\n");
    }

    #[test]
    fn import_cycle_is_an_error() {
        let dir = temp_dir("cycle");
        std::fs::write(dir.join("a.css"), "@import \"b.css\";\nx {}").unwrap();
        std::fs::write(dir.join("b.css"), "@import \"a.css\";\ny {}").unwrap();

        let err = Compiler::default()
            .compile_file(&dir.join("a.css"), &dir.join("out.css"))
            .unwrap_err();
        assert!(matches!(err, CssError::CircularImport(_)));
    }

    #[test]
    fn imported_content_is_substituted_in_place() {
        let dir = temp_dir("inline");
        std::fs::write(dir.join("lib.css"), "$w: 10px;\nl { width: $w; }").unwrap();
        std::fs::write(
            dir.join("main.css"),
            "@import \"lib.css\";\nm { width: $w + 5px; }",
        )
        .unwrap();

        let compiler = Compiler::default();
        compiler
            .compile_file(&dir.join("main.css"), &dir.join("out.css"))
            .unwrap();
        let output = std::fs::read_to_string(dir.join("out.css")).unwrap();
        assert_eq!(
            output,
            "l {\n    width: 10px;\n}\nm {\n    width: 15px;\n}\n"
        );
    }

    #[test]
    fn import_bindings_do_not_shadow_the_importer() {
        let dir = temp_dir("shadow");
        std::fs::write(dir.join("lib.css"), "$w: 10px;").unwrap();
        std::fs::write(
            dir.join("main.css"),
            "@import \"lib.css\";\n$w: 1px;\nm { width: $w; }",
        )
        .unwrap();

        let compiler = Compiler::default();
        compiler
            .compile_file(&dir.join("main.css"), &dir.join("out.css"))
            .unwrap();
        let output = std::fs::read_to_string(dir.join("out.css")).unwrap();
        assert_eq!(output, "m {\n    width: 1px;\n}\n");
    }

    #[test]
    fn solve_can_be_disabled() {
        let config = CompilerConfig {
            enable_solve: false,
            ..CompilerConfig::default()
        };
        let output = Compiler::new(config)
            .compile_string("$x: 1;\na { y: $x; }", "<string>")
            .unwrap();
        assert_eq!(output, "$x: 1;\na {\n    y: $x;\n}\n");
    }

    #[test]
    fn flatten_requires_solve() {
        // flattening alone would hit the vardef; gating on solve avoids it
        let config = CompilerConfig {
            enable_solve: false,
            enable_flatten: true,
            ..CompilerConfig::default()
        };
        let output = Compiler::new(config)
            .compile_string("a { $x: 1; b { q: 2; } }", "<string>")
            .unwrap();
        assert!(output.contains("$x: 1;"));
    }

    #[test]
    fn charset_rule_must_match_detected_encoding() {
        // a UTF-16BE file whose charset rule claims utf-8
        let mut bytes = vec![0xFE, 0xFF];
        for c in "@charset \"utf-8\";\na {}".bytes() {
            bytes.push(0);
            bytes.push(c);
        }
        let err = Compiler::default()
            .compile_bytes(&bytes, "<stdin>")
            .unwrap_err();
        assert!(matches!(err, CssError::Runtime(_)));
    }

    #[test]
    fn charset_rule_passes_through_to_output() {
        let out = Compiler::default()
            .compile_bytes(b"@charset \"utf-8\";\na { x: 1; }", "<stdin>")
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "@charset \"utf-8\";\na {\n    x: 1;\n}\n");
    }

    #[test]
    fn dest_encoding_escapes_unrepresentable_output() {
        let config = CompilerConfig {
            dest_encoding: Some("iso-8859-1".to_string()),
            ..CompilerConfig::default()
        };
        let out = Compiler::new(config)
            .compile_bytes("a { content: \"\u{2603}\"; }".as_bytes(), "<stdin>")
            .unwrap();
        let text: String = out.iter().map(|b| *b as char).collect();
        assert!(text.contains("\\002603"), "{text}");
    }

    #[test]
    fn syntax_errors_carry_position() {
        let err = Compiler::default()
            .compile_string("a {\n  x: ;\n}", "style.css")
            .unwrap_err();
        let CssError::Syntax(err) = err else {
            panic!("expected syntax error, got {err:?}");
        };
        assert_eq!(err.filename, "style.css");
        assert_eq!(err.location.line, 2);
    }
}
