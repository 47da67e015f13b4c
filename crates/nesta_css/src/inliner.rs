//! The import inliner.
//!
//! Walks a parsed stylesheet's import list in order and replaces each
//! string-target `@import` with the parsed content of the referenced file.
//! `url(...)` and unresolvable targets are left as-is. The chain of files
//! from the top level down to the current import is kept as an ordered
//! sequence of absolute paths; resolving onto a path already in the
//! sequence is a circular import.

use std::path::{Path, PathBuf};

use nesta_shared::errors::{CssError, CssResult};

use crate::config::CompilerConfig;
use crate::node::{ImportItem, ImportUri, ImportedStylesheet, Stylesheet};
use crate::reader;
use crate::Ncss;

/// A way of turning an import target into a filesystem path. Users can hook
/// additional finders into the compiler; they run after the file-relative
/// lookups and before the configured directory list.
pub trait ImportFinder {
    fn find(&self, filename: &str) -> Option<PathBuf>;
}

/// Resolves targets against a fixed directory
pub struct FileRelativeFinder {
    dir: PathBuf,
}

impl FileRelativeFinder {
    /// Resolves relative to the directory containing `file`
    #[must_use]
    pub fn for_file(file: &Path) -> Self {
        Self {
            dir: file.parent().unwrap_or_else(|| Path::new(".")).to_path_buf(),
        }
    }
}

impl ImportFinder for FileRelativeFinder {
    fn find(&self, filename: &str) -> Option<PathBuf> {
        let candidate = self.dir.join(filename);
        candidate.exists().then_some(candidate)
    }
}

/// Tries each directory of a configured list in order
pub struct DirectoryListFinder {
    dirs: Vec<PathBuf>,
}

impl DirectoryListFinder {
    #[must_use]
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }
}

impl ImportFinder for DirectoryListFinder {
    fn find(&self, filename: &str) -> Option<PathBuf> {
        self.dirs.iter().find_map(|dir| {
            let candidate = dir.join(filename);
            candidate.exists().then_some(candidate)
        })
    }
}

pub struct Inliner<'a> {
    config: &'a CompilerConfig,
    finders: &'a [Box<dyn ImportFinder>],
    /// Absolute path of the top-level stylesheet (synthetic for stdin)
    toplevel: PathBuf,
}

impl<'a> Inliner<'a> {
    #[must_use]
    pub fn new(
        config: &'a CompilerConfig,
        finders: &'a [Box<dyn ImportFinder>],
        toplevel: PathBuf,
    ) -> Self {
        Self {
            config,
            finders,
            toplevel,
        }
    }

    pub fn run(&self, sheet: &mut Stylesheet) -> CssResult<()> {
        let sequence = vec![self.toplevel.clone()];
        self.inline_imports(&mut sheet.imports, &sequence)
    }

    fn inline_imports(&self, imports: &mut Vec<ImportItem>, sequence: &[PathBuf]) -> CssResult<()> {
        for item in imports.iter_mut() {
            let ImportItem::Plain(import) = item else {
                continue;
            };
            let ImportUri::Str(target) = &import.uri else {
                // url(...) imports are passed through untouched
                continue;
            };
            let filename = target.value.clone();
            let location = import.location;

            let importing = sequence.last().cloned().unwrap_or_else(|| self.toplevel.clone());
            let Some(path) = self.resolve(&filename, &importing) else {
                log::debug!("unable to import stylesheet, file not found: '{filename}'");
                if self.config.stop_on_import_not_found {
                    return Err(CssError::ImportNotFound(filename));
                }
                continue;
            };

            if sequence.contains(&path) {
                return Err(CssError::CircularImport(filename));
            }

            let mut imported = match self.parse_file(&path) {
                Ok(sheet) => sheet,
                Err(CssError::Syntax(err)) if !self.config.stop_on_import_syntax_error => {
                    log::debug!("skipping import with syntax error: {err}");
                    continue;
                }
                Err(err) => return Err(err),
            };

            let mut next_sequence = sequence.to_vec();
            next_sequence.push(path);
            self.inline_imports(&mut imported.imports, &next_sequence)?;

            *item = ImportItem::Inlined(ImportedStylesheet {
                imports: imported.imports,
                statements: imported.statements,
                location,
            });
        }
        Ok(())
    }

    /// Resolution order: relative to the importing file, relative to the
    /// top-level stylesheet, user finders, then the configured directories.
    fn resolve(&self, filename: &str, importing: &Path) -> Option<PathBuf> {
        if self.config.curfile_relative_imports {
            if let Some(path) = FileRelativeFinder::for_file(importing).find(filename) {
                return std::fs::canonicalize(path).ok();
            }
        }
        if self.config.toplevel_relative_imports {
            if let Some(path) = FileRelativeFinder::for_file(&self.toplevel).find(filename) {
                return std::fs::canonicalize(path).ok();
            }
        }
        for finder in self.finders {
            if let Some(path) = finder.find(filename) {
                return std::fs::canonicalize(path).ok();
            }
        }
        let directories = DirectoryListFinder::new(self.config.import_directories.clone());
        if let Some(path) = directories.find(filename) {
            return std::fs::canonicalize(path).ok();
        }
        None
    }

    /// Imported files parse with the same configuration as the outer parse;
    /// a forced source encoding carries through to them.
    fn parse_file(&self, path: &Path) -> CssResult<Stylesheet> {
        let outcome = reader::read_file(
            path,
            self.config.source_encoding.as_deref(),
            self.config.default_encoding.as_deref(),
        )?;
        Ncss::parse_str(&outcome.text, &path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Statement;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("nesta-inliner-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn inline(config: &CompilerConfig, toplevel: &Path, source: &str) -> CssResult<Stylesheet> {
        let mut sheet = Ncss::parse_str(source, &toplevel.display().to_string())?;
        let finders: Vec<Box<dyn ImportFinder>> = Vec::new();
        Inliner::new(config, &finders, toplevel.to_path_buf()).run(&mut sheet)?;
        Ok(sheet)
    }

    #[test]
    fn inlines_relative_import() {
        let dir = temp_dir("relative");
        write(&dir, "colors.css", "a { color: red; }");
        let top = write(&dir, "main.css", "@import \"colors.css\";\nb {}");

        let source = std::fs::read_to_string(&top).unwrap();
        let sheet = inline(&CompilerConfig::default(), &top, &source).unwrap();

        assert_eq!(sheet.imports.len(), 1);
        let ImportItem::Inlined(imported) = &sheet.imports[0] else {
            panic!("import was not inlined");
        };
        assert_eq!(imported.statements.len(), 1);
        assert!(matches!(imported.statements[0], Statement::RuleSet(_)));
    }

    #[test]
    fn nested_imports_inline_recursively() {
        let dir = temp_dir("nested");
        write(&dir, "inner.css", "i { x: 1; }");
        write(&dir, "middle.css", "@import \"inner.css\";\nm {}");
        let top = write(&dir, "main.css", "@import \"middle.css\";\nt {}");

        let source = std::fs::read_to_string(&top).unwrap();
        let sheet = inline(&CompilerConfig::default(), &top, &source).unwrap();

        let ImportItem::Inlined(middle) = &sheet.imports[0] else {
            panic!("middle import was not inlined");
        };
        let ImportItem::Inlined(inner) = &middle.imports[0] else {
            panic!("inner import was not inlined");
        };
        assert_eq!(inner.statements.len(), 1);
    }

    #[test]
    fn url_imports_pass_through() {
        let dir = temp_dir("url");
        let top = write(&dir, "main.css", "@import url(\"remote.css\");\na {}");

        let source = std::fs::read_to_string(&top).unwrap();
        let sheet = inline(&CompilerConfig::default(), &top, &source).unwrap();

        assert!(matches!(sheet.imports[0], ImportItem::Plain(_)));
    }

    #[test]
    fn missing_import_is_skipped_by_default() {
        let dir = temp_dir("missing");
        let top = write(&dir, "main.css", "@import \"nowhere.css\";\na {}");

        let source = std::fs::read_to_string(&top).unwrap();
        let sheet = inline(&CompilerConfig::default(), &top, &source).unwrap();

        assert!(matches!(sheet.imports[0], ImportItem::Plain(_)));
    }

    #[test]
    fn missing_import_fails_when_configured() {
        let dir = temp_dir("missing-stop");
        let top = write(&dir, "main.css", "@import \"nowhere.css\";\na {}");

        let config = CompilerConfig {
            stop_on_import_not_found: true,
            ..CompilerConfig::default()
        };
        let source = std::fs::read_to_string(&top).unwrap();
        let err = inline(&config, &top, &source).unwrap_err();
        assert!(matches!(err, CssError::ImportNotFound(_)));
    }

    #[test]
    fn circular_import_is_fatal() {
        let dir = temp_dir("cycle");
        write(&dir, "a.css", "@import \"b.css\";\nx {}");
        write(&dir, "b.css", "@import \"a.css\";\ny {}");
        let top = dir.join("a.css");

        let source = std::fs::read_to_string(&top).unwrap();
        let err = inline(&CompilerConfig::default(), &top, &source).unwrap_err();
        assert!(matches!(err, CssError::CircularImport(_)));
    }

    #[test]
    fn self_import_is_circular() {
        let dir = temp_dir("self");
        let top = write(&dir, "a.css", "@import \"a.css\";\nx {}");

        let source = std::fs::read_to_string(&top).unwrap();
        let err = inline(&CompilerConfig::default(), &top, &source).unwrap_err();
        assert!(matches!(err, CssError::CircularImport(_)));
    }

    #[test]
    fn import_syntax_error_propagates_by_default() {
        let dir = temp_dir("syntax");
        write(&dir, "broken.css", "a { x: ; }");
        let top = write(&dir, "main.css", "@import \"broken.css\";");

        let source = std::fs::read_to_string(&top).unwrap();
        let err = inline(&CompilerConfig::default(), &top, &source).unwrap_err();
        assert!(matches!(err, CssError::Syntax(_)));
    }

    #[test]
    fn import_syntax_error_can_be_demoted() {
        let dir = temp_dir("syntax-skip");
        write(&dir, "broken.css", "a { x: ; }");
        let top = write(&dir, "main.css", "@import \"broken.css\";");

        let config = CompilerConfig {
            stop_on_import_syntax_error: false,
            ..CompilerConfig::default()
        };
        let source = std::fs::read_to_string(&top).unwrap();
        let sheet = inline(&config, &top, &source).unwrap();
        assert!(matches!(sheet.imports[0], ImportItem::Plain(_)));
    }

    #[test]
    fn directory_list_finder_is_the_last_resort() {
        let import_dir = temp_dir("libdir");
        write(&import_dir, "lib.css", "l { x: 1; }");
        let dir = temp_dir("libmain");
        let top = write(&dir, "main.css", "@import \"lib.css\";");

        let config = CompilerConfig {
            import_directories: vec![import_dir],
            ..CompilerConfig::default()
        };
        let source = std::fs::read_to_string(&top).unwrap();
        let sheet = inline(&config, &top, &source).unwrap();
        assert!(matches!(sheet.imports[0], ImportItem::Inlined(_)));
    }

    #[test]
    fn user_finders_run_before_directories() {
        struct Fixed(PathBuf);
        impl ImportFinder for Fixed {
            fn find(&self, _filename: &str) -> Option<PathBuf> {
                Some(self.0.clone())
            }
        }

        let dir = temp_dir("finder");
        let fixed = write(&dir, "fixed.css", "f { x: 1; }");
        let top = write(&dir, "main.css", "@import \"anything-at-all.css\";");

        let mut sheet =
            Ncss::parse_str(&std::fs::read_to_string(&top).unwrap(), "main.css").unwrap();
        let config = CompilerConfig::default();
        let finders: Vec<Box<dyn ImportFinder>> = vec![Box::new(Fixed(fixed))];
        Inliner::new(&config, &finders, top.clone())
            .run(&mut sheet)
            .unwrap();

        assert!(matches!(sheet.imports[0], ImportItem::Inlined(_)));
    }
}
