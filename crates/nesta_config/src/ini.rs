//! A small INI reader: `[section]` headers, `key = value` entries, `;` and
//! `#` comment lines. Section and key names are case-insensitive.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IniError {
    #[error("line {0}: expected 'key = value'")]
    BadLine(usize),
    #[error("line {0}: unterminated section header")]
    BadSection(usize),
    #[error("line {0}: entry outside of any section")]
    OrphanEntry(usize),
}

pub type Sections = HashMap<String, HashMap<String, String>>;

pub fn parse(text: &str) -> Result<Sections, IniError> {
    let mut sections = Sections::new();
    let mut current: Option<String> = None;

    for (index, raw) in text.lines().enumerate() {
        let lineno = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let Some(name) = rest.strip_suffix(']') else {
                return Err(IniError::BadSection(lineno));
            };
            let name = name.trim().to_ascii_lowercase();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(IniError::BadLine(lineno));
        };
        let Some(section) = &current else {
            return Err(IniError::OrphanEntry(lineno));
        };
        if let Some(entries) = sections.get_mut(section) {
            entries.insert(
                key.trim().to_ascii_lowercase(),
                value.trim().to_string(),
            );
        }
    }

    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_and_entries() {
        let sections = parse(
            "; a comment\n\
             [Nesta]\n\
             enable_imports = no\n\
             # another comment\n\
             Import_Directories = a, b\n\
             [other]\n\
             x = 1\n",
        )
        .unwrap();

        let nesta = &sections["nesta"];
        assert_eq!(nesta["enable_imports"], "no");
        assert_eq!(nesta["import_directories"], "a, b");
        assert_eq!(sections["other"]["x"], "1");
    }

    #[test]
    fn values_keep_inner_spaces() {
        let sections = parse("[s]\nkey =  some value \n").unwrap();
        assert_eq!(sections["s"]["key"], "some value");
    }

    #[test]
    fn bad_lines_are_reported_with_numbers() {
        assert_eq!(parse("[s]\nnonsense\n").unwrap_err(), IniError::BadLine(2));
        assert_eq!(parse("[s\n").unwrap_err(), IniError::BadSection(1));
        assert_eq!(parse("a = 1\n").unwrap_err(), IniError::OrphanEntry(1));
    }
}
