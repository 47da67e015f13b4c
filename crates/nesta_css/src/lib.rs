//! Nesta CSS dialect compiler: standard CSS plus lexically scoped variables,
//! nested rulesets, unit-aware arithmetic, and `@import` inlining.
//!
//! The pipeline is strictly linear: parse, inline imports, solve, flatten,
//! emit. Each pass leaves a semantically complete tree, so every pass can be
//! driven in isolation.

pub mod colors;
pub mod compiler;
pub mod config;
pub mod emitter;
pub mod escape;
pub mod flattener;
pub mod functions;
pub mod inliner;
pub mod node;
pub mod parser;
pub mod reader;
pub mod solver;
pub mod tokenizer;
pub mod units;
pub mod values;
pub mod walker;

use nesta_shared::byte_stream::{ByteStream, Location};
use nesta_shared::errors::CssResult;

use crate::node::Stylesheet;
use crate::tokenizer::Tokenizer;

/// Recursive-descent parser for the dialect. Speculative matching runs on
/// top of the tokenizer's unbounded putback.
pub struct Ncss<'stream> {
    pub tokenizer: Tokenizer<'stream>,
    /// Source name used in diagnostics (filename, url, `<stdin>`, ...)
    filename: String,
    /// Depth of ruleset bodies currently open; the `&` selector is only
    /// legal when this is nonzero
    nested_level: usize,
}

impl<'stream> Ncss<'stream> {
    fn new(stream: &'stream mut ByteStream, filename: &str) -> Self {
        Self {
            tokenizer: Tokenizer::new(stream, Location::default()),
            filename: filename.to_string(),
            nested_level: 0,
        }
    }

    /// Parses a string into a [`Stylesheet`]
    pub fn parse_str(data: &str, filename: &str) -> CssResult<Stylesheet> {
        let mut stream = ByteStream::new();
        stream.read_from_str(data);
        stream.close();

        Ncss::parse_stream(&mut stream, filename)
    }

    /// Parses a character stream into a [`Stylesheet`]
    pub fn parse_stream(stream: &mut ByteStream, filename: &str) -> CssResult<Stylesheet> {
        Ncss::new(stream, filename).parse_stylesheet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::Walker;
    use simple_logger::SimpleLogger;

    /// Manual helper: run with `-- --ignored --nocapture` and point the path
    /// at a stylesheet to see the trace log and the parsed tree.
    #[test]
    #[ignore]
    fn parse_and_dump_a_file() {
        let filename = "../../tests/data/stylesheet.ncss";

        SimpleLogger::new().init().unwrap();

        let data = std::fs::read_to_string(filename).unwrap();
        match Ncss::parse_str(&data, filename) {
            Ok(sheet) => println!("{}", Walker::new(&sheet).walk_to_string()),
            Err(err) => println!("{err}"),
        }
    }
}
