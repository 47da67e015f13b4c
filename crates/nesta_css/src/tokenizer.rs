//! Tokenizer for the extended CSS dialect.
//!
//! Produces a lazily-built token list over a character stream. The longest
//! match wins; compound tokens (`url(...)`, `:not(`, match operators,
//! dimensions, percentages) are recognized before their prefixes. All
//! produced tokens stay buffered, so consumers get unbounded putback through
//! `tell`/`seek`/`reconsume`.

use std::fmt;

use nesta_shared::byte_stream::Character::{Ch, StreamEnd};
use nesta_shared::byte_stream::{ByteStream, Location, LocationHandler};

#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    /// A run of whitespace, kept verbatim
    Whitespace(String),
    /// A comment including its delimiters
    Comment(String),
    /// An unterminated comment; always a parse error
    BadComment(String),
    Ident(String),
    /// A function opener; the value does not include the `(`
    Function(String),
    /// A complete `url(...)` token, kept verbatim
    Uri(String),
    /// An unterminated or malformed `url(` token; always a parse error
    BadUri(String),
    UnicodeRange(String),
    /// A `$name` variable token; the value does not include the `$`
    VarName(String),
    /// Catch-all at-keyword; the value does not include the `@`
    AtKeyword(String),
    /// The literal `@charset ` (with its trailing space)
    CharsetSym,
    ImportSym,
    /// `@media`, kept verbatim
    MediaSym(String),
    /// `@page`, kept verbatim
    PageSym(String),
    /// `!important`, including any whitespace after the `!`
    ImportantSym(String),
    /// The value does not include the `#` marker
    Hash(String),
    Number(String),
    /// The value does not include the `%` marker
    Percentage(String),
    Dimension { value: String, unit: String },
    /// A string including its quotes
    QuotedString(String),
    /// An unterminated string; always a parse error
    BadString(String),
    Cdo,
    Cdc,
    /// The compound `:not(` opener
    Not,
    /// `~=`
    Includes,
    /// `|=`
    DashMatch,
    /// `^=`
    PrefixMatch,
    /// `$=`
    SuffixMatch,
    /// `*=`
    SubstringMatch,
    Colon,
    Semicolon,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Plus,
    Minus,
    Star,
    FwdSlash,
    Pipe,
    Caret,
    Tilde,
    Exclamation,
    Equal,
    Ampersand,
    LessThan,
    GreaterThan,
    Unknown(char),
    Eof,
}

impl TokenType {
    /// Token kind name as it appears in diagnostics
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::Whitespace(_) => "WS",
            TokenType::Comment(_) => "COMMENT",
            TokenType::BadComment(_) => "BADCOMMENT",
            TokenType::Ident(_) => "IDENT",
            TokenType::Function(_) => "FUNCTION",
            TokenType::Uri(_) => "URI",
            TokenType::BadUri(_) => "BADURI",
            TokenType::UnicodeRange(_) => "UNICODE_RANGE",
            TokenType::VarName(_) => "VARNAME",
            TokenType::AtKeyword(_) => "ATKEYWORD_OTHER",
            TokenType::CharsetSym => "CHARSET_SYM",
            TokenType::ImportSym => "IMPORT_SYM",
            TokenType::MediaSym(_) => "MEDIA_SYM",
            TokenType::PageSym(_) => "PAGE_SYM",
            TokenType::ImportantSym(_) => "IMPORTANT_SYM",
            TokenType::Hash(_) => "HASH",
            TokenType::Number(_) => "NUMBER",
            TokenType::Percentage(_) => "PERCENTAGE",
            TokenType::Dimension { .. } => "DIMENSION",
            TokenType::QuotedString(_) => "STRING",
            TokenType::BadString(_) => "BADSTRING",
            TokenType::Cdo => "CDO",
            TokenType::Cdc => "CDC",
            TokenType::Not => "NOT",
            TokenType::Includes => "INCLUDES",
            TokenType::DashMatch => "DASHMATCH",
            TokenType::PrefixMatch => "PREFIXMATCH",
            TokenType::SuffixMatch => "SUFFIXMATCH",
            TokenType::SubstringMatch => "SUBSTRINGMATCH",
            TokenType::Colon => "COLON",
            TokenType::Semicolon => "SEMICOLON",
            TokenType::LBrace => "LBRACE",
            TokenType::RBrace => "RBRACE",
            TokenType::LParen => "LPAREN",
            TokenType::RParen => "RPAREN",
            TokenType::LBracket => "LSQBRACKET",
            TokenType::RBracket => "RSQBRACKET",
            TokenType::Comma => "COMMA",
            TokenType::Dot => "DOT",
            TokenType::Plus => "PLUS",
            TokenType::Minus => "MINUS",
            TokenType::Star => "STAR",
            TokenType::FwdSlash => "FWDSLASH",
            TokenType::Pipe => "PIPE",
            TokenType::Caret => "CARET",
            TokenType::Tilde => "TILDE",
            TokenType::Exclamation => "EXCLAMATION",
            TokenType::Equal => "EQUAL",
            TokenType::Ampersand => "AMPERSAND",
            TokenType::LessThan => "LESSTHAN",
            TokenType::GreaterThan => "GREATERTHAN",
            TokenType::Unknown(_) => "UNKNOWN",
            TokenType::Eof => "EOF",
        }
    }
}

/// A token with its 1-based source location
#[derive(Clone, PartialEq, Debug)]
pub struct Token {
    pub token_type: TokenType,
    pub location: Location,
}

impl Token {
    fn new(token_type: TokenType, location: Location) -> Token {
        Token { token_type, location }
    }

    #[must_use]
    pub fn is_whitespace(&self) -> bool {
        matches!(self.token_type, TokenType::Whitespace(_))
    }

    #[must_use]
    pub fn is_ident(&self) -> bool {
        matches!(self.token_type, TokenType::Ident(_))
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self.token_type, TokenType::QuotedString(_))
    }

    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self.token_type, TokenType::Eof)
    }
}

impl fmt::Display for Token {
    /// Reconstructs the verbatim source text of the token
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string = match &self.token_type {
            TokenType::Whitespace(val)
            | TokenType::Comment(val)
            | TokenType::BadComment(val)
            | TokenType::Ident(val)
            | TokenType::Uri(val)
            | TokenType::BadUri(val)
            | TokenType::UnicodeRange(val)
            | TokenType::MediaSym(val)
            | TokenType::PageSym(val)
            | TokenType::ImportantSym(val)
            | TokenType::Number(val)
            | TokenType::QuotedString(val)
            | TokenType::BadString(val) => val.clone(),
            TokenType::Function(val) => format!("{val}("),
            TokenType::VarName(val) => format!("${val}"),
            TokenType::AtKeyword(val) => format!("@{val}"),
            TokenType::CharsetSym => "@charset ".into(),
            TokenType::ImportSym => "@import".into(),
            TokenType::Hash(val) => format!("#{val}"),
            TokenType::Percentage(val) => format!("{val}%"),
            TokenType::Dimension { value, unit } => format!("{value}{unit}"),
            TokenType::Cdo => "<!--".into(),
            TokenType::Cdc => "-->".into(),
            TokenType::Not => ":not(".into(),
            TokenType::Includes => "~=".into(),
            TokenType::DashMatch => "|=".into(),
            TokenType::PrefixMatch => "^=".into(),
            TokenType::SuffixMatch => "$=".into(),
            TokenType::SubstringMatch => "*=".into(),
            TokenType::Colon => ":".into(),
            TokenType::Semicolon => ";".into(),
            TokenType::LBrace => "{".into(),
            TokenType::RBrace => "}".into(),
            TokenType::LParen => "(".into(),
            TokenType::RParen => ")".into(),
            TokenType::LBracket => "[".into(),
            TokenType::RBracket => "]".into(),
            TokenType::Comma => ",".into(),
            TokenType::Dot => ".".into(),
            TokenType::Plus => "+".into(),
            TokenType::Minus => "-".into(),
            TokenType::Star => "*".into(),
            TokenType::FwdSlash => "/".into(),
            TokenType::Pipe => "|".into(),
            TokenType::Caret => "^".into(),
            TokenType::Tilde => "~".into(),
            TokenType::Exclamation => "!".into(),
            TokenType::Equal => "=".into(),
            TokenType::Ampersand => "&".into(),
            TokenType::LessThan => "<".into(),
            TokenType::GreaterThan => ">".into(),
            TokenType::Unknown(c) => c.to_string(),
            TokenType::Eof => String::new(),
        };

        write!(f, "{string}")
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c >= '\u{00A0}'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c >= '\u{00A0}'
}

fn is_url_char(c: char) -> bool {
    matches!(c, '!' | '#' | '$' | '%' | '&' | '*'..='[' | ']'..='~') || c >= '\u{00A0}'
}

pub struct Tokenizer<'stream> {
    stream: &'stream mut ByteStream,
    /// Position of the NEXT token to consume
    position: usize,
    /// Every token produced so far; earlier positions stay addressable so the
    /// parser can rewind arbitrarily far
    tokens: Vec<Token>,
    location: LocationHandler,
    ignore_comments: bool,
}

impl<'stream> Tokenizer<'stream> {
    pub fn new(stream: &'stream mut ByteStream, start_location: Location) -> Self {
        Self {
            stream,
            position: 0,
            tokens: Vec::new(),
            location: LocationHandler::new(start_location),
            ignore_comments: true,
        }
    }

    /// Makes comment tokens visible to the consumer instead of skipping them
    pub fn keep_comments(&mut self) {
        self.ignore_comments = false;
    }

    /// Location of the next character that will be consumed
    #[must_use]
    pub fn current_location(&self) -> Location {
        self.location.cur_location()
    }

    /// Returns true when the next token is the end-of-file sentinel
    pub fn eof(&mut self) -> bool {
        self.lookahead(0).is_eof()
    }

    /// Looks at the token `offset` positions ahead without consuming it
    pub fn lookahead(&mut self, offset: usize) -> Token {
        while self.tokens.len() <= self.position + offset {
            self.produce();
        }
        self.tokens[self.position + offset].clone()
    }

    /// Consumes the next token and returns it
    pub fn consume(&mut self) -> Token {
        if self.tokens.len() == self.position {
            self.produce();
        }
        let token = self.tokens[self.position].clone();
        self.position += 1;

        log::trace!("{:?}", token);

        token
    }

    /// Pushes the last consumed token back so the next read returns it again
    pub fn reconsume(&mut self) {
        if self.position > 0 {
            self.position -= 1;
        }
    }

    /// Current cursor position, for later [`Tokenizer::seek`]
    #[must_use]
    pub fn tell(&self) -> usize {
        self.position
    }

    /// Rewinds (or advances within the buffer) to a previously observed
    /// position. This is the unbounded putback the parser's speculative
    /// matching builds on.
    pub fn seek(&mut self, position: usize) {
        debug_assert!(position <= self.tokens.len());
        self.position = position;
    }

    /// The verbatim source text of the tokens in `start..end`
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.tokens[start..end.min(self.tokens.len())]
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn produce(&mut self) {
        loop {
            let token = self.consume_token();
            if self.ignore_comments && matches!(token.token_type, TokenType::Comment(_)) {
                continue;
            }
            self.tokens.push(token);
            break;
        }
    }

    fn current_char(&self) -> nesta_shared::byte_stream::Character {
        self.stream.read()
    }

    fn next_char(&mut self) -> nesta_shared::byte_stream::Character {
        let c = self.stream.next();
        self.location.inc(c);
        c
    }

    fn look_ahead(&self, offset: usize) -> nesta_shared::byte_stream::Character {
        self.stream.look_ahead(offset)
    }

    fn look_ahead_slice(&self, len: usize) -> String {
        let mut s = String::new();
        for i in 0..len {
            match self.stream.look_ahead(i) {
                Ch(c) => s.push(c),
                StreamEnd => break,
            }
        }
        s
    }

    /// True when an escape sequence starts at the given offset
    fn is_escape_start(&self, offset: usize) -> bool {
        self.look_ahead(offset) == Ch('\\')
            && matches!(self.look_ahead(offset + 1), Ch(c) if !matches!(c, '\n' | '\r' | '\x0c'))
    }

    /// True when an identifier starts at the given offset (a leading `-` is
    /// allowed before the start character)
    fn starts_ident(&self, offset: usize) -> bool {
        let offset = if self.look_ahead(offset) == Ch('-') {
            offset + 1
        } else {
            offset
        };
        matches!(self.look_ahead(offset), Ch(c) if is_name_start(c)) || self.is_escape_start(offset)
    }

    fn consume_token(&mut self) -> Token {
        let loc = self.current_location();

        let current = match self.current_char() {
            StreamEnd => return Token::new(TokenType::Eof, loc),
            Ch(c) => c,
        };

        match current {
            c if matches!(c, ' ' | '\t' | '\r' | '\n' | '\x0c') => {
                let mut value = String::new();
                while self.current_char().is_css_whitespace() {
                    value.push(self.next_char().into());
                }
                Token::new(TokenType::Whitespace(value), loc)
            }
            '"' | '\'' => self.consume_string_token(loc),
            '/' => {
                if self.look_ahead(1) == Ch('*') {
                    return self.consume_comment_token(loc);
                }
                self.next_char();
                Token::new(TokenType::FwdSlash, loc)
            }
            '@' => self.consume_at_token(loc),
            '#' => {
                if matches!(self.look_ahead(1), Ch(c) if is_name_char(c)) || self.is_escape_start(1)
                {
                    self.next_char();
                    let name = self.consume_name();
                    return Token::new(TokenType::Hash(name), loc);
                }
                self.next_char();
                Token::new(TokenType::Unknown('#'), loc)
            }
            c if c.is_ascii_digit() => self.consume_numeric_token(loc),
            '.' => {
                if self.look_ahead(1).is_numeric() {
                    return self.consume_numeric_token(loc);
                }
                self.next_char();
                Token::new(TokenType::Dot, loc)
            }
            ':' => {
                if self.look_ahead_slice(5).eq_ignore_ascii_case(":not(") {
                    for _ in 0..5 {
                        self.next_char();
                    }
                    return Token::new(TokenType::Not, loc);
                }
                self.next_char();
                Token::new(TokenType::Colon, loc)
            }
            ';' => self.punctuator(TokenType::Semicolon, loc),
            '{' => self.punctuator(TokenType::LBrace, loc),
            '}' => self.punctuator(TokenType::RBrace, loc),
            '(' => self.punctuator(TokenType::LParen, loc),
            ')' => self.punctuator(TokenType::RParen, loc),
            '[' => self.punctuator(TokenType::LBracket, loc),
            ']' => self.punctuator(TokenType::RBracket, loc),
            ',' => self.punctuator(TokenType::Comma, loc),
            '!' => self.consume_important_token(loc),
            '~' => self.maybe_match_op(TokenType::Includes, TokenType::Tilde, loc),
            '|' => self.maybe_match_op(TokenType::DashMatch, TokenType::Pipe, loc),
            '^' => self.maybe_match_op(TokenType::PrefixMatch, TokenType::Caret, loc),
            '*' => self.maybe_match_op(TokenType::SubstringMatch, TokenType::Star, loc),
            '$' => {
                if self.starts_ident(1) {
                    self.next_char();
                    let name = self.consume_name();
                    return Token::new(TokenType::VarName(name), loc);
                }
                if self.look_ahead(1) == Ch('=') {
                    self.next_char();
                    self.next_char();
                    return Token::new(TokenType::SuffixMatch, loc);
                }
                self.next_char();
                Token::new(TokenType::Unknown('$'), loc)
            }
            '<' => {
                if self.look_ahead_slice(4) == "<!--" {
                    for _ in 0..4 {
                        self.next_char();
                    }
                    return Token::new(TokenType::Cdo, loc);
                }
                self.next_char();
                Token::new(TokenType::LessThan, loc)
            }
            '-' => {
                if self.look_ahead_slice(3) == "-->" {
                    for _ in 0..3 {
                        self.next_char();
                    }
                    return Token::new(TokenType::Cdc, loc);
                }
                if self.starts_ident(0) {
                    return self.consume_ident_like_token(loc);
                }
                self.next_char();
                Token::new(TokenType::Minus, loc)
            }
            '+' => self.punctuator(TokenType::Plus, loc),
            '=' => self.punctuator(TokenType::Equal, loc),
            '&' => self.punctuator(TokenType::Ampersand, loc),
            '>' => self.punctuator(TokenType::GreaterThan, loc),
            'u' | 'U'
                if self.look_ahead(1) == Ch('+')
                    && matches!(self.look_ahead(2), Ch(c) if c.is_ascii_hexdigit() || c == '?') =>
            {
                self.consume_unicode_range_token(loc)
            }
            c if is_name_start(c) => self.consume_ident_like_token(loc),
            '\\' if self.is_escape_start(0) => self.consume_ident_like_token(loc),
            c => {
                self.next_char();
                Token::new(TokenType::Unknown(c), loc)
            }
        }
    }

    fn punctuator(&mut self, token_type: TokenType, loc: Location) -> Token {
        self.next_char();
        Token::new(token_type, loc)
    }

    /// Emits the compound operator when the next character is `=`, otherwise
    /// the single-character fallback
    fn maybe_match_op(&mut self, compound: TokenType, single: TokenType, loc: Location) -> Token {
        self.next_char();
        if self.current_char() == Ch('=') {
            self.next_char();
            return Token::new(compound, loc);
        }
        Token::new(single, loc)
    }

    /// Consumes a run of name characters and escapes, keeping escapes
    /// verbatim; unescaping happens in the AST constructors
    fn consume_name(&mut self) -> String {
        let mut value = String::new();

        loop {
            match self.current_char() {
                Ch(c) if is_name_char(c) => {
                    value.push(self.next_char().into());
                }
                Ch('\\') if self.is_escape_start(0) => {
                    value.push(self.next_char().into());
                    if self.current_char().is_hex_digit() {
                        let mut count = 0;
                        while count < 6 && self.current_char().is_hex_digit() {
                            value.push(self.next_char().into());
                            count += 1;
                        }
                        // one whitespace terminates a hex escape (CRLF as one)
                        if self.current_char() == Ch('\r') {
                            value.push(self.next_char().into());
                            if self.current_char() == Ch('\n') {
                                value.push(self.next_char().into());
                            }
                        } else if self.current_char().is_css_whitespace() {
                            value.push(self.next_char().into());
                        }
                    } else {
                        value.push(self.next_char().into());
                    }
                }
                _ => break,
            }
        }

        value
    }

    fn consume_ident_like_token(&mut self, loc: Location) -> Token {
        let value = self.consume_name();

        if value == "url" && self.current_char() == Ch('(') {
            return self.consume_uri_token(loc, value);
        }
        if self.current_char() == Ch('(') {
            self.next_char();
            return Token::new(TokenType::Function(value), loc);
        }

        Token::new(TokenType::Ident(value), loc)
    }

    fn consume_numeric_token(&mut self, loc: Location) -> Token {
        let mut value = String::new();
        while self.current_char().is_numeric() {
            value.push(self.next_char().into());
        }
        if self.current_char() == Ch('.') && self.look_ahead(1).is_numeric() {
            value.push(self.next_char().into());
            while self.current_char().is_numeric() {
                value.push(self.next_char().into());
            }
        }

        if self.starts_ident(0) {
            let unit = self.consume_name();
            return Token::new(TokenType::Dimension { value, unit }, loc);
        }
        if self.current_char() == Ch('%') {
            self.next_char();
            return Token::new(TokenType::Percentage(value), loc);
        }

        Token::new(TokenType::Number(value), loc)
    }

    /// Consumes a quoted string into `text`. Returns false when the string is
    /// unterminated (newline or end of stream before the closing quote).
    fn consume_string_raw(&mut self, text: &mut String) -> bool {
        let ending = self.next_char();
        text.push(ending.into());

        loop {
            match self.current_char() {
                StreamEnd => return false,
                c if c == ending => {
                    text.push(self.next_char().into());
                    return true;
                }
                Ch('\n' | '\r' | '\x0c') => {
                    // the newline is not part of the bad string
                    return false;
                }
                Ch('\\') => match self.look_ahead(1) {
                    StreamEnd => {
                        text.push(self.next_char().into());
                        return false;
                    }
                    Ch('\r') => {
                        text.push(self.next_char().into());
                        text.push(self.next_char().into());
                        if self.current_char() == Ch('\n') {
                            text.push(self.next_char().into());
                        }
                    }
                    Ch(_) => {
                        text.push(self.next_char().into());
                        text.push(self.next_char().into());
                    }
                },
                Ch(_) => {
                    text.push(self.next_char().into());
                }
            }
        }
    }

    fn consume_string_token(&mut self, loc: Location) -> Token {
        let mut text = String::new();
        if self.consume_string_raw(&mut text) {
            Token::new(TokenType::QuotedString(text), loc)
        } else {
            Token::new(TokenType::BadString(text), loc)
        }
    }

    fn consume_comment_token(&mut self, loc: Location) -> Token {
        let mut text = String::new();
        text.push(self.next_char().into());
        text.push(self.next_char().into());

        loop {
            if self.look_ahead_slice(2) == "*/" {
                text.push(self.next_char().into());
                text.push(self.next_char().into());
                return Token::new(TokenType::Comment(text), loc);
            }
            match self.current_char() {
                StreamEnd => return Token::new(TokenType::BadComment(text), loc),
                _ => text.push(self.next_char().into()),
            }
        }
    }

    fn consume_uri_token(&mut self, loc: Location, ident: String) -> Token {
        let mut text = ident;
        text.push(self.next_char().into()); // '('

        while self.current_char().is_css_whitespace() {
            text.push(self.next_char().into());
        }

        match self.current_char() {
            Ch('"' | '\'') => {
                if !self.consume_string_raw(&mut text) {
                    return Token::new(TokenType::BadUri(text), loc);
                }
            }
            _ => loop {
                match self.current_char() {
                    Ch(c) if is_url_char(c) => {
                        text.push(self.next_char().into());
                    }
                    Ch('\\') if self.is_escape_start(0) => {
                        text.push(self.next_char().into());
                        text.push(self.next_char().into());
                    }
                    _ => break,
                }
            },
        }

        while self.current_char().is_css_whitespace() {
            text.push(self.next_char().into());
        }

        if self.current_char() == Ch(')') {
            text.push(self.next_char().into());
            return Token::new(TokenType::Uri(text), loc);
        }

        Token::new(TokenType::BadUri(text), loc)
    }

    fn consume_at_token(&mut self, loc: Location) -> Token {
        if self.look_ahead_slice(9) == "@charset " {
            for _ in 0..9 {
                self.next_char();
            }
            return Token::new(TokenType::CharsetSym, loc);
        }

        for (keyword, len) in [("@import", 7), ("@media", 6), ("@page", 5)] {
            let slice = self.look_ahead_slice(len);
            let boundary = !matches!(
                self.look_ahead(len),
                Ch(c) if c.is_ascii_alphanumeric() || c == '_'
            );
            if slice.eq_ignore_ascii_case(keyword) && boundary {
                for _ in 0..len {
                    self.next_char();
                }
                return match keyword {
                    "@import" => Token::new(TokenType::ImportSym, loc),
                    "@media" => Token::new(TokenType::MediaSym(slice), loc),
                    _ => Token::new(TokenType::PageSym(slice), loc),
                };
            }
        }

        self.next_char(); // '@'
        if self.starts_ident(0) {
            let name = self.consume_name();
            return Token::new(TokenType::AtKeyword(name), loc);
        }

        Token::new(TokenType::Unknown('@'), loc)
    }

    fn consume_important_token(&mut self, loc: Location) -> Token {
        let mut n = 1;
        while self.look_ahead(n).is_css_whitespace() {
            n += 1;
        }
        let mut word = String::new();
        for i in 0..9 {
            match self.look_ahead(n + i) {
                Ch(c) => word.push(c),
                StreamEnd => break,
            }
        }
        let boundary = !matches!(
            self.look_ahead(n + 9),
            Ch(c) if c.is_ascii_alphanumeric() || c == '_'
        );

        if word.eq_ignore_ascii_case("important") && boundary {
            let mut text = String::new();
            for _ in 0..(n + 9) {
                text.push(self.next_char().into());
            }
            return Token::new(TokenType::ImportantSym(text), loc);
        }

        self.next_char();
        Token::new(TokenType::Exclamation, loc)
    }

    fn consume_unicode_range_token(&mut self, loc: Location) -> Token {
        let mut text = String::new();
        text.push(self.next_char().into()); // 'u' or 'U'
        text.push(self.next_char().into()); // '+'

        let mut count = 0;
        while count < 6 {
            match self.current_char() {
                Ch(c) if c.is_ascii_hexdigit() || c == '?' => {
                    text.push(self.next_char().into());
                    count += 1;
                }
                _ => break,
            }
        }

        if self.current_char() == Ch('-') && self.look_ahead(1).is_hex_digit() {
            text.push(self.next_char().into());
            let mut count = 0;
            while count < 6 && self.current_char().is_hex_digit() {
                text.push(self.next_char().into());
                count += 1;
            }
        }

        Token::new(TokenType::UnicodeRange(text), loc)
    }
}
