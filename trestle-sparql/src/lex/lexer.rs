//! SPARQL lexer implementation using winnow.
//!
//! Tokenizes query text into a stream of tokens with source spans.
//! The lexer never fails: invalid input becomes `TokenKind::Error`
//! tokens carrying a message, which the parser surfaces as
//! diagnostics.
//!
//! Signs are never folded into numbers; `-3` lexes as `Minus` then
//! `Integer(3)` so that `?price-3` stays an arithmetic expression.
//! When `<` opens something that never closes with `>`, it lexes as
//! the less-than operator and the parser reports the leftovers.

use std::sync::Arc;

use tracing::debug;
use winnow::ascii::digit1;
use winnow::combinator::{alt, delimited, opt, peek, preceded};
use winnow::error::ContextError;
use winnow::stream::{AsChar, Location, Stream};
use winnow::token::{any, one_of, take_till, take_while};
use winnow::{LocatingSlice, ModalResult, Parser};

use super::token::{keyword_from_str, Token, TokenKind};
use crate::span::SourceSpan;

/// Input type for the lexer - tracks position for spans.
pub type Input<'a> = LocatingSlice<&'a str>;

/// Lexer for SPARQL queries.
pub struct Lexer<'a> {
    input: &'a str,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// Tokenize the entire input.
    ///
    /// Always produces a token stream ending in `Eof`. Unrecognized
    /// input is represented as `Error` tokens rather than aborting,
    /// so diagnostics can point at the precise spot.
    pub fn tokenize(self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut input = LocatingSlice::new(self.input);

        loop {
            skip_ws_and_comments(&mut input);

            if input.is_empty() {
                let pos = input.current_token_start();
                tokens.push(Token::new(TokenKind::Eof, SourceSpan::point(pos)));
                break;
            }

            let start = input.current_token_start();

            match next_token(&mut input) {
                Ok(kind) => {
                    let end = input.current_token_start();
                    tokens.push(Token::from_range(kind, start, end));
                }
                Err(_) => {
                    let message = recover_bad_token(&mut input);
                    let end = input.current_token_start();
                    tokens.push(Token::from_range(
                        TokenKind::Error(Arc::from(message)),
                        start,
                        end,
                    ));
                }
            }
        }

        debug!(tokens = tokens.len(), "lexed query text");
        tokens
    }
}

/// Tokenize a SPARQL query string.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}

/// Describe the character no parser accepted, and consume past it so
/// lexing can continue. Unterminated strings swallow the rest of the
/// line to avoid a cascade of bogus tokens.
fn recover_bad_token(input: &mut Input<'_>) -> String {
    let bad_char = input.chars().next().unwrap_or('?');

    if bad_char == '"' || bad_char == '\'' {
        let _: ModalResult<&str, ContextError> =
            take_till(0.., |c| c == '\n' || c == '\r').parse_next(input);
        return "unterminated string literal".to_string();
    }

    let _: ModalResult<char, ContextError> = any.parse_next(input);
    if !bad_char.is_ascii() && !is_pn_chars_base(bad_char) {
        format!(
            "unexpected character '{}' (U+{:04X})",
            bad_char.escape_unicode(),
            bad_char as u32
        )
    } else {
        format!("unexpected character '{}'", bad_char)
    }
}

/// Skip whitespace and `#` comments.
fn skip_ws_and_comments(input: &mut Input<'_>) {
    loop {
        let _: ModalResult<&str, ContextError> = take_while(0.., is_ws).parse_next(input);

        if input.starts_with('#') {
            let _: ModalResult<&str, ContextError> =
                take_till(0.., |c| c == '\n' || c == '\r').parse_next(input);
            let _: ModalResult<Option<char>, ContextError> =
                opt(one_of(['\n', '\r'])).parse_next(input);
        } else {
            break;
        }
    }
}

/// Parse the next token.
fn next_token(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    alt((
        // `^^` before `^` would matter if `^` were a token; it is not,
        // but the datatype marker must still come before comparisons.
        parse_double_caret,
        // IRIs (backtracks to comparison operators on failure)
        parse_iri_ref,
        // Multi-char operators (before their single-char prefixes)
        parse_multichar_op,
        // Blank nodes (before bare words; `_` is not a word start)
        parse_blank_node_label,
        // Variables
        parse_var,
        // Language tags
        parse_lang_tag,
        // Default-namespace prefixed names (`:name` or `:`)
        parse_default_prefix,
        // Bare words: keywords, prefixed names, or identifiers
        parse_word,
        // String literals
        parse_string_literal,
        // Numbers (unsigned; signs are operators)
        parse_number,
        // Single-char punctuation and operators
        parse_punctuation,
    ))
    .parse_next(input)
}

// =============================================================================
// IRI Parsing
// =============================================================================

/// Parse an IRI reference: `<...>`
fn parse_iri_ref(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    delimited('<', parse_iri_content, '>')
        .map(|s: String| TokenKind::Iri(Arc::from(s)))
        .parse_next(input)
}

/// Parse the content inside an IRI (validates characters and handles
/// `\u`/`\U` escapes).
fn parse_iri_content(input: &mut Input<'_>) -> ModalResult<String> {
    let mut result = String::new();

    loop {
        let chunk: &str = take_while(0.., is_iri_char).parse_next(input)?;
        result.push_str(chunk);

        if input.is_empty() || input.starts_with('>') {
            break;
        }

        if input.starts_with('\\') {
            '\\'.parse_next(input)?;
            match parse_unicode_escape(input)? {
                Some(c) => result.push(c),
                None => return Err(backtrack()),
            }
        } else {
            return Err(backtrack());
        }
    }

    // Empty IRIs are allowed (relative reference to BASE)
    Ok(result)
}

/// Parse a Unicode escape sequence (`\uXXXX` or `\UXXXXXXXX`), after
/// the backslash.
fn parse_unicode_escape(input: &mut Input<'_>) -> ModalResult<Option<char>> {
    if input.starts_with('u') {
        'u'.parse_next(input)?;
        let hex: &str = take_while(4..=4, AsChar::is_hex_digit).parse_next(input)?;
        let code = u32::from_str_radix(hex, 16).unwrap_or(0xFFFD);
        Ok(char::from_u32(code))
    } else if input.starts_with('U') {
        'U'.parse_next(input)?;
        let hex: &str = take_while(8..=8, AsChar::is_hex_digit).parse_next(input)?;
        let code = u32::from_str_radix(hex, 16).unwrap_or(0xFFFD);
        Ok(char::from_u32(code))
    } else {
        Ok(None)
    }
}

// =============================================================================
// Variables and Language Tags
// =============================================================================

/// Parse a variable: `?name` or `$name`.
fn parse_var(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    preceded(
        one_of(['?', '$']),
        (
            take_while(1, is_varname_start),
            take_while(0.., is_varname_char),
        )
            .take(),
    )
    .map(|name: &str| TokenKind::Var(Arc::from(name)))
    .parse_next(input)
}

/// Parse a language tag: `@en`, `@en-US`.
fn parse_lang_tag(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    '@'.parse_next(input)?;

    let mut tag = String::new();
    let primary: &str = take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)?;
    tag.push_str(primary);

    while input.starts_with('-') {
        '-'.parse_next(input)?;
        let sub: &str = take_while(1.., |c: char| c.is_ascii_alphanumeric()).parse_next(input)?;
        tag.push('-');
        tag.push_str(sub);
    }

    Ok(TokenKind::LangTag(Arc::from(tag)))
}

// =============================================================================
// Prefixed Names, Keywords, and Identifiers
// =============================================================================

/// Parse a default prefix name (`:local`) or bare default namespace (`:`).
fn parse_default_prefix(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    ':'.parse_next(input)?;

    let local = opt(parse_pn_local).parse_next(input)?;

    match local {
        Some(local) => Ok(TokenKind::PrefixedName {
            prefix: Arc::from(""),
            local: Arc::from(local.as_str()),
        }),
        None => Ok(TokenKind::PrefixedNameNs(Arc::from(""))),
    }
}

/// Parse a bare word: a prefixed name when followed by `:`, otherwise
/// a keyword, otherwise an identifier (candidate function name).
fn parse_word(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let first_char = input.chars().next().ok_or_else(backtrack)?;
    if !is_pn_chars_base(first_char) {
        return Err(backtrack());
    }

    let mut word = String::new();
    let c: char = any.parse_next(input)?;
    word.push(c);

    loop {
        let chunk: &str = take_while(0.., is_pn_chars).parse_next(input)?;
        word.push_str(chunk);

        // Dots are allowed inside a prefix name but never at its end.
        if input.starts_with('.') {
            let rest = &input.as_ref()[1..];
            if rest.chars().next().is_some_and(is_pn_chars) {
                '.'.parse_next(input)?;
                word.push('.');
                continue;
            }
        }
        break;
    }

    if peek(opt(':')).parse_next(input)?.is_some() {
        ':'.parse_next(input)?;
        let local = opt(parse_pn_local).parse_next(input)?;
        return Ok(match local {
            Some(local) => TokenKind::PrefixedName {
                prefix: Arc::from(word.as_str()),
                local: Arc::from(local.as_str()),
            },
            None => TokenKind::PrefixedNameNs(Arc::from(word.as_str())),
        });
    }

    match keyword_from_str(&word) {
        Some(kw) => Ok(kw),
        None => Ok(TokenKind::Ident(Arc::from(word.as_str()))),
    }
}

/// Parse a local name (after the colon in a prefixed name).
fn parse_pn_local(input: &mut Input<'_>) -> ModalResult<String> {
    let first_char = input.chars().next().ok_or_else(backtrack)?;
    if !is_pn_local_start(first_char) && first_char != '%' && first_char != '\\' {
        return Err(backtrack());
    }

    let mut result = String::new();

    loop {
        let chunk: &str =
            take_while(0.., |c: char| is_pn_chars(c) || c == ':').parse_next(input)?;
        result.push_str(chunk);

        if input.is_empty() {
            break;
        }

        if input.starts_with('.') {
            let rest = &input.as_ref()[1..];
            let continues = rest
                .chars()
                .next()
                .is_some_and(|c| is_pn_chars(c) || c == ':' || c == '%' || c == '\\');
            if continues {
                '.'.parse_next(input)?;
                result.push('.');
                continue;
            }
            break;
        }

        if input.starts_with('%') {
            '%'.parse_next(input)?;
            let hex: &str = take_while(2..=2, AsChar::is_hex_digit).parse_next(input)?;
            result.push('%');
            result.push_str(hex);
        } else if input.starts_with('\\') {
            '\\'.parse_next(input)?;
            let escaped: char = any.parse_next(input)?;
            if "_~.-!$&'()*+,;=/?#@%".contains(escaped) {
                result.push(escaped);
            } else {
                return Err(backtrack());
            }
        } else {
            break;
        }
    }

    if result.is_empty() {
        return Err(backtrack());
    }

    Ok(result)
}

// =============================================================================
// Blank Nodes
// =============================================================================

/// Parse a blank node label: `_:name`
fn parse_blank_node_label(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    preceded("_:", parse_blank_node_name)
        .map(|name: &str| TokenKind::BlankNodeLabel(Arc::from(name)))
        .parse_next(input)
}

fn parse_blank_node_name<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    let result: &str = (
        take_while(1, |c: char| is_pn_chars_u(c) || c.is_ascii_digit()),
        take_while(0.., |c: char| is_pn_chars(c) || c == '.'),
    )
        .take()
        .parse_next(input)?;

    if result.ends_with('.') {
        return Err(backtrack());
    }

    Ok(result)
}

// =============================================================================
// String Literals
// =============================================================================

/// Parse a string literal (single or double quotes, short or long).
fn parse_string_literal(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    alt((
        parse_long_string::<'"'>,
        parse_long_string::<'\''>,
        parse_short_string::<'"'>,
        parse_short_string::<'\''>,
    ))
    .parse_next(input)
}

/// Parse a short string: `"..."` or `'...'`, no raw newlines.
fn parse_short_string<const QUOTE: char>(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    QUOTE.parse_next(input)?;

    let mut result = String::new();
    loop {
        let chunk: &str =
            take_while(0.., |c| c != QUOTE && c != '\\' && c != '\n' && c != '\r')
                .parse_next(input)?;
        result.push_str(chunk);

        if input.is_empty() || input.starts_with(QUOTE) {
            break;
        }

        if input.starts_with('\\') {
            '\\'.parse_next(input)?;
            let escaped = parse_escape_char(input)?;
            result.push(escaped);
        } else {
            // Raw newline in a short string
            return Err(backtrack());
        }
    }

    QUOTE.parse_next(input)?;
    Ok(TokenKind::String(Arc::from(result)))
}

/// Parse a long string: `"""..."""` or `'''...'''`, newlines allowed.
fn parse_long_string<const QUOTE: char>(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let mut delim = if QUOTE == '"' { "\"\"\"" } else { "'''" };
    delim.parse_next(input)?;

    let mut result = String::new();
    loop {
        let chunk: &str = take_while(0.., |c| c != QUOTE && c != '\\').parse_next(input)?;
        result.push_str(chunk);

        if input.is_empty() || input.starts_with(delim) {
            break;
        }

        if input.starts_with('\\') {
            '\\'.parse_next(input)?;
            let escaped = parse_escape_char(input)?;
            result.push(escaped);
        } else if input.starts_with(QUOTE) {
            let c: char = any.parse_next(input)?;
            result.push(c);
        } else {
            break;
        }
    }

    delim.parse_next(input)?;
    Ok(TokenKind::String(Arc::from(result)))
}

/// Parse one escape sequence after a backslash.
fn parse_escape_char(input: &mut Input<'_>) -> ModalResult<char> {
    let c: char = any.parse_next(input)?;
    match c {
        't' => Ok('\t'),
        'b' => Ok('\x08'),
        'n' => Ok('\n'),
        'r' => Ok('\r'),
        'f' => Ok('\x0C'),
        '"' => Ok('"'),
        '\'' => Ok('\''),
        '\\' => Ok('\\'),
        'u' => {
            let hex: &str = take_while(4..=4, AsChar::is_hex_digit).parse_next(input)?;
            let code = u32::from_str_radix(hex, 16).map_err(|_| backtrack())?;
            char::from_u32(code).ok_or_else(backtrack)
        }
        'U' => {
            let hex: &str = take_while(8..=8, AsChar::is_hex_digit).parse_next(input)?;
            let code = u32::from_str_radix(hex, 16).map_err(|_| backtrack())?;
            char::from_u32(code).ok_or_else(backtrack)
        }
        _ => Err(backtrack()),
    }
}

// =============================================================================
// Numbers
// =============================================================================

/// Parse an unsigned number. Sign characters are separate operator
/// tokens folded by the parser.
fn parse_number(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    alt((parse_double, parse_decimal, parse_integer)).parse_next(input)
}

fn parse_integer(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let digits: &str = digit1.parse_next(input)?;

    // Exponent or fraction digits mean this is a double or decimal.
    if peek(opt(one_of(['e', 'E']))).parse_next(input)?.is_some() {
        return Err(backtrack());
    }
    if input.starts_with('.') {
        let rest = &input.as_ref()[1..];
        if rest.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return Err(backtrack());
        }
    }

    let value = digits.parse::<i64>().map_err(|_| backtrack())?;
    Ok(TokenKind::Integer(value))
}

fn parse_decimal(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let text: &str = (digit1, '.', digit1).take().parse_next(input)?;

    if peek(opt(one_of(['e', 'E']))).parse_next(input)?.is_some() {
        return Err(backtrack());
    }

    Ok(TokenKind::Decimal(Arc::from(text)))
}

fn parse_double(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let text: &str = (
        alt(((digit1, '.', opt(digit1)).take(), ('.', digit1).take(), digit1)),
        one_of(['e', 'E']),
        opt(one_of(['+', '-'])),
        digit1,
    )
        .take()
        .parse_next(input)?;

    let value = text.parse::<f64>().map_err(|_| backtrack())?;
    Ok(TokenKind::Double(value))
}

// =============================================================================
// Operators and Punctuation
// =============================================================================

fn parse_double_caret(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    "^^".map(|_| TokenKind::DoubleCaret).parse_next(input)
}

fn parse_multichar_op(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    alt((
        "<=".map(|_| TokenKind::Le),
        ">=".map(|_| TokenKind::Ge),
        "!=".map(|_| TokenKind::Ne),
        "&&".map(|_| TokenKind::And),
        "||".map(|_| TokenKind::Or),
    ))
    .parse_next(input)
}

fn parse_punctuation(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    any.verify_map(|c| match c {
        '{' => Some(TokenKind::LBrace),
        '}' => Some(TokenKind::RBrace),
        '(' => Some(TokenKind::LParen),
        ')' => Some(TokenKind::RParen),
        '.' => Some(TokenKind::Dot),
        ',' => Some(TokenKind::Comma),
        ';' => Some(TokenKind::Semicolon),
        '=' => Some(TokenKind::Eq),
        '<' => Some(TokenKind::Lt),
        '>' => Some(TokenKind::Gt),
        '+' => Some(TokenKind::Plus),
        '-' => Some(TokenKind::Minus),
        '*' => Some(TokenKind::Star),
        '/' => Some(TokenKind::Slash),
        '!' => Some(TokenKind::Bang),
        _ => None,
    })
    .parse_next(input)
}

fn backtrack() -> winnow::error::ErrMode<ContextError> {
    winnow::error::ErrMode::Backtrack(ContextError::new())
}

// =============================================================================
// Character Classes (SPARQL 1.1 terminals)
// =============================================================================

fn is_ws(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_pn_chars_base(c: char) -> bool {
    matches!(c,
        'A'..='Z'
        | 'a'..='z'
        | '\u{00C0}'..='\u{00D6}'
        | '\u{00D8}'..='\u{00F6}'
        | '\u{00F8}'..='\u{02FF}'
        | '\u{0370}'..='\u{037D}'
        | '\u{037F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

fn is_pn_chars_u(c: char) -> bool {
    is_pn_chars_base(c) || c == '_'
}

fn is_pn_chars(c: char) -> bool {
    is_pn_chars_u(c)
        || matches!(c,
            '-' | '0'..='9' | '\u{00B7}' | '\u{0300}'..='\u{036F}' | '\u{203F}'..='\u{2040}')
}

fn is_pn_local_start(c: char) -> bool {
    is_pn_chars_u(c) || c.is_ascii_digit()
}

fn is_varname_start(c: char) -> bool {
    is_pn_chars_u(c) || c.is_ascii_digit()
}

fn is_varname_char(c: char) -> bool {
    is_pn_chars_u(c)
        || c.is_ascii_digit()
        || matches!(c, '\u{00B7}' | '\u{0300}'..='\u{036F}' | '\u{203F}'..='\u{2040}')
}

fn is_iri_char(c: char) -> bool {
    !matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\') && c > '\u{0020}'
}
