//! SPARQL token types.
//!
//! Tokens are the output of lexical analysis, ready for parsing.
//! Each token carries its source span for precise diagnostics.

use crate::span::SourceSpan;
use std::sync::Arc;

/// A token with its source span.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The token kind
    pub kind: TokenKind,
    /// Source location
    pub span: SourceSpan,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: SourceSpan) -> Self {
        Self { kind, span }
    }

    /// Create a token from a byte range.
    pub fn from_range(kind: TokenKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            span: SourceSpan::new(start, end),
        }
    }

    /// Check if this token is of a specific kind, ignoring payloads.
    pub fn is(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.kind) == std::mem::discriminant(kind)
    }

    /// Check if this is an EOF token.
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

/// Token kinds for the supported SPARQL subset.
///
/// Based on SPARQL 1.1 grammar terminals. Signs are not part of
/// numeric tokens; `-3` lexes as `Minus` followed by `Integer(3)` and
/// the parser folds negation.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// Full IRI: `<http://example.org/>`
    Iri(Arc<str>),

    /// Prefixed name namespace alone: `prefix:` (colon included in source)
    PrefixedNameNs(Arc<str>),

    /// Prefixed name with local part: `prefix:local`
    PrefixedName {
        /// Namespace prefix (without colon)
        prefix: Arc<str>,
        /// Local name
        local: Arc<str>,
    },

    /// Variable: `?name` or `$name` (stored without the sigil)
    Var(Arc<str>),

    /// String literal (unescaped content)
    String(Arc<str>),

    /// Integer literal (unsigned at the lexical level)
    Integer(i64),

    /// Decimal literal (stored as written to preserve the form)
    Decimal(Arc<str>),

    /// Double literal (exponent notation)
    Double(f64),

    /// Language tag without the `@`: `en`, `en-US`
    LangTag(Arc<str>),

    /// Labeled blank node: `_:name`
    BlankNodeLabel(Arc<str>),

    /// Bare word that is not a keyword (candidate function name)
    Ident(Arc<str>),

    // Keywords (case-insensitive in SPARQL)
    KwSelect,
    KwConstruct,
    KwAsk,
    KwWhere,
    KwOptional,
    KwBind,
    KwAs,
    KwUnion,
    KwFilter,
    /// `GROUP` (parser expects `BY` to follow)
    KwGroupBy,
    KwHaving,
    /// `ORDER` (parser expects `BY` to follow)
    KwOrderBy,
    KwBy,
    KwAsc,
    KwDesc,
    KwLimit,
    KwOffset,
    KwDistinct,
    KwReduced,

    // Aggregates
    KwCount,
    KwSum,
    KwMin,
    KwMax,
    KwAvg,
    KwSample,
    KwGroupConcat,
    KwSeparator,

    // Boolean operators
    KwNot,
    KwIn,

    // Built-in functions
    KwBound,
    KwIf,
    KwCoalesce,
    KwIsIri,
    KwIsUri,
    KwIsBlank,
    KwIsLiteral,
    KwIsNumeric,
    KwStr,
    KwLang,
    KwDatatype,
    KwStrlen,
    KwUcase,
    KwLcase,
    KwStrStarts,
    KwStrEnds,
    KwContains,
    KwAbs,

    // Prologue
    KwBase,
    KwPrefix,

    /// `a` keyword (shorthand for rdf:type, lowercase only)
    KwA,

    // Boolean literals (lexed as keywords to avoid prefixed-name ambiguity)
    KwTrue,
    KwFalse,

    // Recognized SPARQL keywords outside the supported subset. Lexed
    // so the parser can point at them with a targeted diagnostic.
    KwValues,
    KwMinusPattern,
    KwGraph,
    KwService,
    KwExists,
    KwDescribe,
    KwFrom,

    // Punctuation / operators
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `^^` (datatype marker)
    DoubleCaret,
    /// `||`
    Or,
    /// `&&`
    And,
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `!`
    Bang,

    /// End of input
    Eof,

    /// Lexer error (includes error message)
    Error(Arc<str>),
}

impl TokenKind {
    /// Check if this token is a keyword.
    pub fn is_keyword(&self) -> bool {
        self.keyword_str().is_some()
    }

    /// Check if this is a literal token.
    ///
    /// Boolean literals (true/false) are lexed as keywords, not as
    /// literals, so they are not included here.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::String(_)
                | TokenKind::Integer(_)
                | TokenKind::Decimal(_)
                | TokenKind::Double(_)
        )
    }

    /// Get the keyword string for error messages (if this is a keyword).
    pub fn keyword_str(&self) -> Option<&'static str> {
        match self {
            TokenKind::KwSelect => Some("SELECT"),
            TokenKind::KwConstruct => Some("CONSTRUCT"),
            TokenKind::KwAsk => Some("ASK"),
            TokenKind::KwWhere => Some("WHERE"),
            TokenKind::KwOptional => Some("OPTIONAL"),
            TokenKind::KwBind => Some("BIND"),
            TokenKind::KwAs => Some("AS"),
            TokenKind::KwUnion => Some("UNION"),
            TokenKind::KwFilter => Some("FILTER"),
            TokenKind::KwGroupBy => Some("GROUP"),
            TokenKind::KwHaving => Some("HAVING"),
            TokenKind::KwOrderBy => Some("ORDER"),
            TokenKind::KwBy => Some("BY"),
            TokenKind::KwAsc => Some("ASC"),
            TokenKind::KwDesc => Some("DESC"),
            TokenKind::KwLimit => Some("LIMIT"),
            TokenKind::KwOffset => Some("OFFSET"),
            TokenKind::KwDistinct => Some("DISTINCT"),
            TokenKind::KwReduced => Some("REDUCED"),
            TokenKind::KwCount => Some("COUNT"),
            TokenKind::KwSum => Some("SUM"),
            TokenKind::KwMin => Some("MIN"),
            TokenKind::KwMax => Some("MAX"),
            TokenKind::KwAvg => Some("AVG"),
            TokenKind::KwSample => Some("SAMPLE"),
            TokenKind::KwGroupConcat => Some("GROUP_CONCAT"),
            TokenKind::KwSeparator => Some("SEPARATOR"),
            TokenKind::KwNot => Some("NOT"),
            TokenKind::KwIn => Some("IN"),
            TokenKind::KwBound => Some("BOUND"),
            TokenKind::KwIf => Some("IF"),
            TokenKind::KwCoalesce => Some("COALESCE"),
            TokenKind::KwIsIri => Some("ISIRI"),
            TokenKind::KwIsUri => Some("ISURI"),
            TokenKind::KwIsBlank => Some("ISBLANK"),
            TokenKind::KwIsLiteral => Some("ISLITERAL"),
            TokenKind::KwIsNumeric => Some("ISNUMERIC"),
            TokenKind::KwStr => Some("STR"),
            TokenKind::KwLang => Some("LANG"),
            TokenKind::KwDatatype => Some("DATATYPE"),
            TokenKind::KwStrlen => Some("STRLEN"),
            TokenKind::KwUcase => Some("UCASE"),
            TokenKind::KwLcase => Some("LCASE"),
            TokenKind::KwStrStarts => Some("STRSTARTS"),
            TokenKind::KwStrEnds => Some("STRENDS"),
            TokenKind::KwContains => Some("CONTAINS"),
            TokenKind::KwAbs => Some("ABS"),
            TokenKind::KwBase => Some("BASE"),
            TokenKind::KwPrefix => Some("PREFIX"),
            TokenKind::KwA => Some("a"),
            TokenKind::KwTrue => Some("true"),
            TokenKind::KwFalse => Some("false"),
            TokenKind::KwValues => Some("VALUES"),
            TokenKind::KwMinusPattern => Some("MINUS"),
            TokenKind::KwGraph => Some("GRAPH"),
            TokenKind::KwService => Some("SERVICE"),
            TokenKind::KwExists => Some("EXISTS"),
            TokenKind::KwDescribe => Some("DESCRIBE"),
            TokenKind::KwFrom => Some("FROM"),
            _ => None,
        }
    }

    /// Whether this keyword is recognized but outside the supported
    /// subset.
    pub fn is_unsupported_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::KwValues
                | TokenKind::KwMinusPattern
                | TokenKind::KwGraph
                | TokenKind::KwService
                | TokenKind::KwExists
                | TokenKind::KwDescribe
                | TokenKind::KwFrom
        )
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Iri(s) => write!(f, "<{}>", s),
            TokenKind::PrefixedNameNs(s) => write!(f, "{}:", s),
            TokenKind::PrefixedName { prefix, local } => write!(f, "{}:{}", prefix, local),
            TokenKind::Var(s) => write!(f, "?{}", s),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
            TokenKind::Integer(n) => write!(f, "{}", n),
            TokenKind::Decimal(s) => write!(f, "{}", s),
            TokenKind::Double(n) => write!(f, "{}", n),
            TokenKind::LangTag(s) => write!(f, "@{}", s),
            TokenKind::BlankNodeLabel(s) => write!(f, "_:{}", s),
            TokenKind::Ident(s) => write!(f, "{}", s),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::DoubleCaret => write!(f, "^^"),
            TokenKind::Or => write!(f, "||"),
            TokenKind::And => write!(f, "&&"),
            TokenKind::Eq => write!(f, "="),
            TokenKind::Ne => write!(f, "!="),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::Le => write!(f, "<="),
            TokenKind::Ge => write!(f, ">="),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Bang => write!(f, "!"),
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Error(s) => write!(f, "error: {}", s),
            k => match k.keyword_str() {
                Some(s) => write!(f, "{}", s),
                None => write!(f, "?"),
            },
        }
    }
}

/// Map a bare word to its keyword token kind (case-insensitive, except
/// `a` which is lowercase only).
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s.to_ascii_uppercase().as_str() {
        "SELECT" => Some(TokenKind::KwSelect),
        "CONSTRUCT" => Some(TokenKind::KwConstruct),
        "ASK" => Some(TokenKind::KwAsk),
        "WHERE" => Some(TokenKind::KwWhere),
        "OPTIONAL" => Some(TokenKind::KwOptional),
        "BIND" => Some(TokenKind::KwBind),
        "AS" => Some(TokenKind::KwAs),
        "UNION" => Some(TokenKind::KwUnion),
        "FILTER" => Some(TokenKind::KwFilter),
        "GROUP" => Some(TokenKind::KwGroupBy), // "GROUP" alone, parser handles "BY"
        "HAVING" => Some(TokenKind::KwHaving),
        "ORDER" => Some(TokenKind::KwOrderBy), // "ORDER" alone, parser handles "BY"
        "BY" => Some(TokenKind::KwBy),
        "ASC" => Some(TokenKind::KwAsc),
        "DESC" => Some(TokenKind::KwDesc),
        "LIMIT" => Some(TokenKind::KwLimit),
        "OFFSET" => Some(TokenKind::KwOffset),
        "DISTINCT" => Some(TokenKind::KwDistinct),
        "REDUCED" => Some(TokenKind::KwReduced),
        "COUNT" => Some(TokenKind::KwCount),
        "SUM" => Some(TokenKind::KwSum),
        "MIN" => Some(TokenKind::KwMin),
        "MAX" => Some(TokenKind::KwMax),
        "AVG" => Some(TokenKind::KwAvg),
        "SAMPLE" => Some(TokenKind::KwSample),
        "GROUP_CONCAT" => Some(TokenKind::KwGroupConcat),
        "SEPARATOR" => Some(TokenKind::KwSeparator),
        "NOT" => Some(TokenKind::KwNot),
        "IN" => Some(TokenKind::KwIn),
        "BOUND" => Some(TokenKind::KwBound),
        "IF" => Some(TokenKind::KwIf),
        "COALESCE" => Some(TokenKind::KwCoalesce),
        "ISIRI" => Some(TokenKind::KwIsIri),
        "ISURI" => Some(TokenKind::KwIsUri),
        "ISBLANK" => Some(TokenKind::KwIsBlank),
        "ISLITERAL" => Some(TokenKind::KwIsLiteral),
        "ISNUMERIC" => Some(TokenKind::KwIsNumeric),
        "STR" => Some(TokenKind::KwStr),
        "LANG" => Some(TokenKind::KwLang),
        "DATATYPE" => Some(TokenKind::KwDatatype),
        "STRLEN" => Some(TokenKind::KwStrlen),
        "UCASE" => Some(TokenKind::KwUcase),
        "LCASE" => Some(TokenKind::KwLcase),
        "STRSTARTS" => Some(TokenKind::KwStrStarts),
        "STRENDS" => Some(TokenKind::KwStrEnds),
        "CONTAINS" => Some(TokenKind::KwContains),
        "ABS" => Some(TokenKind::KwAbs),
        "BASE" => Some(TokenKind::KwBase),
        "PREFIX" => Some(TokenKind::KwPrefix),
        "TRUE" => Some(TokenKind::KwTrue),
        "FALSE" => Some(TokenKind::KwFalse),
        "VALUES" => Some(TokenKind::KwValues),
        "MINUS" => Some(TokenKind::KwMinusPattern),
        "GRAPH" => Some(TokenKind::KwGraph),
        "SERVICE" => Some(TokenKind::KwService),
        "EXISTS" => Some(TokenKind::KwExists),
        "DESCRIBE" => Some(TokenKind::KwDescribe),
        "FROM" => Some(TokenKind::KwFrom),
        // 'a' is only a keyword when lowercase
        _ if s == "a" => Some(TokenKind::KwA),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(keyword_from_str("SELECT"), Some(TokenKind::KwSelect));
        assert_eq!(keyword_from_str("select"), Some(TokenKind::KwSelect));
        assert_eq!(keyword_from_str("SeLeCt"), Some(TokenKind::KwSelect));
        assert_eq!(keyword_from_str("a"), Some(TokenKind::KwA));
        assert_eq!(keyword_from_str("A"), None); // 'a' is case-sensitive
        assert_eq!(keyword_from_str("notakeyword"), None);
    }

    #[test]
    fn test_token_display() {
        assert_eq!(
            format!("{}", TokenKind::Iri(Arc::from("http://example.org/"))),
            "<http://example.org/>"
        );
        assert_eq!(format!("{}", TokenKind::Var(Arc::from("name"))), "?name");
        assert_eq!(format!("{}", TokenKind::KwSelect), "SELECT");
        assert_eq!(format!("{}", TokenKind::KwGroupConcat), "GROUP_CONCAT");
    }

    #[test]
    fn test_discriminant_match_ignores_payload() {
        let a = Token::from_range(TokenKind::Var(Arc::from("x")), 0, 2);
        assert!(a.is(&TokenKind::Var(Arc::from("other"))));
        assert!(!a.is(&TokenKind::KwSelect));
    }

    #[test]
    fn test_unsupported_keywords_are_flagged() {
        assert!(TokenKind::KwValues.is_unsupported_keyword());
        assert!(TokenKind::KwMinusPattern.is_unsupported_keyword());
        assert!(!TokenKind::KwOptional.is_unsupported_keyword());
    }
}
