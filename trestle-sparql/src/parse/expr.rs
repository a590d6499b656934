//! SPARQL expression parsing.
//!
//! This module implements expression parsing with proper operator
//! precedence.
//!
//! ## Precedence (lowest to highest)
//!
//! 1. `||` (OR)
//! 2. `&&` (AND)
//! 3. `=`, `!=`, `<`, `<=`, `>`, `>=`, `IN`, `NOT IN`
//! 4. `+`, `-` (additive)
//! 5. `*`, `/` (multiplicative)
//! 6. `+`, `-`, `!` (unary)
//! 7. Primary expressions (literals, variables, calls, parenthesized)

use crate::ast::expr::{AggregateFunction, BinaryOp, Expression, FunctionName, UnaryOp};
use crate::ast::term::{Iri, IriValue, Literal, Var};
use crate::diag::{DiagCode, Diagnostic};
use crate::lex::TokenKind;
use crate::parse::stream::TokenStream;
use crate::span::SourceSpan;
use std::sync::Arc;

/// An expression parse failure, carrying enough to build a diagnostic.
#[derive(Debug)]
pub struct ExprError {
    pub message: String,
    pub code: DiagCode,
    pub span: SourceSpan,
    pub help: Option<String>,
}

impl ExprError {
    fn new(message: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            message: message.into(),
            code: DiagCode::ExpectedToken,
            span,
            help: None,
        }
    }

    fn with_code(mut self, code: DiagCode) -> Self {
        self.code = code;
        self
    }

    fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Convert into a renderable diagnostic.
    pub fn into_diagnostic(self) -> Diagnostic {
        let diag = Diagnostic::error(self.code, self.message, self.span);
        match self.help {
            Some(help) => diag.with_help(help),
            None => diag,
        }
    }
}

type ExprResult = Result<Expression, ExprError>;

/// Parse a SPARQL expression.
///
/// This is the main entry point for expression parsing.
pub fn parse_expression(tokens: &mut TokenStream) -> ExprResult {
    parse_or_expr(tokens)
}

/// Parse an OR expression: expr1 || expr2
fn parse_or_expr(tokens: &mut TokenStream) -> ExprResult {
    let start = tokens.current_span().start;
    let mut left = parse_and_expr(tokens)?;

    while tokens.check(&TokenKind::Or) {
        tokens.advance();
        let right = parse_and_expr(tokens)?;
        let span = SourceSpan::new(start, tokens.previous_span().end);
        left = Expression::binary(BinaryOp::Or, left, right, span);
    }

    Ok(left)
}

/// Parse an AND expression: expr1 && expr2
fn parse_and_expr(tokens: &mut TokenStream) -> ExprResult {
    let start = tokens.current_span().start;
    let mut left = parse_relational_expr(tokens)?;

    while tokens.check(&TokenKind::And) {
        tokens.advance();
        let right = parse_relational_expr(tokens)?;
        let span = SourceSpan::new(start, tokens.previous_span().end);
        left = Expression::binary(BinaryOp::And, left, right, span);
    }

    Ok(left)
}

/// Parse a relational expression: =, !=, <, <=, >, >=, IN, NOT IN
fn parse_relational_expr(tokens: &mut TokenStream) -> ExprResult {
    let start = tokens.current_span().start;
    let mut left = parse_additive_expr(tokens)?;

    loop {
        let op = match tokens.peek().kind {
            TokenKind::Eq => Some(BinaryOp::Eq),
            TokenKind::Ne => Some(BinaryOp::Ne),
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::Le => Some(BinaryOp::Le),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::Ge => Some(BinaryOp::Ge),
            _ => None,
        };

        if let Some(op) = op {
            tokens.advance();
            let right = parse_additive_expr(tokens)?;
            let span = SourceSpan::new(start, tokens.previous_span().end);
            left = Expression::binary(op, left, right, span);
        } else if tokens.check_keyword(TokenKind::KwIn) {
            tokens.advance();
            let list = parse_expression_list(tokens, "IN")?;
            let span = SourceSpan::new(start, tokens.previous_span().end);
            left = Expression::In {
                expr: Box::new(left),
                list,
                negated: false,
                span,
            };
        } else if tokens.check_keyword(TokenKind::KwNot) {
            let saved_pos = tokens.position();
            tokens.advance();
            if tokens.check_keyword(TokenKind::KwIn) {
                tokens.advance();
                let list = parse_expression_list(tokens, "NOT IN")?;
                let span = SourceSpan::new(start, tokens.previous_span().end);
                left = Expression::In {
                    expr: Box::new(left),
                    list,
                    negated: true,
                    span,
                };
            } else {
                // This NOT belongs to something else
                tokens.restore(saved_pos);
                break;
            }
        } else {
            break;
        }
    }

    Ok(left)
}

/// Parse an additive expression: +, -
fn parse_additive_expr(tokens: &mut TokenStream) -> ExprResult {
    let start = tokens.current_span().start;
    let mut left = parse_multiplicative_expr(tokens)?;

    loop {
        let op = match tokens.peek().kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        };

        match op {
            Some(op) => {
                tokens.advance();
                let right = parse_multiplicative_expr(tokens)?;
                let span = SourceSpan::new(start, tokens.previous_span().end);
                left = Expression::binary(op, left, right, span);
            }
            None => break,
        }
    }

    Ok(left)
}

/// Parse a multiplicative expression: *, /
fn parse_multiplicative_expr(tokens: &mut TokenStream) -> ExprResult {
    let start = tokens.current_span().start;
    let mut left = parse_unary_expr(tokens)?;

    loop {
        let op = match tokens.peek().kind {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            _ => None,
        };

        match op {
            Some(op) => {
                tokens.advance();
                let right = parse_unary_expr(tokens)?;
                let span = SourceSpan::new(start, tokens.previous_span().end);
                left = Expression::binary(op, left, right, span);
            }
            None => break,
        }
    }

    Ok(left)
}

/// Parse a unary expression: !, +, -
fn parse_unary_expr(tokens: &mut TokenStream) -> ExprResult {
    let start = tokens.current_span().start;

    let op = match tokens.peek().kind {
        TokenKind::Bang => Some(UnaryOp::Not),
        TokenKind::Plus => Some(UnaryOp::Pos),
        TokenKind::Minus => Some(UnaryOp::Neg),
        _ => None,
    };

    match op {
        Some(op) => {
            tokens.advance();
            let operand = parse_unary_expr(tokens)?;
            let span = SourceSpan::new(start, tokens.previous_span().end);
            Ok(Expression::unary(op, operand, span))
        }
        None => parse_primary_expr(tokens),
    }
}

/// Parse a primary expression.
fn parse_primary_expr(tokens: &mut TokenStream) -> ExprResult {
    let start = tokens.current_span().start;

    // Parenthesized expression
    if tokens.check(&TokenKind::LParen) {
        tokens.advance();
        let inner = parse_expression(tokens)?;
        if !tokens.check(&TokenKind::RParen) {
            return Err(ExprError::new("expected ')'", tokens.current_span()));
        }
        tokens.advance();
        let span = SourceSpan::new(start, tokens.previous_span().end);
        return Ok(Expression::Bracketed {
            inner: Box::new(inner),
            span,
        });
    }

    // Variable
    if let Some((name, var_span)) = tokens.consume_var() {
        return Ok(Expression::Var(Var::new(name, var_span)));
    }

    // Literals
    if let Some(expr) = try_parse_literal(tokens)? {
        return Ok(expr);
    }

    // Keywords: BOUND, IF, COALESCE, aggregates, built-in functions
    if let Some(expr) = try_parse_keyword_expr(tokens)? {
        return Ok(expr);
    }

    // Full IRI: a custom aggregate call when followed by '(', a plain
    // IRI term otherwise
    if let Some((iri_str, iri_span)) = tokens.consume_iri() {
        let iri = Iri::full(iri_str, iri_span);
        if tokens.check(&TokenKind::LParen) {
            return parse_aggregate_body(tokens, AggregateFunction::Custom(iri), start);
        }
        return Ok(Expression::Iri(iri));
    }

    // Prefixed name, same treatment
    if let Some((prefix, local, pn_span)) = tokens.consume_prefixed_name() {
        let iri = Iri {
            value: IriValue::Prefixed { prefix, local },
            span: pn_span,
        };
        if tokens.check(&TokenKind::LParen) {
            return parse_aggregate_body(tokens, AggregateFunction::Custom(iri), start);
        }
        return Ok(Expression::Iri(iri));
    }

    // Bare namespace like `ex:`
    if let Some((prefix, ns_span)) = tokens.consume_prefixed_name_ns() {
        let iri = Iri {
            value: IriValue::Prefixed {
                prefix,
                local: Arc::from(""),
            },
            span: ns_span,
        };
        if tokens.check(&TokenKind::LParen) {
            return parse_aggregate_body(tokens, AggregateFunction::Custom(iri), start);
        }
        return Ok(Expression::Iri(iri));
    }

    // A bare word followed by '(' is a function call we do not know
    if let TokenKind::Ident(name) = &tokens.peek().kind {
        if tokens.peek_n(1).is(&TokenKind::LParen) {
            let name = name.clone();
            let span = tokens.current_span();
            return Err(ExprError::new(
                format!("unknown function `{}`", name),
                span,
            )
            .with_code(DiagCode::UnknownFunction)
            .with_help("function names are case-insensitive; custom aggregates must be called by IRI"));
        }
    }

    Err(ExprError::new("expected expression", tokens.current_span()))
}

/// Try to parse a literal expression.
fn try_parse_literal(tokens: &mut TokenStream) -> Result<Option<Expression>, ExprError> {
    // Integer literal
    if let Some((value, span)) = tokens.consume_integer() {
        return Ok(Some(Expression::Literal(Literal::integer(value, span))));
    }

    // Decimal literal
    if let Some((value, span)) = tokens.consume_decimal() {
        return Ok(Some(Expression::Literal(Literal::decimal(value, span))));
    }

    // Double literal
    if let Some((value, span)) = tokens.consume_double() {
        return Ok(Some(Expression::Literal(Literal::double(value, span))));
    }

    // String literal (with possible language tag or datatype)
    if let Some((value, span)) = tokens.consume_string() {
        if let Some((lang, lang_span)) = tokens.consume_lang_tag() {
            let full_span = SourceSpan::new(span.start, lang_span.end);
            return Ok(Some(Expression::Literal(Literal::lang_string(
                value, lang, full_span,
            ))));
        }

        if tokens.check(&TokenKind::DoubleCaret) {
            tokens.advance();
            let datatype = parse_datatype_iri(tokens)?;
            let full_span = SourceSpan::new(span.start, datatype.span.end);
            return Ok(Some(Expression::Literal(Literal::typed(
                value, datatype, full_span,
            ))));
        }

        return Ok(Some(Expression::Literal(Literal::string(value, span))));
    }

    // Boolean literal
    if tokens.check_keyword(TokenKind::KwTrue) {
        let span = tokens.current_span();
        tokens.advance();
        return Ok(Some(Expression::Literal(Literal::boolean(true, span))));
    }
    if tokens.check_keyword(TokenKind::KwFalse) {
        let span = tokens.current_span();
        tokens.advance();
        return Ok(Some(Expression::Literal(Literal::boolean(false, span))));
    }

    Ok(None)
}

/// Parse the IRI after `^^`.
fn parse_datatype_iri(tokens: &mut TokenStream) -> Result<Iri, ExprError> {
    if let Some((iri, span)) = tokens.consume_iri() {
        return Ok(Iri::full(iri, span));
    }
    if let Some((prefix, local, span)) = tokens.consume_prefixed_name() {
        return Ok(Iri {
            value: IriValue::Prefixed { prefix, local },
            span,
        });
    }
    Err(ExprError::new(
        "expected datatype IRI after '^^'",
        tokens.current_span(),
    ))
}

/// Try to parse a keyword-based expression (BOUND, IF, aggregates, ...).
fn try_parse_keyword_expr(tokens: &mut TokenStream) -> Result<Option<Expression>, ExprError> {
    let start = tokens.current_span().start;

    // EXISTS / NOT EXISTS are recognized so they can be rejected with
    // a useful message
    if tokens.check_keyword(TokenKind::KwExists) {
        return Err(unsupported_in_expr("EXISTS", tokens.current_span()));
    }
    if tokens.check_keyword(TokenKind::KwNot) {
        let saved_pos = tokens.position();
        tokens.advance();
        if tokens.check_keyword(TokenKind::KwExists) {
            let span = SourceSpan::new(start, tokens.current_span().end);
            return Err(unsupported_in_expr("NOT EXISTS", span));
        }
        tokens.restore(saved_pos);
        return Ok(None);
    }

    // BOUND(?var)
    if tokens.check_keyword(TokenKind::KwBound) {
        tokens.advance();
        if !tokens.match_token(&TokenKind::LParen) {
            return Err(ExprError::new(
                "expected '(' after BOUND",
                tokens.current_span(),
            ));
        }
        let Some((name, var_span)) = tokens.consume_var() else {
            return Err(ExprError::new(
                "BOUND takes a single variable argument",
                tokens.current_span(),
            ));
        };
        if !tokens.match_token(&TokenKind::RParen) {
            return Err(ExprError::new(
                "expected ')' after BOUND(?var",
                tokens.current_span(),
            ));
        }
        let span = SourceSpan::new(start, tokens.previous_span().end);
        return Ok(Some(Expression::FunctionCall {
            name: FunctionName::Bound,
            args: vec![Expression::Var(Var::new(name, var_span))],
            span,
        }));
    }

    // IF(cond, then, else)
    if tokens.check_keyword(TokenKind::KwIf) {
        tokens.advance();
        if !tokens.match_token(&TokenKind::LParen) {
            return Err(ExprError::new(
                "expected '(' after IF",
                tokens.current_span(),
            ));
        }
        let condition = parse_expression(tokens)?;
        if !tokens.match_token(&TokenKind::Comma) {
            return Err(ExprError::new(
                "expected ',' in IF expression",
                tokens.current_span(),
            ));
        }
        let then_expr = parse_expression(tokens)?;
        if !tokens.match_token(&TokenKind::Comma) {
            return Err(ExprError::new(
                "expected ',' in IF expression",
                tokens.current_span(),
            ));
        }
        let else_expr = parse_expression(tokens)?;
        if !tokens.match_token(&TokenKind::RParen) {
            return Err(ExprError::new(
                "expected ')' after IF expression",
                tokens.current_span(),
            ));
        }
        let span = SourceSpan::new(start, tokens.previous_span().end);
        return Ok(Some(Expression::If {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
            span,
        }));
    }

    // COALESCE(expr, expr, ...)
    if tokens.check_keyword(TokenKind::KwCoalesce) {
        tokens.advance();
        let args = parse_expression_list(tokens, "COALESCE")?;
        if args.is_empty() {
            let span = SourceSpan::new(start, tokens.previous_span().end);
            return Err(ExprError::new(
                "COALESCE requires at least one argument",
                span,
            ));
        }
        let span = SourceSpan::new(start, tokens.previous_span().end);
        return Ok(Some(Expression::Coalesce { args, span }));
    }

    // Aggregates: COUNT, SUM, AVG, MIN, MAX, GROUP_CONCAT, SAMPLE
    if let Some(agg) = check_aggregate_keyword(tokens) {
        tokens.advance();
        return parse_aggregate_body(tokens, agg, start).map(Some);
    }

    // Built-in functions lexed as keywords
    if let Some(func_name) = check_builtin_function_keyword(tokens) {
        tokens.advance();
        let args = parse_expression_list(tokens, func_name.as_str())?;
        let span = SourceSpan::new(start, tokens.previous_span().end);
        if args.len() != func_name.arity() {
            return Err(ExprError::new(
                format!(
                    "{} takes {} argument{}, found {}",
                    func_name.as_str(),
                    func_name.arity(),
                    if func_name.arity() == 1 { "" } else { "s" },
                    args.len()
                ),
                span,
            ));
        }
        return Ok(Some(Expression::FunctionCall {
            name: func_name,
            args,
            span,
        }));
    }

    Ok(None)
}

fn unsupported_in_expr(what: &str, span: SourceSpan) -> ExprError {
    ExprError::new(format!("{} is not supported", what), span)
        .with_code(DiagCode::UnsupportedFeature)
        .with_help("supported filter constructs: comparisons, arithmetic, IN, and the built-in functions")
}

/// Check if current token is an aggregate keyword.
fn check_aggregate_keyword(tokens: &TokenStream) -> Option<AggregateFunction> {
    match tokens.peek().kind {
        TokenKind::KwCount => Some(AggregateFunction::Count),
        TokenKind::KwSum => Some(AggregateFunction::Sum),
        TokenKind::KwAvg => Some(AggregateFunction::Avg),
        TokenKind::KwMin => Some(AggregateFunction::Min),
        TokenKind::KwMax => Some(AggregateFunction::Max),
        TokenKind::KwGroupConcat => Some(AggregateFunction::GroupConcat),
        TokenKind::KwSample => Some(AggregateFunction::Sample),
        _ => None,
    }
}

/// Check if current token is a built-in function keyword.
fn check_builtin_function_keyword(tokens: &TokenStream) -> Option<FunctionName> {
    match tokens.peek().kind {
        TokenKind::KwIsIri => Some(FunctionName::IsIri),
        TokenKind::KwIsUri => Some(FunctionName::IsUri),
        TokenKind::KwIsBlank => Some(FunctionName::IsBlank),
        TokenKind::KwIsLiteral => Some(FunctionName::IsLiteral),
        TokenKind::KwIsNumeric => Some(FunctionName::IsNumeric),
        TokenKind::KwStr => Some(FunctionName::Str),
        TokenKind::KwLang => Some(FunctionName::Lang),
        TokenKind::KwDatatype => Some(FunctionName::Datatype),
        TokenKind::KwStrlen => Some(FunctionName::Strlen),
        TokenKind::KwUcase => Some(FunctionName::Ucase),
        TokenKind::KwLcase => Some(FunctionName::Lcase),
        TokenKind::KwContains => Some(FunctionName::Contains),
        TokenKind::KwStrStarts => Some(FunctionName::StrStarts),
        TokenKind::KwStrEnds => Some(FunctionName::StrEnds),
        TokenKind::KwAbs => Some(FunctionName::Abs),
        _ => None,
    }
}

/// Parse the parenthesized body of an aggregate call.
///
/// The aggregate name (keyword or IRI) has already been consumed.
/// Syntax: `( [DISTINCT] (expr | *) [; SEPARATOR = "..."] )`
fn parse_aggregate_body(
    tokens: &mut TokenStream,
    function: AggregateFunction,
    start: usize,
) -> ExprResult {
    if !tokens.match_token(&TokenKind::LParen) {
        return Err(ExprError::new(
            format!("expected '(' after {}", function.as_str()),
            tokens.current_span(),
        ));
    }

    let distinct = tokens.match_keyword(TokenKind::KwDistinct);

    let expr = if tokens.check(&TokenKind::Star) {
        let star_span = tokens.current_span();
        tokens.advance();
        if function != AggregateFunction::Count {
            return Err(ExprError::new(
                format!("only COUNT may aggregate over '*', not {}", function.as_str()),
                star_span,
            ));
        }
        None
    } else {
        Some(Box::new(parse_expression(tokens)?))
    };

    // GROUP_CONCAT takes an optional separator
    let separator = if tokens.check(&TokenKind::Semicolon) {
        let semi_span = tokens.current_span();
        if function != AggregateFunction::GroupConcat {
            return Err(ExprError::new(
                "only GROUP_CONCAT takes a SEPARATOR",
                semi_span,
            ));
        }
        tokens.advance();
        if !tokens.match_keyword(TokenKind::KwSeparator) {
            return Err(ExprError::new(
                "expected SEPARATOR after ';' in GROUP_CONCAT",
                tokens.current_span(),
            ));
        }
        if !tokens.match_token(&TokenKind::Eq) {
            return Err(ExprError::new(
                "expected '=' after SEPARATOR",
                tokens.current_span(),
            ));
        }
        match tokens.consume_string() {
            Some((sep_value, _)) => Some(sep_value),
            None => {
                return Err(ExprError::new(
                    "expected string after SEPARATOR =",
                    tokens.current_span(),
                ));
            }
        }
    } else {
        None
    };

    if !tokens.match_token(&TokenKind::RParen) {
        return Err(ExprError::new(
            format!("expected ')' after {} expression", function.as_str()),
            tokens.current_span(),
        ));
    }

    let span = SourceSpan::new(start, tokens.previous_span().end);
    Ok(Expression::Aggregate {
        function,
        expr,
        distinct,
        separator,
        span,
    })
}

/// Parse a parenthesized expression list: (expr, expr, ...)
fn parse_expression_list(
    tokens: &mut TokenStream,
    context: &str,
) -> Result<Vec<Expression>, ExprError> {
    if !tokens.match_token(&TokenKind::LParen) {
        return Err(ExprError::new(
            format!("expected '(' after {}", context),
            tokens.current_span(),
        ));
    }

    let mut args = Vec::new();

    if !tokens.check(&TokenKind::RParen) {
        args.push(parse_expression(tokens)?);
        while tokens.match_token(&TokenKind::Comma) {
            args.push(parse_expression(tokens)?);
        }
    }

    if !tokens.match_token(&TokenKind::RParen) {
        return Err(ExprError::new(
            format!("expected ')' after {} arguments", context),
            tokens.current_span(),
        ));
    }

    Ok(args)
}
