//! Algebra evaluation
//!
//! Recursive, materializing evaluation of an [`Operation`] tree
//! against a triple store. Solutions are plain
//! [`SolutionMapping`]s; join order within a Bgp follows pattern
//! order, with each matched pattern narrowing the next one's scan
//! through already-bound variables.
//!
//! # Design
//!
//! - Expression evaluation returns `Option<Term>`: `None` is the
//!   error value (unbound variable, type mismatch, failed coercion).
//!   Filters keep a row only when the condition is a bound term whose
//!   effective boolean value is true.
//! - `&&` and `||` follow three-valued logic: an error operand still
//!   yields a result when the other side decides the outcome
//!   (`false && error` is false, `true || error` is true).
//! - Group resolves every aggregate against the registry before
//!   looking at any rows, so an unknown aggregate IRI fails the query
//!   even over an empty store.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;
use trestle_core::{
    compare_bindings, is_numeric_datatype, literal_to_f64, term_to_f64, BlankNode, Iri, Literal,
    Resource, SolutionMapping, Term, Triple, TripleStore,
};
use trestle_sparql::ast::{BinaryOp, FunctionName, UnaryOp};
use trestle_vocab::xsd;

use crate::aggregate::{self, AggregateFunction, AggregateRegistry};
use crate::algebra::{
    AggregateCall, Expr, Operation, PatternTerm, QueryForm, SortCondition, TemplateTerm,
    TemplateTriple, TranslatedQuery, TriplePattern,
};
use crate::error::Result;
use crate::results::QueryResults;

/// Run a translated query against a store.
pub fn execute(
    query: &TranslatedQuery,
    store: &TripleStore,
    registry: &AggregateRegistry,
) -> Result<QueryResults> {
    let rows = eval_operation(&query.root, store, registry)?;
    debug!(rows = rows.len(), "evaluated root operation");
    Ok(match &query.form {
        QueryForm::Select { variables } => QueryResults::Solutions {
            variables: variables.clone(),
            rows,
        },
        QueryForm::Ask => QueryResults::Boolean(!rows.is_empty()),
        QueryForm::Construct { template } => {
            QueryResults::Graph(instantiate_template(template, &rows))
        }
    })
}

/// Evaluate one operation to its solution sequence.
pub fn eval_operation(
    op: &Operation,
    store: &TripleStore,
    registry: &AggregateRegistry,
) -> Result<Vec<SolutionMapping>> {
    match op {
        Operation::Bgp(patterns) => Ok(eval_bgp(patterns, store)),
        Operation::Join { left, right } => {
            let left_rows = eval_operation(left, store, registry)?;
            let right_rows = eval_operation(right, store, registry)?;
            let mut out = Vec::new();
            for l in &left_rows {
                for r in &right_rows {
                    if let Some(merged) = l.merged_with(r) {
                        out.push(merged);
                    }
                }
            }
            Ok(out)
        }
        Operation::LeftJoin {
            left,
            right,
            filter,
        } => {
            let left_rows = eval_operation(left, store, registry)?;
            let right_rows = eval_operation(right, store, registry)?;
            let mut out = Vec::new();
            for l in &left_rows {
                let mut matched = false;
                for r in &right_rows {
                    if let Some(merged) = l.merged_with(r) {
                        let keep = match filter {
                            Some(expr) => truthy(expr, &merged),
                            None => true,
                        };
                        if keep {
                            matched = true;
                            out.push(merged);
                        }
                    }
                }
                if !matched {
                    out.push(l.clone());
                }
            }
            Ok(out)
        }
        Operation::Filter { expr, input } => {
            let rows = eval_operation(input, store, registry)?;
            Ok(rows.into_iter().filter(|row| truthy(expr, row)).collect())
        }
        Operation::Union { left, right } => {
            let mut rows = eval_operation(left, store, registry)?;
            rows.extend(eval_operation(right, store, registry)?);
            Ok(rows)
        }
        Operation::Extend { input, var, expr } => {
            let rows = eval_operation(input, store, registry)?;
            Ok(rows
                .into_iter()
                .map(|mut row| {
                    // An already-bound variable keeps its binding; an
                    // erroring expression leaves the variable unbound.
                    if !row.is_bound(var) {
                        if let Some(term) = eval_expr(expr, &row) {
                            row.bind(var.clone(), term);
                        }
                    }
                    row
                })
                .collect())
        }
        Operation::Group {
            input,
            variables,
            aggregates,
        } => eval_group(input, variables, aggregates, store, registry),
        Operation::Project { input, variables } => {
            let rows = eval_operation(input, store, registry)?;
            Ok(rows.iter().map(|row| row.project(variables)).collect())
        }
        Operation::OrderBy { input, conditions } => {
            let rows = eval_operation(input, store, registry)?;
            Ok(sort_rows(rows, conditions))
        }
        Operation::Distinct { input } => {
            let rows = eval_operation(input, store, registry)?;
            let mut seen = HashSet::new();
            Ok(rows
                .into_iter()
                .filter(|row| seen.insert(row.sorted_entries()))
                .collect())
        }
        Operation::Slice {
            input,
            offset,
            limit,
        } => {
            let rows = eval_operation(input, store, registry)?;
            let kept = rows.into_iter().skip(*offset as usize);
            Ok(match limit {
                Some(limit) => kept.take(*limit as usize).collect(),
                None => kept.collect(),
            })
        }
    }
}

// ======================================================================
// Basic graph patterns
// ======================================================================

fn eval_bgp(patterns: &[TriplePattern], store: &TripleStore) -> Vec<SolutionMapping> {
    let mut rows = vec![SolutionMapping::new()];
    for pattern in patterns {
        let mut next = Vec::new();
        for row in &rows {
            match_pattern(pattern, row, store, &mut next);
        }
        rows = next;
        if rows.is_empty() {
            break;
        }
    }
    rows
}

/// Match one pattern under an existing partial solution, pushing each
/// extension onto `out`.
fn match_pattern(
    pattern: &TriplePattern,
    row: &SolutionMapping,
    store: &TripleStore,
    out: &mut Vec<SolutionMapping>,
) {
    let subject_term = fixed_term(&pattern.subject, row);
    let predicate_term = fixed_term(&pattern.predicate, row);
    let object_term = fixed_term(&pattern.object, row);

    // A literal fixed into a resource position can never match.
    let subject = match &subject_term {
        Some(term) => match term.to_resource() {
            Some(resource) => Some(resource),
            None => return,
        },
        None => None,
    };
    let predicate = match &predicate_term {
        Some(term) => match term.to_resource() {
            Some(resource) => Some(resource),
            None => return,
        },
        None => None,
    };

    for triple in store.matching(subject.as_ref(), predicate.as_ref(), object_term.as_ref()) {
        let mut extended = row.clone();
        if bind_position(
            &pattern.subject,
            &Term::from(triple.subject.clone()),
            &mut extended,
        ) && bind_position(
            &pattern.predicate,
            &Term::from(triple.predicate.clone()),
            &mut extended,
        ) && bind_position(&pattern.object, &triple.object, &mut extended)
        {
            out.push(extended);
        }
    }
}

/// The concrete term a position is fixed to, if any: a ground term or
/// an already-bound variable.
fn fixed_term(position: &PatternTerm, row: &SolutionMapping) -> Option<Term> {
    match position {
        PatternTerm::Ground(term) => Some(term.clone()),
        PatternTerm::Var(name) => row.get(name).cloned(),
    }
}

/// Bind a variable position to the matched term. Returns false when a
/// variable repeated within the pattern disagrees with itself.
fn bind_position(position: &PatternTerm, term: &Term, row: &mut SolutionMapping) -> bool {
    match position {
        PatternTerm::Ground(_) => true,
        PatternTerm::Var(name) => match row.get(name) {
            Some(existing) => existing == term,
            None => {
                row.bind(name.clone(), term.clone());
                true
            }
        },
    }
}

// ======================================================================
// Grouping and aggregation
// ======================================================================

fn eval_group(
    input: &Operation,
    variables: &[Arc<str>],
    aggregates: &[AggregateCall],
    store: &TripleStore,
    registry: &AggregateRegistry,
) -> Result<Vec<SolutionMapping>> {
    let functions = aggregates
        .iter()
        .map(|call| aggregate::resolve(call, registry))
        .collect::<Result<Vec<_>>>()?;

    let rows = eval_operation(input, store, registry)?;

    // Partition on the key tuple; unbound keys are valid and equal to
    // each other. Groups keep first-seen order.
    let mut keys: Vec<Vec<Option<Term>>> = Vec::new();
    let mut members: Vec<Vec<SolutionMapping>> = Vec::new();
    let mut index: HashMap<Vec<Option<Term>>, usize> = HashMap::new();

    for row in rows {
        let key: Vec<Option<Term>> = variables.iter().map(|var| row.get(var).cloned()).collect();
        match index.get(&key) {
            Some(&slot) => members[slot].push(row),
            None => {
                index.insert(key.clone(), members.len());
                keys.push(key);
                members.push(vec![row]);
            }
        }
    }

    // A keyless aggregation always produces one row, even over nothing.
    if keys.is_empty() && variables.is_empty() && !aggregates.is_empty() {
        keys.push(Vec::new());
        members.push(Vec::new());
    }

    debug!(groups = keys.len(), aggregates = aggregates.len(), "grouped solutions");

    let mut out = Vec::with_capacity(keys.len());
    for (key, group) in keys.iter().zip(&members) {
        let mut result = SolutionMapping::new();
        for (var, value) in variables.iter().zip(key) {
            if let Some(term) = value {
                result.bind(var.clone(), term.clone());
            }
        }
        for (call, function) in aggregates.iter().zip(&functions) {
            if let Some(term) = run_aggregate(call, function.as_ref(), group) {
                result.bind(call.output.clone(), term);
            }
        }
        out.push(result);
    }
    Ok(out)
}

/// Fold one aggregate over a group's members.
fn run_aggregate(
    call: &AggregateCall,
    function: &dyn AggregateFunction,
    group: &[SolutionMapping],
) -> Option<Term> {
    let mut state = function.init();
    if call.distinct {
        match &call.input {
            Some(expr) => {
                let mut seen: HashSet<Option<Term>> = HashSet::new();
                for row in group {
                    let value = eval_expr(expr, row);
                    if seen.insert(value.clone()) {
                        function.step(&mut state, value.as_ref());
                    }
                }
            }
            // COUNT(DISTINCT *) deduplicates whole rows.
            None => {
                let mut seen = HashSet::new();
                for row in group {
                    if seen.insert(row.sorted_entries()) {
                        function.step(&mut state, None);
                    }
                }
            }
        }
    } else {
        for row in group {
            let value = call.input.as_ref().and_then(|expr| eval_expr(expr, row));
            function.step(&mut state, value.as_ref());
        }
    }
    function.finalize(state)
}

// ======================================================================
// Ordering
// ======================================================================

fn sort_rows(rows: Vec<SolutionMapping>, conditions: &[SortCondition]) -> Vec<SolutionMapping> {
    // Precomputed keys; the sort is stable, so ties keep input order.
    let mut keyed: Vec<(Vec<Option<Term>>, SolutionMapping)> = rows
        .into_iter()
        .map(|row| {
            let key = conditions
                .iter()
                .map(|condition| eval_expr(&condition.expr, &row))
                .collect();
            (key, row)
        })
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        for (condition, (x, y)) in conditions.iter().zip(a.iter().zip(b.iter())) {
            let ord = compare_bindings(x.as_ref(), y.as_ref());
            let ord = if condition.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });

    keyed.into_iter().map(|(_, row)| row).collect()
}

// ======================================================================
// CONSTRUCT template instantiation
// ======================================================================

/// Instantiate a template once per solution. Blank labels get fresh
/// nodes per solution; a row that leaves any position unbound or
/// ill-typed skips that triple. Output keeps production order with
/// duplicates removed.
fn instantiate_template(template: &[TemplateTriple], rows: &[SolutionMapping]) -> Vec<Triple> {
    let mut triples = Vec::new();
    let mut seen = HashSet::new();
    let mut blank_counter = 0usize;

    for row in rows {
        let mut scope: HashMap<Arc<str>, BlankNode> = HashMap::new();
        for pattern in template {
            let Some(subject) =
                template_resource(&pattern.subject, row, &mut scope, &mut blank_counter)
            else {
                continue;
            };
            let Some(predicate) =
                template_resource(&pattern.predicate, row, &mut scope, &mut blank_counter)
                    .filter(|resource| resource.as_iri().is_some())
            else {
                continue;
            };
            let Some(object) = template_term(&pattern.object, row, &mut scope, &mut blank_counter)
            else {
                continue;
            };
            let triple = Triple::new(subject, predicate, object);
            if seen.insert(triple.clone()) {
                triples.push(triple);
            }
        }
    }
    triples
}

fn template_term(
    term: &TemplateTerm,
    row: &SolutionMapping,
    scope: &mut HashMap<Arc<str>, BlankNode>,
    counter: &mut usize,
) -> Option<Term> {
    match term {
        TemplateTerm::Var(name) => row.get(name).cloned(),
        TemplateTerm::Ground(term) => Some(term.clone()),
        TemplateTerm::Blank(label) => {
            let node = scope.entry(label.clone()).or_insert_with(|| {
                let node = BlankNode::new(format!("b{counter}"));
                *counter += 1;
                node
            });
            Some(Term::Blank(node.clone()))
        }
    }
}

fn template_resource(
    term: &TemplateTerm,
    row: &SolutionMapping,
    scope: &mut HashMap<Arc<str>, BlankNode>,
    counter: &mut usize,
) -> Option<Resource> {
    template_term(term, row, scope, counter)?.to_resource()
}

// ======================================================================
// Expression evaluation
// ======================================================================

fn truthy(expr: &Expr, row: &SolutionMapping) -> bool {
    eval_expr(expr, row).as_ref().and_then(ebv) == Some(true)
}

/// Evaluate a scalar expression against one solution. `None` is the
/// error value.
pub(crate) fn eval_expr(expr: &Expr, row: &SolutionMapping) -> Option<Term> {
    match expr {
        Expr::Var(name) => row.get(name).cloned(),
        Expr::Term(term) => Some(term.clone()),
        Expr::Binary { op, left, right } => eval_binary(*op, left, right, row),
        Expr::Unary { op, operand } => eval_unary(*op, operand, row),
        Expr::Function { name, args } => eval_function(*name, args, row),
        Expr::If {
            condition,
            then_expr,
            else_expr,
        } => {
            if ebv(&eval_expr(condition, row)?)? {
                eval_expr(then_expr, row)
            } else {
                eval_expr(else_expr, row)
            }
        }
        Expr::Coalesce(args) => args.iter().find_map(|arg| eval_expr(arg, row)),
        Expr::In {
            expr,
            list,
            negated,
        } => {
            let value = eval_expr(expr, row)?;
            let found = list.iter().any(|item| {
                eval_expr(item, row).is_some_and(|candidate| terms_equal(&value, &candidate))
            });
            Some(boolean(found != *negated))
        }
    }
}

fn eval_binary(op: BinaryOp, left: &Expr, right: &Expr, row: &SolutionMapping) -> Option<Term> {
    match op {
        BinaryOp::And => {
            let l = eval_expr(left, row).as_ref().and_then(ebv);
            let r = eval_expr(right, row).as_ref().and_then(ebv);
            match (l, r) {
                (Some(false), _) | (_, Some(false)) => Some(boolean(false)),
                (Some(true), Some(true)) => Some(boolean(true)),
                _ => None,
            }
        }
        BinaryOp::Or => {
            let l = eval_expr(left, row).as_ref().and_then(ebv);
            let r = eval_expr(right, row).as_ref().and_then(ebv);
            match (l, r) {
                (Some(true), _) | (_, Some(true)) => Some(boolean(true)),
                (Some(false), Some(false)) => Some(boolean(false)),
                _ => None,
            }
        }
        BinaryOp::Eq => {
            let equal = terms_equal(&eval_expr(left, row)?, &eval_expr(right, row)?);
            Some(boolean(equal))
        }
        BinaryOp::Ne => {
            let equal = terms_equal(&eval_expr(left, row)?, &eval_expr(right, row)?);
            Some(boolean(!equal))
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ord = compare_values(&eval_expr(left, row)?, &eval_expr(right, row)?)?;
            let keep = match op {
                BinaryOp::Lt => ord == Ordering::Less,
                BinaryOp::Le => ord != Ordering::Greater,
                BinaryOp::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            };
            Some(boolean(keep))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            let x = term_to_f64(&eval_expr(left, row)?)?;
            let y = term_to_f64(&eval_expr(right, row)?)?;
            arithmetic(op, x, y)
        }
    }
}

fn eval_unary(op: UnaryOp, operand: &Expr, row: &SolutionMapping) -> Option<Term> {
    match op {
        UnaryOp::Not => {
            let value = ebv(&eval_expr(operand, row)?)?;
            Some(boolean(!value))
        }
        UnaryOp::Neg => {
            let x = term_to_f64(&eval_expr(operand, row)?)?;
            Some(number(-x))
        }
        UnaryOp::Pos => {
            let x = term_to_f64(&eval_expr(operand, row)?)?;
            Some(number(x))
        }
    }
}

fn eval_function(name: FunctionName, args: &[Expr], row: &SolutionMapping) -> Option<Term> {
    match name {
        // BOUND takes a variable, not a value: an unbound variable is
        // exactly what it exists to observe.
        FunctionName::Bound => match args.first()? {
            Expr::Var(name) => Some(boolean(row.is_bound(name))),
            _ => None,
        },
        FunctionName::Str => match eval_expr(args.first()?, row)? {
            Term::Literal(lit) => Some(Term::Literal(Literal::simple(lit.value()))),
            Term::Iri(iri) => Some(Term::Literal(Literal::simple(iri.as_str()))),
            Term::Blank(_) => None,
        },
        FunctionName::Lang => match eval_expr(args.first()?, row)? {
            Term::Literal(lit) => Some(Term::Literal(Literal::simple(lit.lang().unwrap_or("")))),
            _ => None,
        },
        FunctionName::Datatype => match eval_expr(args.first()?, row)? {
            Term::Literal(lit) => Some(Term::Iri(Iri::new(lit.datatype_iri()))),
            _ => None,
        },
        FunctionName::IsIri | FunctionName::IsUri => {
            let term = eval_expr(args.first()?, row)?;
            Some(boolean(matches!(term, Term::Iri(_))))
        }
        FunctionName::IsBlank => {
            let term = eval_expr(args.first()?, row)?;
            Some(boolean(matches!(term, Term::Blank(_))))
        }
        FunctionName::IsLiteral => {
            let term = eval_expr(args.first()?, row)?;
            Some(boolean(matches!(term, Term::Literal(_))))
        }
        FunctionName::IsNumeric => {
            let term = eval_expr(args.first()?, row)?;
            let numeric = match &term {
                Term::Literal(lit) => {
                    is_numeric_datatype(lit.datatype_iri()) && literal_to_f64(lit).is_some()
                }
                _ => false,
            };
            Some(boolean(numeric))
        }
        FunctionName::Strlen => {
            let lit = string_arg(args.first()?, row)?;
            Some(Term::Literal(Literal::integer(
                lit.value().chars().count() as i64,
            )))
        }
        FunctionName::Ucase => {
            let lit = string_arg(args.first()?, row)?;
            Some(Term::Literal(restring(&lit, lit.value().to_uppercase())))
        }
        FunctionName::Lcase => {
            let lit = string_arg(args.first()?, row)?;
            Some(Term::Literal(restring(&lit, lit.value().to_lowercase())))
        }
        FunctionName::Contains | FunctionName::StrStarts | FunctionName::StrEnds => {
            let haystack = string_arg(args.first()?, row)?;
            let needle = string_arg(args.get(1)?, row)?;
            let result = match name {
                FunctionName::Contains => haystack.value().contains(needle.value()),
                FunctionName::StrStarts => haystack.value().starts_with(needle.value()),
                _ => haystack.value().ends_with(needle.value()),
            };
            Some(boolean(result))
        }
        FunctionName::Abs => {
            let x = term_to_f64(&eval_expr(args.first()?, row)?)?;
            Some(number(x.abs()))
        }
    }
}

/// SPARQL effective boolean value, `None` when the term has none.
pub(crate) fn ebv(term: &Term) -> Option<bool> {
    let lit = match term {
        Term::Literal(lit) => lit,
        _ => return None,
    };
    if lit.datatype_iri() == xsd::BOOLEAN {
        return match lit.value() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        };
    }
    if is_numeric_datatype(lit.datatype_iri()) {
        return literal_to_f64(lit).map(|n| n != 0.0);
    }
    if lit.is_lang_tagged() || lit.datatype().is_none() || lit.datatype_iri() == xsd::STRING {
        return Some(!lit.value().is_empty());
    }
    None
}

/// Equality for `=`, `!=`, and IN: numeric when both sides coerce,
/// term identity otherwise.
fn terms_equal(a: &Term, b: &Term) -> bool {
    if let (Some(x), Some(y)) = (term_to_f64(a), term_to_f64(b)) {
        return x == y;
    }
    a == b
}

/// Ordering for `<`, `<=`, `>`, `>=`: numeric when both sides coerce,
/// lexical between literals, undefined otherwise.
fn compare_values(a: &Term, b: &Term) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (term_to_f64(a), term_to_f64(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Term::Literal(x), Term::Literal(y)) => Some(x.value().cmp(y.value())),
        _ => None,
    }
}

/// Whole-valued results become integers, like the aggregate rule for
/// SUM. Division is always a double, and division by zero is an error.
fn arithmetic(op: BinaryOp, x: f64, y: f64) -> Option<Term> {
    let value = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => {
            if y == 0.0 {
                return None;
            }
            return Some(Term::Literal(Literal::double(x / y)));
        }
        _ => return None,
    };
    if x.fract() == 0.0 && y.fract() == 0.0 {
        Some(number(value))
    } else {
        Some(Term::Literal(Literal::double(value)))
    }
}

fn number(value: f64) -> Term {
    if value.fract() == 0.0 && value.abs() <= i64::MAX as f64 {
        Term::Literal(Literal::integer(value as i64))
    } else {
        Term::Literal(Literal::double(value))
    }
}

fn boolean(value: bool) -> Term {
    Term::Literal(Literal::boolean(value))
}

/// String argument for the string built-ins: any literal qualifies,
/// IRIs and blank nodes are type errors.
fn string_arg(expr: &Expr, row: &SolutionMapping) -> Option<Literal> {
    match eval_expr(expr, row)? {
        Term::Literal(lit) => Some(lit),
        _ => None,
    }
}

/// Rebuild a string literal, keeping the language tag if present.
fn restring(original: &Literal, value: String) -> Literal {
    match original.lang() {
        Some(lang) => Literal::lang_tagged(value, lang),
        None => Literal::simple(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::AggregateName;

    fn iri(local: &str) -> Iri {
        Iri::new(format!("http://example.org/{local}"))
    }

    fn store() -> TripleStore {
        let mut store = TripleStore::new();
        store.insert(Triple::new(iri("alice"), iri("name"), Literal::simple("Alice")));
        store.insert(Triple::new(iri("alice"), iri("age"), Literal::integer(30)));
        store.insert(Triple::new(iri("bob"), iri("name"), Literal::simple("Bob")));
        store.insert(Triple::new(iri("bob"), iri("knows"), iri("alice")));
        store.insert(Triple::new(iri("alice"), iri("likes"), iri("alice")));
        store
    }

    fn var(name: &str) -> PatternTerm {
        PatternTerm::Var(Arc::from(name))
    }

    fn ground_iri(local: &str) -> PatternTerm {
        PatternTerm::Ground(Term::Iri(iri(local)))
    }

    fn eval(op: &Operation) -> Vec<SolutionMapping> {
        eval_operation(op, &store(), &AggregateRegistry::new()).unwrap()
    }

    fn row(pairs: &[(&str, Term)]) -> SolutionMapping {
        pairs
            .iter()
            .map(|(name, term)| (Arc::from(*name), term.clone()))
            .collect()
    }

    #[test]
    fn bgp_chains_bindings_across_patterns() {
        // ?person knows ?other . ?other name ?name
        let op = Operation::Bgp(vec![
            TriplePattern::new(var("person"), ground_iri("knows"), var("other")),
            TriplePattern::new(var("other"), ground_iri("name"), var("name")),
        ]);
        let rows = eval(&op);
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].get("name"),
            Some(&Term::Literal(Literal::simple("Alice")))
        );
    }

    #[test]
    fn repeated_variable_must_match_itself() {
        // ?s ?p ?s only matches the self-referential triple.
        let op = Operation::Bgp(vec![TriplePattern::new(var("s"), var("p"), var("s"))]);
        let rows = eval(&op);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("p"), Some(&Term::Iri(iri("likes"))));
    }

    #[test]
    fn empty_bgp_yields_one_empty_solution() {
        let rows = eval(&Operation::unit());
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_empty());
    }

    #[test]
    fn left_join_keeps_unmatched_left_rows() {
        let op = Operation::LeftJoin {
            left: Box::new(Operation::Bgp(vec![TriplePattern::new(
                var("s"),
                ground_iri("name"),
                var("name"),
            )])),
            right: Box::new(Operation::Bgp(vec![TriplePattern::new(
                var("s"),
                ground_iri("age"),
                var("age"),
            )])),
            filter: None,
        };
        let rows = eval(&op);
        assert_eq!(rows.len(), 2);
        let bob = rows
            .iter()
            .find(|row| row.get("s") == Some(&Term::Iri(iri("bob"))))
            .unwrap();
        assert!(!bob.is_bound("age"));
    }

    #[test]
    fn left_join_filter_sees_both_sides() {
        // Attach ages only when over 50: nobody qualifies, every left
        // row survives bare.
        let op = Operation::LeftJoin {
            left: Box::new(Operation::Bgp(vec![TriplePattern::new(
                var("s"),
                ground_iri("name"),
                var("name"),
            )])),
            right: Box::new(Operation::Bgp(vec![TriplePattern::new(
                var("s"),
                ground_iri("age"),
                var("age"),
            )])),
            filter: Some(Expr::binary(
                BinaryOp::Gt,
                Expr::Var(Arc::from("age")),
                Expr::Term(Term::Literal(Literal::integer(50))),
            )),
        };
        let rows = eval(&op);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| !row.is_bound("age")));
    }

    #[test]
    fn filter_drops_error_rows() {
        // STRLEN of an IRI errors; the row drops rather than failing
        // the query.
        let op = Operation::Filter {
            expr: Expr::binary(
                BinaryOp::Gt,
                Expr::Function {
                    name: FunctionName::Strlen,
                    args: vec![Expr::Var(Arc::from("o"))],
                },
                Expr::Term(Term::Literal(Literal::integer(0))),
            ),
            input: Box::new(Operation::Bgp(vec![TriplePattern::new(
                var("s"),
                var("p"),
                var("o"),
            )])),
        };
        let rows = eval(&op);
        assert_eq!(rows.len(), 3); // the literal objects only
    }

    #[test]
    fn extend_never_replaces_existing_bindings() {
        let op = Operation::Extend {
            input: Box::new(Operation::Bgp(vec![TriplePattern::new(
                var("s"),
                ground_iri("age"),
                var("age"),
            )])),
            var: Arc::from("age"),
            expr: Expr::Term(Term::Literal(Literal::integer(0))),
        };
        let rows = eval(&op);
        assert_eq!(
            rows[0].get("age"),
            Some(&Term::Literal(Literal::integer(30)))
        );
    }

    #[test]
    fn keyless_group_over_no_rows_produces_defaults() {
        let op = Operation::Group {
            input: Box::new(Operation::Bgp(vec![TriplePattern::new(
                var("s"),
                ground_iri("missing"),
                var("o"),
            )])),
            variables: vec![],
            aggregates: vec![AggregateCall {
                output: Arc::from("n"),
                name: AggregateName::Count,
                input: Some(Expr::Var(Arc::from("o"))),
                distinct: false,
                separator: None,
            }],
        };
        let rows = eval(&op);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("n"), Some(&Term::Literal(Literal::integer(0))));
    }

    #[test]
    fn distinct_aggregate_deduplicates_before_stepping() {
        let op = Operation::Group {
            input: Box::new(Operation::Bgp(vec![TriplePattern::new(
                var("s"),
                var("p"),
                var("o"),
            )])),
            variables: vec![],
            aggregates: vec![AggregateCall {
                output: Arc::from("n"),
                name: AggregateName::Count,
                input: Some(Expr::Var(Arc::from("s"))),
                distinct: true,
                separator: None,
            }],
        };
        let rows = eval(&op);
        // Two distinct subjects across five triples.
        assert_eq!(rows[0].get("n"), Some(&Term::Literal(Literal::integer(2))));
    }

    #[test]
    fn order_by_descending_is_numeric() {
        let rows = vec![
            row(&[("v", Term::Literal(Literal::integer(9)))]),
            row(&[("v", Term::Literal(Literal::integer(10)))]),
            row(&[("v", Term::Literal(Literal::integer(2)))]),
        ];
        let sorted = sort_rows(
            rows,
            &[SortCondition {
                expr: Expr::Var(Arc::from("v")),
                descending: true,
            }],
        );
        let values: Vec<&str> = sorted
            .iter()
            .filter_map(|r| r.get("v"))
            .filter_map(|t| t.as_literal())
            .map(|l| l.value())
            .collect();
        assert_eq!(values, vec!["10", "9", "2"]);
    }

    #[test]
    fn unbound_sorts_before_bound() {
        let rows = vec![
            row(&[("v", Term::Literal(Literal::integer(1)))]),
            row(&[]),
        ];
        let sorted = sort_rows(
            rows,
            &[SortCondition {
                expr: Expr::Var(Arc::from("v")),
                descending: false,
            }],
        );
        assert!(!sorted[0].is_bound("v"));
    }

    #[test]
    fn and_or_follow_three_valued_logic() {
        let empty = SolutionMapping::new();
        let error = Expr::Var(Arc::from("missing"));
        let truth = Expr::Term(boolean(true));
        let falsity = Expr::Term(boolean(false));

        // false && error is false, true || error is true.
        assert_eq!(
            eval_expr(&Expr::binary(BinaryOp::And, falsity.clone(), error.clone()), &empty),
            Some(boolean(false))
        );
        assert_eq!(
            eval_expr(&Expr::binary(BinaryOp::Or, truth.clone(), error.clone()), &empty),
            Some(boolean(true))
        );
        // true && error and false || error stay errors.
        assert_eq!(
            eval_expr(&Expr::binary(BinaryOp::And, truth, error.clone()), &empty),
            None
        );
        assert_eq!(
            eval_expr(&Expr::binary(BinaryOp::Or, falsity, error), &empty),
            None
        );
    }

    #[test]
    fn arithmetic_promotes_to_double_only_when_fractional() {
        let empty = SolutionMapping::new();
        let int = |n: i64| Expr::Term(Term::Literal(Literal::integer(n)));
        let dbl = |n: f64| Expr::Term(Term::Literal(Literal::double(n)));

        assert_eq!(
            eval_expr(&Expr::binary(BinaryOp::Add, int(2), int(3)), &empty),
            Some(Term::Literal(Literal::integer(5)))
        );
        assert_eq!(
            eval_expr(&Expr::binary(BinaryOp::Add, int(2), dbl(0.5)), &empty),
            Some(Term::Literal(Literal::double(2.5)))
        );
        // Division is always a double; zero divisor is an error.
        assert_eq!(
            eval_expr(&Expr::binary(BinaryOp::Div, int(6), int(3)), &empty),
            Some(Term::Literal(Literal::double(2.0)))
        );
        assert_eq!(
            eval_expr(&Expr::binary(BinaryOp::Div, int(6), int(0)), &empty),
            None
        );
    }

    #[test]
    fn equality_is_numeric_across_datatypes() {
        let empty = SolutionMapping::new();
        let typed_five = Expr::Term(Term::Literal(Literal::typed("5", Iri::new(xsd::STRING))));
        let int_five = Expr::Term(Term::Literal(Literal::integer(5)));
        assert_eq!(
            eval_expr(&Expr::binary(BinaryOp::Eq, typed_five, int_five), &empty),
            Some(boolean(true))
        );
    }

    #[test]
    fn bound_observes_unbound_variables() {
        let mapping = row(&[("x", Term::Literal(Literal::integer(1)))]);
        let bound_x = Expr::Function {
            name: FunctionName::Bound,
            args: vec![Expr::Var(Arc::from("x"))],
        };
        let bound_y = Expr::Function {
            name: FunctionName::Bound,
            args: vec![Expr::Var(Arc::from("y"))],
        };
        assert_eq!(eval_expr(&bound_x, &mapping), Some(boolean(true)));
        assert_eq!(eval_expr(&bound_y, &mapping), Some(boolean(false)));
    }

    #[test]
    fn coalesce_takes_the_first_defined_value() {
        let empty = SolutionMapping::new();
        let expr = Expr::Coalesce(vec![
            Expr::Var(Arc::from("missing")),
            Expr::Term(Term::Literal(Literal::integer(7))),
        ]);
        assert_eq!(
            eval_expr(&expr, &empty),
            Some(Term::Literal(Literal::integer(7)))
        );
        assert_eq!(eval_expr(&Expr::Coalesce(vec![]), &empty), None);
    }

    #[test]
    fn in_list_membership_and_negation() {
        let empty = SolutionMapping::new();
        let member = Expr::In {
            expr: Box::new(Expr::Term(Term::Literal(Literal::integer(2)))),
            list: vec![
                Expr::Term(Term::Literal(Literal::integer(1))),
                Expr::Term(Term::Literal(Literal::integer(2))),
            ],
            negated: false,
        };
        assert_eq!(eval_expr(&member, &empty), Some(boolean(true)));

        let not_member = Expr::In {
            expr: Box::new(Expr::Term(Term::Literal(Literal::integer(9)))),
            list: vec![Expr::Term(Term::Literal(Literal::integer(1)))],
            negated: true,
        };
        assert_eq!(eval_expr(&not_member, &empty), Some(boolean(true)));
    }

    #[test]
    fn string_functions_preserve_language_tags() {
        let mapping = row(&[(
            "s",
            Term::Literal(Literal::lang_tagged("hola", "es")),
        )]);
        let expr = Expr::Function {
            name: FunctionName::Ucase,
            args: vec![Expr::Var(Arc::from("s"))],
        };
        assert_eq!(
            eval_expr(&expr, &mapping),
            Some(Term::Literal(Literal::lang_tagged("HOLA", "es")))
        );
    }

    #[test]
    fn construct_blank_labels_are_fresh_per_solution() {
        let template = vec![TemplateTriple {
            subject: TemplateTerm::Blank(Arc::from("who")),
            predicate: TemplateTerm::Ground(Term::Iri(iri("name"))),
            object: TemplateTerm::Var(Arc::from("name")),
        }];
        let rows = vec![
            row(&[("name", Term::Literal(Literal::simple("Alice")))]),
            row(&[("name", Term::Literal(Literal::simple("Bob")))]),
        ];
        let triples = instantiate_template(&template, &rows);
        assert_eq!(triples.len(), 2);
        assert_ne!(triples[0].subject, triples[1].subject);
    }

    #[test]
    fn construct_skips_rows_with_unbound_template_variables() {
        let template = vec![TemplateTriple {
            subject: TemplateTerm::Var(Arc::from("s")),
            predicate: TemplateTerm::Ground(Term::Iri(iri("p"))),
            object: TemplateTerm::Var(Arc::from("o")),
        }];
        let rows = vec![
            row(&[("s", Term::Iri(iri("a"))), ("o", Term::Literal(Literal::simple("x")))]),
            row(&[("s", Term::Iri(iri("b")))]),
            // Literal subjects cannot form a triple.
            row(&[
                ("s", Term::Literal(Literal::simple("nope"))),
                ("o", Term::Literal(Literal::simple("y"))),
            ]),
        ];
        let triples = instantiate_template(&template, &rows);
        assert_eq!(triples.len(), 1);
        assert_eq!(triples[0].subject, Resource::Iri(iri("a")));
    }

    #[test]
    fn construct_deduplicates_output() {
        let template = vec![TemplateTriple {
            subject: TemplateTerm::Ground(Term::Iri(iri("s"))),
            predicate: TemplateTerm::Ground(Term::Iri(iri("p"))),
            object: TemplateTerm::Ground(Term::Literal(Literal::simple("o"))),
        }];
        let rows = vec![SolutionMapping::new(), SolutionMapping::new()];
        assert_eq!(instantiate_template(&template, &rows).len(), 1);
    }
}
