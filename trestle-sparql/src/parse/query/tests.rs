//! Parser tests covering the full query grammar.

use super::parse_sparql;
use crate::ast::{
    AggregateFunction, BinaryOp, Expression, GraphPattern, IriValue, LiteralValue, OrderDirection,
    OrderExpr, PredicateTerm, Query, QueryBody, SelectModifier, SelectQuery, SelectVariable,
    SelectVariables, SubjectTerm, Term,
};
use crate::diag::{DiagCode, Diagnostic};

fn parse_ok(source: &str) -> Query {
    let output = parse_sparql(source);
    assert!(
        !output.has_errors(),
        "unexpected errors for {source:?}: {:?}",
        output.diagnostics
    );
    output.ast.expect("no AST despite error-free parse")
}

fn parse_err(source: &str) -> Vec<Diagnostic> {
    let output = parse_sparql(source);
    assert!(output.has_errors(), "expected errors for {source:?}");
    assert!(
        output.ast.is_none(),
        "an errored parse must not produce an AST"
    );
    output.diagnostics
}

fn select(query: &Query) -> &SelectQuery {
    match &query.body {
        QueryBody::Select(s) => s,
        other => panic!("expected SELECT query, got {other:?}"),
    }
}

// =========================================================================
// Query forms and prologue
// =========================================================================

#[test]
fn select_star_over_single_triple() {
    let query = parse_ok("SELECT * WHERE { ?s ?p ?o }");
    let select = select(&query);

    assert!(matches!(select.select.variables, SelectVariables::Star));
    assert!(select.where_clause.has_where_keyword);

    match &select.where_clause.pattern {
        GraphPattern::Bgp { patterns, .. } => {
            assert_eq!(patterns.len(), 1);
            assert!(matches!(patterns[0].subject, SubjectTerm::Var(_)));
            assert!(matches!(patterns[0].predicate, PredicateTerm::Var(_)));
            assert!(matches!(patterns[0].object, Term::Var(_)));
        }
        other => panic!("expected BGP, got {other:?}"),
    }
}

#[test]
fn where_keyword_is_optional() {
    let query = parse_ok("SELECT * { ?s ?p ?o }");
    assert!(!select(&query).where_clause.has_where_keyword);
}

#[test]
fn explicit_projection_variables() {
    let query = parse_ok("SELECT ?name ?age WHERE { ?s ?p ?o }");

    match &select(&query).select.variables {
        SelectVariables::Explicit(vars) => {
            assert_eq!(vars.len(), 2);
            assert_eq!(vars[0].var().name.as_ref(), "name");
            assert_eq!(vars[1].var().name.as_ref(), "age");
        }
        other => panic!("expected explicit variables, got {other:?}"),
    }
}

#[test]
fn projection_expression_with_alias() {
    let query = parse_ok("SELECT (?a + ?b AS ?sum) WHERE { ?s ?p ?o }");

    match &select(&query).select.variables {
        SelectVariables::Explicit(vars) => match &vars[0] {
            SelectVariable::Expr { expr, alias, .. } => {
                assert_eq!(alias.name.as_ref(), "sum");
                assert!(matches!(
                    expr,
                    Expression::Binary {
                        op: BinaryOp::Add,
                        ..
                    }
                ));
            }
            other => panic!("expected aliased expression, got {other:?}"),
        },
        other => panic!("expected explicit variables, got {other:?}"),
    }
}

#[test]
fn prologue_prefix_declarations() {
    let query = parse_ok(
        "PREFIX ex: <http://example.org/>\n\
         PREFIX foaf: <http://xmlns.com/foaf/0.1/>\n\
         SELECT * WHERE { ?s ex:knows ?o }",
    );

    assert_eq!(query.prologue.prefixes.len(), 2);
    assert_eq!(
        query.prologue.get_prefix("ex").map(|iri| iri.as_ref()),
        Some("http://example.org/")
    );
}

#[test]
fn prologue_base_declaration() {
    let query = parse_ok("BASE <http://example.org/> SELECT * WHERE { ?s ?p ?o }");
    assert_eq!(
        query.prologue.base.as_ref().map(|b| b.iri.as_ref()),
        Some("http://example.org/")
    );
}

#[test]
fn ask_query_with_and_without_where() {
    let query = parse_ok("ASK { ?s ?p ?o }");
    assert!(matches!(query.body, QueryBody::Ask(_)));

    let query = parse_ok("ASK WHERE { ?s ?p ?o }");
    match &query.body {
        QueryBody::Ask(ask) => assert!(ask.where_clause.has_where_keyword),
        other => panic!("expected ASK query, got {other:?}"),
    }
}

#[test]
fn construct_query_with_template() {
    let query = parse_ok(
        "CONSTRUCT { ?s <http://example.org/knows> ?o } \
         WHERE { ?s <http://example.org/friend> ?o }",
    );

    match &query.body {
        QueryBody::Construct(construct) => {
            assert_eq!(construct.template.triples.len(), 1);
        }
        other => panic!("expected CONSTRUCT query, got {other:?}"),
    }
}

#[test]
fn construct_without_template_is_an_error() {
    let diags = parse_err("CONSTRUCT WHERE { ?s ?p ?o }");
    assert!(diags[0].message.contains("CONSTRUCT template"));
}

#[test]
fn describe_is_rejected() {
    let diags = parse_err("DESCRIBE <http://example.org/alice>");
    assert_eq!(diags[0].code, DiagCode::UnsupportedFeature);
    assert!(diags[0].message.contains("DESCRIBE"));
}

#[test]
fn missing_query_form_is_an_error() {
    let diags = parse_err("WHERE { ?s ?p ?o }");
    assert!(diags[0].message.contains("expected query form"));
}

#[test]
fn trailing_tokens_are_an_error() {
    let diags = parse_err("SELECT * WHERE { ?s ?p ?o } bogus");
    assert_eq!(diags[0].code, DiagCode::UnexpectedToken);
}

#[test]
fn empty_input_is_an_error() {
    let diags = parse_err("");
    assert_eq!(diags[0].code, DiagCode::UnexpectedEof);
}

// =========================================================================
// Terms and triple blocks
// =========================================================================

#[test]
fn a_keyword_expands_to_rdf_type() {
    let query = parse_ok("SELECT * WHERE { ?s a <http://example.org/Person> }");

    match &select(&query).where_clause.pattern {
        GraphPattern::Bgp { patterns, .. } => match &patterns[0].predicate {
            PredicateTerm::Iri(iri) => match &iri.value {
                IriValue::Full(value) => {
                    assert_eq!(value.as_ref(), trestle_vocab::rdf::TYPE);
                }
                other => panic!("expected full IRI, got {other:?}"),
            },
            other => panic!("expected IRI predicate, got {other:?}"),
        },
        other => panic!("expected BGP, got {other:?}"),
    }
}

#[test]
fn predicate_object_lists_expand() {
    // One subject, two predicates, the second with two objects.
    let query = parse_ok(
        "SELECT * WHERE { ?s <http://example.org/a> ?x ; \
         <http://example.org/b> ?y , ?z }",
    );

    match &select(&query).where_clause.pattern {
        GraphPattern::Bgp { patterns, .. } => assert_eq!(patterns.len(), 3),
        other => panic!("expected BGP, got {other:?}"),
    }
}

#[test]
fn blank_node_subject() {
    let query = parse_ok("SELECT * WHERE { _:b1 <http://example.org/p> ?o }");

    match &select(&query).where_clause.pattern {
        GraphPattern::Bgp { patterns, .. } => match &patterns[0].subject {
            SubjectTerm::BlankNode(node) => assert_eq!(node.label.as_ref(), "b1"),
            other => panic!("expected blank node subject, got {other:?}"),
        },
        other => panic!("expected BGP, got {other:?}"),
    }
}

#[test]
fn literal_objects() {
    let query = parse_ok(
        "SELECT * WHERE { \
           ?a <http://example.org/name> \"Alice\"@en . \
           ?b <http://example.org/age> 30 . \
           ?c <http://example.org/score> -2.5 . \
           ?d <http://example.org/id> \"7\"^^<http://www.w3.org/2001/XMLSchema#byte> \
         }",
    );

    match &select(&query).where_clause.pattern {
        GraphPattern::Bgp { patterns, .. } => {
            assert_eq!(patterns.len(), 4);

            match &patterns[0].object {
                Term::Literal(lit) => match &lit.value {
                    LiteralValue::LangTagged { value, lang } => {
                        assert_eq!(value.as_ref(), "Alice");
                        assert_eq!(lang.as_ref(), "en");
                    }
                    other => panic!("expected lang-tagged literal, got {other:?}"),
                },
                other => panic!("expected literal object, got {other:?}"),
            }

            match &patterns[1].object {
                Term::Literal(lit) => {
                    assert_eq!(lit.value, LiteralValue::Integer(30));
                }
                other => panic!("expected literal object, got {other:?}"),
            }

            match &patterns[2].object {
                Term::Literal(lit) => match &lit.value {
                    LiteralValue::Decimal(s) => assert_eq!(s.as_ref(), "-2.5"),
                    other => panic!("expected decimal literal, got {other:?}"),
                },
                other => panic!("expected literal object, got {other:?}"),
            }

            match &patterns[3].object {
                Term::Literal(lit) => {
                    assert!(matches!(lit.value, LiteralValue::Typed { .. }));
                }
                other => panic!("expected literal object, got {other:?}"),
            }
        }
        other => panic!("expected BGP, got {other:?}"),
    }
}

#[test]
fn property_paths_are_rejected() {
    let diags = parse_err(
        "SELECT * WHERE { ?s <http://example.org/a>/<http://example.org/b> ?o }",
    );
    assert_eq!(diags[0].code, DiagCode::UnsupportedFeature);
    assert!(diags[0].message.contains("property paths"));
}

// =========================================================================
// Graph patterns
// =========================================================================

#[test]
fn optional_pattern() {
    let query = parse_ok(
        "SELECT * WHERE { ?s <http://example.org/name> ?name \
         OPTIONAL { ?s <http://example.org/email> ?email } }",
    );

    match &select(&query).where_clause.pattern {
        GraphPattern::Group { patterns, .. } => {
            assert_eq!(patterns.len(), 2);
            assert!(matches!(patterns[0], GraphPattern::Bgp { .. }));
            assert!(matches!(patterns[1], GraphPattern::Optional { .. }));
        }
        other => panic!("expected group, got {other:?}"),
    }
}

#[test]
fn optional_with_inner_filter() {
    let query = parse_ok(
        "SELECT * WHERE { ?s ?p ?o OPTIONAL { ?s <http://example.org/age> ?age \
         FILTER (?age > 18) } }",
    );

    match &select(&query).where_clause.pattern {
        GraphPattern::Group { patterns, .. } => match &patterns[1] {
            GraphPattern::Optional { pattern, .. } => match pattern.as_ref() {
                GraphPattern::Group { patterns, .. } => {
                    assert!(matches!(patterns[0], GraphPattern::Bgp { .. }));
                    assert!(matches!(patterns[1], GraphPattern::Filter { .. }));
                }
                other => panic!("expected group inside OPTIONAL, got {other:?}"),
            },
            other => panic!("expected OPTIONAL, got {other:?}"),
        },
        other => panic!("expected group, got {other:?}"),
    }
}

#[test]
fn union_of_two_groups() {
    let query = parse_ok(
        "SELECT * WHERE { { ?s <http://example.org/a> ?o } \
         UNION { ?s <http://example.org/b> ?o } }",
    );

    assert!(matches!(
        select(&query).where_clause.pattern,
        GraphPattern::Union { .. }
    ));
}

#[test]
fn chained_unions_nest_left() {
    let query = parse_ok(
        "SELECT * WHERE { { ?s <http://example.org/a> ?o } \
         UNION { ?s <http://example.org/b> ?o } \
         UNION { ?s <http://example.org/c> ?o } }",
    );

    match &select(&query).where_clause.pattern {
        GraphPattern::Union { left, right, .. } => {
            assert!(matches!(left.as_ref(), GraphPattern::Union { .. }));
            assert!(matches!(right.as_ref(), GraphPattern::Bgp { .. }));
        }
        other => panic!("expected UNION, got {other:?}"),
    }
}

#[test]
fn union_without_left_group_is_an_error() {
    let diags = parse_err("SELECT * WHERE { UNION { ?s ?p ?o } }");
    assert!(diags[0].message.contains("UNION"));
}

#[test]
fn filter_with_comparison() {
    let query = parse_ok("SELECT * WHERE { ?s ?p ?o FILTER (?o != 42) }");

    match &select(&query).where_clause.pattern {
        GraphPattern::Group { patterns, .. } => match &patterns[1] {
            GraphPattern::Filter { expr, .. } => {
                assert!(matches!(
                    expr.unwrap_bracketed(),
                    Expression::Binary {
                        op: BinaryOp::Ne,
                        ..
                    }
                ));
            }
            other => panic!("expected FILTER, got {other:?}"),
        },
        other => panic!("expected group, got {other:?}"),
    }
}

#[test]
fn bind_assigns_expression_to_variable() {
    let query = parse_ok("SELECT * WHERE { ?s ?p ?o BIND (?o * 2 AS ?doubled) }");

    match &select(&query).where_clause.pattern {
        GraphPattern::Group { patterns, .. } => match &patterns[1] {
            GraphPattern::Bind { var, .. } => assert_eq!(var.name.as_ref(), "doubled"),
            other => panic!("expected BIND, got {other:?}"),
        },
        other => panic!("expected group, got {other:?}"),
    }
}

#[test]
fn bind_without_as_is_an_error() {
    let diags = parse_err("SELECT * WHERE { ?s ?p ?o BIND (?o * 2) }");
    assert!(diags
        .iter()
        .any(|d| d.message.contains("BIND requires 'AS ?variable'")));
}

#[test]
fn values_is_rejected() {
    let diags = parse_err("SELECT * WHERE { VALUES ?x { 1 2 } ?s ?p ?x }");
    assert_eq!(diags[0].code, DiagCode::UnsupportedFeature);
    assert!(diags[0].message.contains("VALUES"));
}

#[test]
fn subqueries_are_rejected() {
    let diags = parse_err("SELECT * WHERE { { SELECT ?s WHERE { ?s ?p ?o } } }");
    assert_eq!(diags[0].code, DiagCode::UnsupportedFeature);
    assert!(diags[0].message.contains("subqueries"));
}

#[test]
fn empty_group_parses_to_empty_bgp() {
    let query = parse_ok("SELECT * WHERE { }");
    match &select(&query).where_clause.pattern {
        GraphPattern::Bgp { patterns, .. } => assert!(patterns.is_empty()),
        other => panic!("expected empty BGP, got {other:?}"),
    }
}

// =========================================================================
// Solution modifiers
// =========================================================================

#[test]
fn distinct_modifier() {
    let query = parse_ok("SELECT DISTINCT ?s WHERE { ?s ?p ?o }");
    assert_eq!(
        select(&query).select.modifier,
        Some(SelectModifier::Distinct)
    );
}

#[test]
fn reduced_warns_but_parses() {
    let output = parse_sparql("SELECT REDUCED ?s WHERE { ?s ?p ?o }");

    assert!(!output.has_errors());
    assert!(output.ast.is_some());

    let warning = output
        .warnings()
        .next()
        .expect("expected a REDUCED warning");
    assert_eq!(warning.code, DiagCode::ReducedHasNoEffect);
}

#[test]
fn group_by_with_count() {
    let query = parse_ok(
        "SELECT ?p (COUNT(?s) AS ?n) WHERE { ?s ?p ?o } GROUP BY ?p",
    );
    let select = select(&query);

    let group_by = select.modifiers.group_by.as_ref().expect("GROUP BY");
    assert_eq!(group_by.conditions.len(), 1);

    match &select.select.variables {
        SelectVariables::Explicit(vars) => match &vars[1] {
            SelectVariable::Expr { expr, .. } => match expr {
                Expression::Aggregate {
                    function, distinct, ..
                } => {
                    assert_eq!(*function, AggregateFunction::Count);
                    assert!(!distinct);
                }
                other => panic!("expected aggregate, got {other:?}"),
            },
            other => panic!("expected aliased aggregate, got {other:?}"),
        },
        other => panic!("expected explicit variables, got {other:?}"),
    }
}

#[test]
fn group_concat_with_separator() {
    let query = parse_ok(
        "SELECT (GROUP_CONCAT(?name; SEPARATOR=\", \") AS ?names) \
         WHERE { ?s <http://example.org/name> ?name } GROUP BY ?s",
    );

    match &select(&query).select.variables {
        SelectVariables::Explicit(vars) => match &vars[0] {
            SelectVariable::Expr { expr, .. } => match expr {
                Expression::Aggregate {
                    function,
                    separator,
                    ..
                } => {
                    assert_eq!(*function, AggregateFunction::GroupConcat);
                    assert_eq!(separator.as_deref(), Some(", "));
                }
                other => panic!("expected aggregate, got {other:?}"),
            },
            other => panic!("expected aliased aggregate, got {other:?}"),
        },
        other => panic!("expected explicit variables, got {other:?}"),
    }
}

#[test]
fn custom_aggregate_by_iri() {
    let query = parse_ok(
        "SELECT (<https://ns.trestle.dev/aggregate#median>(?v) AS ?m) \
         WHERE { ?s <http://example.org/value> ?v } GROUP BY ?s",
    );

    match &select(&query).select.variables {
        SelectVariables::Explicit(vars) => match &vars[0] {
            SelectVariable::Expr { expr, .. } => match expr {
                Expression::Aggregate { function, .. } => match function {
                    AggregateFunction::Custom(iri) => match &iri.value {
                        IriValue::Full(value) => {
                            assert_eq!(value.as_ref(), "https://ns.trestle.dev/aggregate#median");
                        }
                        other => panic!("expected full IRI, got {other:?}"),
                    },
                    other => panic!("expected custom aggregate, got {other:?}"),
                },
                other => panic!("expected aggregate, got {other:?}"),
            },
            other => panic!("expected aliased aggregate, got {other:?}"),
        },
        other => panic!("expected explicit variables, got {other:?}"),
    }
}

#[test]
fn group_by_expression_with_alias() {
    let query = parse_ok(
        "SELECT ?initial (COUNT(?s) AS ?n) WHERE { ?s ?p ?o } \
         GROUP BY (UCASE(?o) AS ?initial)",
    );

    let group_by = select(&query).modifiers.group_by.as_ref().expect("GROUP BY");
    match &group_by.conditions[0] {
        crate::ast::GroupCondition::Expr { alias, .. } => {
            assert_eq!(alias.as_ref().map(|v| v.name.as_ref()), Some("initial"));
        }
        other => panic!("expected expression condition, got {other:?}"),
    }
}

#[test]
fn having_clause() {
    let query = parse_ok(
        "SELECT ?p (COUNT(?s) AS ?n) WHERE { ?s ?p ?o } \
         GROUP BY ?p HAVING (COUNT(?s) > 2)",
    );

    let having = select(&query).modifiers.having.as_ref().expect("HAVING");
    assert_eq!(having.conditions.len(), 1);
}

#[test]
fn having_without_parens_is_an_error() {
    let diags = parse_err(
        "SELECT ?p WHERE { ?s ?p ?o } GROUP BY ?p HAVING COUNT(?s) > 2",
    );
    assert!(diags
        .iter()
        .any(|d| d.message.contains("HAVING requires a parenthesized condition")));
}

#[test]
fn order_by_mixed_conditions() {
    let query = parse_ok(
        "SELECT * WHERE { ?s ?p ?o } ORDER BY ?s DESC(?o) ASC(?p)",
    );

    let order_by = select(&query).modifiers.order_by.as_ref().expect("ORDER BY");
    assert_eq!(order_by.conditions.len(), 3);

    assert!(matches!(order_by.conditions[0].expr, OrderExpr::Var(_)));
    assert_eq!(order_by.conditions[0].direction, OrderDirection::Asc);
    assert_eq!(order_by.conditions[1].direction, OrderDirection::Desc);
    assert_eq!(order_by.conditions[2].direction, OrderDirection::Asc);
}

#[test]
fn desc_without_parens_is_an_error() {
    let diags = parse_err("SELECT * WHERE { ?s ?p ?o } ORDER BY DESC ?o");
    assert!(diags.iter().any(|d| d.message.contains("expected '(' after DESC")));
}

#[test]
fn limit_and_offset_in_either_order() {
    let query = parse_ok("SELECT * WHERE { ?s ?p ?o } LIMIT 10 OFFSET 5");
    let modifiers = &select(&query).modifiers;
    assert_eq!(modifiers.limit.as_ref().map(|l| l.value), Some(10));
    assert_eq!(modifiers.offset.as_ref().map(|o| o.value), Some(5));

    let query = parse_ok("SELECT * WHERE { ?s ?p ?o } OFFSET 5 LIMIT 10");
    let modifiers = &select(&query).modifiers;
    assert_eq!(modifiers.limit.as_ref().map(|l| l.value), Some(10));
    assert_eq!(modifiers.offset.as_ref().map(|o| o.value), Some(5));
}

#[test]
fn negative_limit_is_an_error() {
    let diags = parse_err("SELECT * WHERE { ?s ?p ?o } LIMIT -1");
    assert_eq!(diags[0].code, DiagCode::InvalidNumericLiteral);
    assert!(diags[0].message.contains("non-negative"));
}

#[test]
fn fractional_limit_is_an_error() {
    let diags = parse_err("SELECT * WHERE { ?s ?p ?o } LIMIT 2.5");
    assert_eq!(diags[0].code, DiagCode::InvalidNumericLiteral);
}

#[test]
fn duplicate_limit_is_an_error() {
    let diags = parse_err("SELECT * WHERE { ?s ?p ?o } LIMIT 1 LIMIT 2");
    assert!(diags[0].message.contains("duplicate LIMIT"));
}

// =========================================================================
// Lexer error surfacing and dataset clauses
// =========================================================================

#[test]
fn unterminated_string_is_reported() {
    let diags = parse_err("SELECT * WHERE { ?s ?p \"oops }");
    assert_eq!(diags[0].code, DiagCode::UnterminatedString);
}

#[test]
fn stray_character_is_reported() {
    let diags = parse_err("SELECT * WHERE { ?s ~ ?o }");
    assert_eq!(diags[0].code, DiagCode::UnexpectedToken);
}

#[test]
fn from_clause_is_rejected() {
    let diags = parse_err(
        "SELECT * FROM <http://example.org/graph> WHERE { ?s ?p ?o }",
    );
    assert_eq!(diags[0].code, DiagCode::UnsupportedFeature);
    assert!(diags[0].message.contains("FROM"));
}

#[test]
fn comments_are_ignored() {
    let query = parse_ok(
        "# leading comment\n\
         SELECT * # trailing comment\n\
         WHERE { ?s ?p ?o # inside\n\
         }",
    );
    assert!(matches!(query.body, QueryBody::Select(_)));
}
