//! Numeric coercion and term ordering
//!
//! Single source of truth for turning literals into numbers and for
//! the total order used by ORDER BY and MIN/MAX. Every component that
//! needs a number goes through [`term_to_f64`] so that aggregates,
//! filters, and comparisons agree on what counts as numeric.

use std::cmp::Ordering;

use trestle_vocab::xsd;

use crate::term::{Literal, Term};

/// XSD datatypes treated as numeric.
const NUMERIC_DATATYPES: &[&str] = &[
    xsd::INTEGER,
    xsd::DECIMAL,
    xsd::DOUBLE,
    xsd::FLOAT,
    xsd::LONG,
    xsd::INT,
    xsd::SHORT,
    xsd::BYTE,
    xsd::UNSIGNED_LONG,
    xsd::UNSIGNED_INT,
    xsd::UNSIGNED_SHORT,
    xsd::UNSIGNED_BYTE,
    xsd::NON_NEGATIVE_INTEGER,
    xsd::NON_POSITIVE_INTEGER,
    xsd::POSITIVE_INTEGER,
    xsd::NEGATIVE_INTEGER,
];

pub fn is_numeric_datatype(iri: &str) -> bool {
    NUMERIC_DATATYPES.contains(&iri)
}

/// Coerce a term to `f64`.
///
/// Literals with a parseable numeric lexical value coerce regardless of
/// datatype, so `"5"` and `"5"^^xsd:string` both yield `5.0`. Booleans
/// coerce to 0.0/1.0. IRIs, blank nodes, non-numeric lexical values,
/// and NaN all yield `None`.
pub fn term_to_f64(term: &Term) -> Option<f64> {
    match term {
        Term::Literal(lit) => literal_to_f64(lit),
        Term::Iri(_) | Term::Blank(_) => None,
    }
}

/// Coerce a literal to `f64`. See [`term_to_f64`].
pub fn literal_to_f64(lit: &Literal) -> Option<f64> {
    if lit.datatype_iri() == xsd::BOOLEAN {
        return match lit.value() {
            "true" | "1" => Some(1.0),
            "false" | "0" => Some(0.0),
            _ => None,
        };
    }
    match lit.value().parse::<f64>() {
        Ok(n) if !n.is_nan() => Some(n),
        _ => None,
    }
}

/// Total order over terms, used by ORDER BY and MIN/MAX.
///
/// Kinds rank blank node < IRI < literal. Within literals, values that
/// both coerce to numbers compare numerically; otherwise comparison
/// falls back to lexical value, then datatype, then language tag.
pub fn compare_terms(a: &Term, b: &Term) -> Ordering {
    fn kind_rank(term: &Term) -> u8 {
        match term {
            Term::Blank(_) => 0,
            Term::Iri(_) => 1,
            Term::Literal(_) => 2,
        }
    }

    match (a, b) {
        (Term::Blank(x), Term::Blank(y)) => x.id().cmp(y.id()),
        (Term::Iri(x), Term::Iri(y)) => x.as_str().cmp(y.as_str()),
        (Term::Literal(x), Term::Literal(y)) => compare_literals(x, y),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn compare_literals(a: &Literal, b: &Literal) -> Ordering {
    if let (Some(x), Some(y)) = (literal_to_f64(a), literal_to_f64(b)) {
        // NaN is filtered by the coercion, so this is total.
        if let Some(ord) = x.partial_cmp(&y) {
            if ord != Ordering::Equal {
                return ord;
            }
        }
    } else if a.value() != b.value() {
        return a.value().cmp(b.value());
    }
    a.datatype_iri()
        .cmp(b.datatype_iri())
        .then_with(|| a.lang().unwrap_or("").cmp(b.lang().unwrap_or("")))
}

/// Order over possibly-unbound values: unbound sorts before any bound
/// term.
pub fn compare_bindings(a: Option<&Term>, b: Option<&Term>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => compare_terms(x, y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{BlankNode, Iri};

    fn lit(v: &str) -> Term {
        Term::Literal(Literal::simple(v))
    }

    #[test]
    fn coercion_accepts_numeric_lexical_values() {
        assert_eq!(term_to_f64(&lit("5")), Some(5.0));
        assert_eq!(term_to_f64(&lit("-2.5")), Some(-2.5));
        assert_eq!(term_to_f64(&Term::Literal(Literal::integer(10))), Some(10.0));
        assert_eq!(term_to_f64(&Term::Literal(Literal::double(9.1))), Some(9.1));
        assert_eq!(
            term_to_f64(&Term::Literal(Literal::typed("7", Iri::new(xsd::STRING)))),
            Some(7.0)
        );
    }

    #[test]
    fn coercion_rejects_non_numbers() {
        assert_eq!(term_to_f64(&lit("abc")), None);
        assert_eq!(term_to_f64(&lit("")), None);
        assert_eq!(term_to_f64(&Term::Iri(Iri::new("http://example.org/5"))), None);
        assert_eq!(term_to_f64(&Term::Blank(BlankNode::new("b0"))), None);
        assert_eq!(term_to_f64(&lit("NaN")), None);
    }

    #[test]
    fn booleans_coerce_to_zero_and_one() {
        assert_eq!(term_to_f64(&Term::Literal(Literal::boolean(true))), Some(1.0));
        assert_eq!(term_to_f64(&Term::Literal(Literal::boolean(false))), Some(0.0));
    }

    #[test]
    fn kind_order_is_blank_iri_literal() {
        let blank = Term::Blank(BlankNode::new("b"));
        let iri = Term::Iri(Iri::new("http://example.org/a"));
        let literal = lit("a");
        assert_eq!(compare_terms(&blank, &iri), Ordering::Less);
        assert_eq!(compare_terms(&iri, &literal), Ordering::Less);
        assert_eq!(compare_terms(&literal, &blank), Ordering::Greater);
    }

    #[test]
    fn numeric_literals_compare_numerically() {
        // Lexical comparison would put "9" after "10".
        assert_eq!(compare_terms(&lit("9"), &lit("10")), Ordering::Less);
        assert_eq!(
            compare_terms(
                &Term::Literal(Literal::integer(2)),
                &Term::Literal(Literal::double(2.5))
            ),
            Ordering::Less
        );
    }

    #[test]
    fn non_numeric_literals_compare_lexically() {
        assert_eq!(compare_terms(&lit("apple"), &lit("banana")), Ordering::Less);
        assert_eq!(compare_terms(&lit("b"), &lit("b")), Ordering::Equal);
    }

    #[test]
    fn unbound_sorts_first() {
        let a = lit("a");
        assert_eq!(compare_bindings(None, Some(&a)), Ordering::Less);
        assert_eq!(compare_bindings(Some(&a), None), Ordering::Greater);
        assert_eq!(compare_bindings(None, None), Ordering::Equal);
    }
}
