//! Built-in aggregate functions
//!
//! Keyword aggregates:
//! - COUNT, COUNT(*) - count bound values / count rows
//! - SUM, AVG - numeric sum and average
//! - MIN, MAX - extremes by the shared term order
//! - GROUP_CONCAT - string join with a configurable separator
//! - SAMPLE - first bound value of the group
//!
//! Extended aggregates addressed by IRI under the reserved `agg:`
//! namespace:
//! - median, variance, stddev (population), mode, percentileN
//!
//! # Type handling
//!
//! - Numeric aggregates coerce through `term_to_f64` and silently skip
//!   values that fail to coerce
//! - Unbound inputs are skipped (COUNT(*) counts rows, not inputs)
//! - Empty groups: COUNT/SUM/AVG yield 0, GROUP_CONCAT the empty
//!   string, MIN/MAX/SAMPLE stay unbound, the statistical aggregates
//!   yield the literal "0", MODE a single-space literal

use std::collections::HashMap;
use std::sync::Arc;

use trestle_core::{compare_terms, term_to_f64, Literal, Term};

use super::{AggregateFunction, AggregateState};

fn integer(value: i64) -> Option<Term> {
    Some(Term::Literal(Literal::integer(value)))
}

fn double(value: f64) -> Option<Term> {
    Some(Term::Literal(Literal::double(value)))
}

/// Shared empty-group placeholder for the statistical aggregates.
fn zero_literal() -> Option<Term> {
    Some(Term::Literal(Literal::simple("0")))
}

// ============================================================================
// Keyword built-ins
// ============================================================================

/// COUNT(expr) - count group members where the input is bound.
pub struct Count;

impl AggregateFunction for Count {
    fn init(&self) -> AggregateState {
        AggregateState::new(0i64)
    }

    fn step(&self, state: &mut AggregateState, value: Option<&Term>) {
        if value.is_some() {
            if let Some(count) = state.downcast_mut::<i64>() {
                *count += 1;
            }
        }
    }

    fn finalize(&self, state: AggregateState) -> Option<Term> {
        integer(state.into_inner::<i64>().unwrap_or(0))
    }
}

/// COUNT(*) - count all rows in the group, bound or not.
pub struct CountAll;

impl AggregateFunction for CountAll {
    fn init(&self) -> AggregateState {
        AggregateState::new(0i64)
    }

    fn step(&self, state: &mut AggregateState, _value: Option<&Term>) {
        if let Some(count) = state.downcast_mut::<i64>() {
            *count += 1;
        }
    }

    fn finalize(&self, state: AggregateState) -> Option<Term> {
        integer(state.into_inner::<i64>().unwrap_or(0))
    }
}

#[derive(Default)]
struct SumState {
    sum: f64,
    all_whole: bool,
    count: usize,
}

/// SUM - numeric sum.
///
/// Yields an integer literal when every input was whole, else a
/// double. An empty or all-non-numeric group sums to 0.
pub struct Sum;

impl AggregateFunction for Sum {
    fn init(&self) -> AggregateState {
        AggregateState::new(SumState {
            all_whole: true,
            ..SumState::default()
        })
    }

    fn step(&self, state: &mut AggregateState, value: Option<&Term>) {
        let Some(n) = value.and_then(term_to_f64) else {
            return;
        };
        if let Some(acc) = state.downcast_mut::<SumState>() {
            acc.sum += n;
            acc.all_whole &= n.fract() == 0.0;
            acc.count += 1;
        }
    }

    fn finalize(&self, state: AggregateState) -> Option<Term> {
        let acc = state.into_inner::<SumState>()?;
        if acc.count == 0 {
            return integer(0);
        }
        if acc.all_whole && acc.sum.fract() == 0.0 {
            integer(acc.sum as i64)
        } else {
            double(acc.sum)
        }
    }
}

#[derive(Default)]
struct AvgState {
    sum: f64,
    count: usize,
}

/// AVG - numeric average, always a double. Empty groups average to 0.
pub struct Avg;

impl AggregateFunction for Avg {
    fn init(&self) -> AggregateState {
        AggregateState::new(AvgState::default())
    }

    fn step(&self, state: &mut AggregateState, value: Option<&Term>) {
        let Some(n) = value.and_then(term_to_f64) else {
            return;
        };
        if let Some(acc) = state.downcast_mut::<AvgState>() {
            acc.sum += n;
            acc.count += 1;
        }
    }

    fn finalize(&self, state: AggregateState) -> Option<Term> {
        let acc = state.into_inner::<AvgState>()?;
        if acc.count == 0 {
            return integer(0);
        }
        double(acc.sum / acc.count as f64)
    }
}

/// MIN - smallest numeric value by the shared term order, keeping the
/// original term. Unbound when nothing coerces.
pub struct Min;

impl AggregateFunction for Min {
    fn init(&self) -> AggregateState {
        AggregateState::new(None::<Term>)
    }

    fn step(&self, state: &mut AggregateState, value: Option<&Term>) {
        fold_extreme(state, value, std::cmp::Ordering::Less);
    }

    fn finalize(&self, state: AggregateState) -> Option<Term> {
        state.into_inner::<Option<Term>>().flatten()
    }
}

/// MAX - largest numeric value by the shared term order.
pub struct Max;

impl AggregateFunction for Max {
    fn init(&self) -> AggregateState {
        AggregateState::new(None::<Term>)
    }

    fn step(&self, state: &mut AggregateState, value: Option<&Term>) {
        fold_extreme(state, value, std::cmp::Ordering::Greater);
    }

    fn finalize(&self, state: AggregateState) -> Option<Term> {
        state.into_inner::<Option<Term>>().flatten()
    }
}

fn fold_extreme(state: &mut AggregateState, value: Option<&Term>, keep: std::cmp::Ordering) {
    let Some(term) = value else { return };
    if term_to_f64(term).is_none() {
        return;
    }
    if let Some(best) = state.downcast_mut::<Option<Term>>() {
        match best {
            Some(current) if compare_terms(term, current) != keep => {}
            _ => *best = Some(term.clone()),
        }
    }
}

/// GROUP_CONCAT - join lexical values with a separator.
///
/// Literals contribute their lexical value, IRIs their string form;
/// blank nodes are skipped. An empty group concatenates to the empty
/// string.
pub struct GroupConcat {
    separator: Arc<str>,
}

impl GroupConcat {
    pub fn new(separator: impl Into<Arc<str>>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl AggregateFunction for GroupConcat {
    fn init(&self) -> AggregateState {
        AggregateState::new(Vec::<String>::new())
    }

    fn step(&self, state: &mut AggregateState, value: Option<&Term>) {
        let piece = match value {
            Some(Term::Literal(lit)) => lit.value().to_string(),
            Some(Term::Iri(iri)) => iri.as_str().to_string(),
            Some(Term::Blank(_)) | None => return,
        };
        if let Some(pieces) = state.downcast_mut::<Vec<String>>() {
            pieces.push(piece);
        }
    }

    fn finalize(&self, state: AggregateState) -> Option<Term> {
        let pieces = state.into_inner::<Vec<String>>()?;
        Some(Term::Literal(Literal::simple(
            pieces.join(&self.separator),
        )))
    }
}

/// SAMPLE - the first bound value encountered, unbound if none.
///
/// SAMPLE DISTINCT behaves identically: deduplication cannot change
/// which value comes first.
pub struct Sample;

impl AggregateFunction for Sample {
    fn init(&self) -> AggregateState {
        AggregateState::new(None::<Term>)
    }

    fn step(&self, state: &mut AggregateState, value: Option<&Term>) {
        let Some(term) = value else { return };
        if let Some(first) = state.downcast_mut::<Option<Term>>() {
            if first.is_none() {
                *first = Some(term.clone());
            }
        }
    }

    fn finalize(&self, state: AggregateState) -> Option<Term> {
        state.into_inner::<Option<Term>>().flatten()
    }
}

// ============================================================================
// Extended built-ins (IRI-addressed)
// ============================================================================

fn push_number(state: &mut AggregateState, value: Option<&Term>) {
    let Some(n) = value.and_then(term_to_f64) else {
        return;
    };
    if let Some(numbers) = state.downcast_mut::<Vec<f64>>() {
        numbers.push(n);
    }
}

fn sorted_numbers(state: AggregateState) -> Option<Vec<f64>> {
    let mut numbers = state.into_inner::<Vec<f64>>()?;
    numbers.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Some(numbers)
}

/// agg:median - middle numeric value; even-sized groups average the
/// two middle elements. Empty groups yield the literal "0".
pub struct Median;

impl AggregateFunction for Median {
    fn init(&self) -> AggregateState {
        AggregateState::new(Vec::<f64>::new())
    }

    fn step(&self, state: &mut AggregateState, value: Option<&Term>) {
        push_number(state, value);
    }

    fn finalize(&self, state: AggregateState) -> Option<Term> {
        let numbers = sorted_numbers(state)?;
        if numbers.is_empty() {
            return zero_literal();
        }
        let len = numbers.len();
        let median = if len % 2 == 0 {
            (numbers[len / 2 - 1] + numbers[len / 2]) / 2.0
        } else {
            numbers[len / 2]
        };
        double(median)
    }
}

fn population_variance(numbers: &[f64]) -> f64 {
    let n = numbers.len() as f64;
    let mean = numbers.iter().sum::<f64>() / n;
    numbers.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n
}

/// agg:variance - population variance. Empty and single-value groups
/// yield the literal "0".
pub struct Variance;

impl AggregateFunction for Variance {
    fn init(&self) -> AggregateState {
        AggregateState::new(Vec::<f64>::new())
    }

    fn step(&self, state: &mut AggregateState, value: Option<&Term>) {
        push_number(state, value);
    }

    fn finalize(&self, state: AggregateState) -> Option<Term> {
        let numbers = state.into_inner::<Vec<f64>>()?;
        if numbers.len() <= 1 {
            return zero_literal();
        }
        double(population_variance(&numbers))
    }
}

/// agg:stddev - population standard deviation.
pub struct StdDev;

impl AggregateFunction for StdDev {
    fn init(&self) -> AggregateState {
        AggregateState::new(Vec::<f64>::new())
    }

    fn step(&self, state: &mut AggregateState, value: Option<&Term>) {
        push_number(state, value);
    }

    fn finalize(&self, state: AggregateState) -> Option<Term> {
        let numbers = state.into_inner::<Vec<f64>>()?;
        if numbers.len() <= 1 {
            return zero_literal();
        }
        double(population_variance(&numbers).sqrt())
    }
}

#[derive(Default)]
struct ModeState {
    counts: HashMap<Term, usize>,
    order: Vec<Term>,
}

/// agg:mode - most frequent value by term equality, ties broken by
/// first encountered. An empty group yields a single-space literal,
/// the placeholder for "no value" in a non-empty lexical form.
pub struct Mode;

impl AggregateFunction for Mode {
    fn init(&self) -> AggregateState {
        AggregateState::new(ModeState::default())
    }

    fn step(&self, state: &mut AggregateState, value: Option<&Term>) {
        let Some(term) = value else { return };
        if let Some(acc) = state.downcast_mut::<ModeState>() {
            let count = acc.counts.entry(term.clone()).or_insert(0);
            if *count == 0 {
                acc.order.push(term.clone());
            }
            *count += 1;
        }
    }

    fn finalize(&self, state: AggregateState) -> Option<Term> {
        let acc = state.into_inner::<ModeState>()?;
        if acc.order.is_empty() {
            return Some(Term::Literal(Literal::simple(" ")));
        }
        let mut best: Option<(&Term, usize)> = None;
        for term in &acc.order {
            let count = acc.counts.get(term).copied().unwrap_or(0);
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((term, count));
            }
        }
        best.map(|(term, _)| term.clone())
    }
}

/// agg:percentileN - linear-interpolation percentile for N in 0..=100.
///
/// For sorted values of length n the rank is `N/100 * (n-1)`,
/// interpolated between the floor and ceil indices, which makes
/// percentile0 and percentile100 the minimum and maximum. Empty
/// groups yield the literal "0".
pub struct Percentile {
    pct: u32,
}

impl Percentile {
    pub fn new(pct: u32) -> Self {
        debug_assert!(pct <= 100, "percentile out of range");
        Self { pct }
    }
}

impl AggregateFunction for Percentile {
    fn init(&self) -> AggregateState {
        AggregateState::new(Vec::<f64>::new())
    }

    fn step(&self, state: &mut AggregateState, value: Option<&Term>) {
        push_number(state, value);
    }

    fn finalize(&self, state: AggregateState) -> Option<Term> {
        let numbers = sorted_numbers(state)?;
        if numbers.is_empty() {
            return zero_literal();
        }
        let rank = (self.pct as f64 / 100.0) * (numbers.len() - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        let value = if lo == hi {
            numbers[lo]
        } else {
            numbers[lo] + (numbers[hi] - numbers[lo]) * (rank - lo as f64)
        };
        double(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Term {
        Term::Literal(Literal::integer(n))
    }

    fn text(s: &str) -> Term {
        Term::Literal(Literal::simple(s))
    }

    /// Drive an aggregate over a value sequence; `None` entries stand
    /// for unbound inputs.
    fn run(function: &dyn AggregateFunction, values: &[Option<Term>]) -> Option<Term> {
        let mut state = function.init();
        for value in values {
            function.step(&mut state, value.as_ref());
        }
        function.finalize(state)
    }

    fn as_number(result: &Option<Term>) -> f64 {
        let term = result.as_ref().expect("expected a bound result");
        term_to_f64(term).expect("expected a numeric result")
    }

    fn bound(values: &[i64]) -> Vec<Option<Term>> {
        values.iter().map(|n| Some(int(*n))).collect()
    }

    #[test]
    fn count_skips_unbound() {
        let values = vec![Some(int(1)), None, Some(int(2)), None, Some(int(3))];
        assert_eq!(run(&Count, &values), Some(int(3)));
    }

    #[test]
    fn count_all_counts_every_row() {
        let values = vec![Some(int(1)), None, Some(int(2)), None];
        assert_eq!(run(&CountAll, &values), Some(int(4)));
        assert_eq!(run(&CountAll, &[]), Some(int(0)));
    }

    #[test]
    fn sum_of_whole_values_is_an_integer() {
        assert_eq!(run(&Sum, &bound(&[10, 20, 30])), Some(int(60)));
    }

    #[test]
    fn sum_with_a_fractional_value_is_a_double() {
        let values = vec![Some(int(10)), Some(Term::Literal(Literal::double(20.5)))];
        let result = run(&Sum, &values);
        assert_eq!(result, Some(Term::Literal(Literal::double(30.5))));
    }

    #[test]
    fn sum_skips_non_numeric_values() {
        let values = vec![Some(int(1)), Some(text("abc")), Some(int(2))];
        assert_eq!(run(&Sum, &values), Some(int(3)));
    }

    #[test]
    fn sum_of_empty_group_is_zero() {
        assert_eq!(run(&Sum, &[]), Some(int(0)));
        assert_eq!(run(&Sum, &[Some(text("abc"))]), Some(int(0)));
    }

    #[test]
    fn avg_is_a_double() {
        let result = run(&Avg, &bound(&[10, 20, 30]));
        assert_eq!(as_number(&result), 20.0);
        assert_eq!(run(&Avg, &[]), Some(int(0)));
    }

    #[test]
    fn min_max_keep_original_terms() {
        let values = bound(&[30, 10, 20]);
        assert_eq!(run(&Min, &values), Some(int(10)));
        assert_eq!(run(&Max, &values), Some(int(30)));
    }

    #[test]
    fn min_over_empty_group_is_unbound() {
        assert_eq!(run(&Min, &[]), None);
        assert_eq!(run(&Max, &[Some(text("abc"))]), None);
    }

    #[test]
    fn group_concat_joins_with_separator() {
        let values = vec![Some(text("a")), Some(text("b")), Some(text("c"))];
        let result = run(&GroupConcat::new(", "), &values);
        assert_eq!(result, Some(text("a, b, c")));
    }

    #[test]
    fn group_concat_default_space_and_empty_group() {
        let values = vec![Some(text("a")), None, Some(int(2))];
        assert_eq!(run(&GroupConcat::new(" "), &values), Some(text("a 2")));
        assert_eq!(run(&GroupConcat::new(" "), &[]), Some(text("")));
    }

    #[test]
    fn sample_returns_first_bound_value() {
        let values = vec![None, Some(int(42)), Some(int(99))];
        assert_eq!(run(&Sample, &values), Some(int(42)));
        assert_eq!(run(&Sample, &[None, None]), None);
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(as_number(&run(&Median, &bound(&[10, 20, 30]))), 20.0);
        assert_eq!(as_number(&run(&Median, &bound(&[1, 2, 3, 4]))), 2.5);
    }

    #[test]
    fn median_of_empty_group_is_zero_literal() {
        assert_eq!(run(&Median, &[]), Some(text("0")));
    }

    #[test]
    fn variance_and_stddev_population() {
        let values = bound(&[2, 4, 4, 4, 5, 5, 7, 9]);
        assert_eq!(as_number(&run(&Variance, &values)), 4.0);
        assert_eq!(as_number(&run(&StdDev, &values)), 2.0);
    }

    #[test]
    fn variance_of_empty_or_single_is_zero_literal() {
        assert_eq!(run(&Variance, &[]), Some(text("0")));
        assert_eq!(run(&Variance, &bound(&[7])), Some(text("0")));
        assert_eq!(run(&StdDev, &bound(&[7])), Some(text("0")));
    }

    #[test]
    fn mode_breaks_ties_by_first_encountered() {
        let values = vec![
            Some(text("b")),
            Some(text("a")),
            Some(text("a")),
            Some(text("b")),
            Some(text("c")),
        ];
        // a and b both appear twice; b came first
        assert_eq!(run(&Mode, &values), Some(text("b")));
    }

    #[test]
    fn mode_of_empty_group_is_single_space() {
        assert_eq!(run(&Mode, &[]), Some(text(" ")));
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let result = run(&Percentile::new(25), &bound(&[1, 2, 3, 4, 5, 6, 7, 8]));
        assert_eq!(as_number(&result), 2.75);

        let result = run(
            &Percentile::new(90),
            &bound(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]),
        );
        assert!((as_number(&result) - 9.1).abs() < 1e-9);
    }

    #[test]
    fn percentile_endpoints_are_min_and_max() {
        let values = bound(&[5, 1, 9, 3]);
        assert_eq!(as_number(&run(&Percentile::new(0), &values)), 1.0);
        assert_eq!(as_number(&run(&Percentile::new(100), &values)), 9.0);
    }

    #[test]
    fn percentile_of_empty_group_is_zero_literal() {
        assert_eq!(run(&Percentile::new(50), &[]), Some(text("0")));
    }
}
