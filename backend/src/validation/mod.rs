//! Validate-or-null rules for identifier, code and category columns.
//!
//! A [`Validator`] pairs a [`Predicate`] with a [`Fallback`]. Each present
//! value is tested (after coercion to text where the predicate is textual);
//! values that fail are either replaced by a corrected value or become
//! missing. Missing values stay missing.
//!
//! Every entity registers its checks as a list of [`ColumnRule`]s which
//! [`apply_rules`] evaluates uniformly.
//!
//! # Example
//!
//! ```rust,ignore
//! use centralise::validation::{ColumnRule, Validator, apply_rules};
//!
//! let rules = vec![
//!     ColumnRule::new("country_code", Validator::one_of(COUNTRY_CODES)
//!         .or_correct(&[("GB", "GB")])),
//!     ColumnRule::new("month", Validator::in_range(1..=12)),
//! ];
//! let outcomes = apply_rules(&mut table, &rules)?;
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::RangeInclusive;

use crate::error::CleanResult;
use crate::table::{Cell, Field, Table};

/// Canonical UUID shape: 8-4-4-4-12 lowercase hex groups.
pub static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$")
        .expect("uuid pattern compiles")
});

/// Test applied to a present value.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Text form matches the (anchored) pattern.
    Matches(Regex),
    /// Text form is one of a closed set.
    OneOf(&'static [&'static str]),
    /// Value coerces to a whole number inside the range.
    InRange(RangeInclusive<i64>),
    /// Value is already integer typed. No coercion.
    IsInteger,
}

impl Predicate {
    pub fn check(&self, cell: &Cell) -> bool {
        match self {
            Predicate::Matches(re) => re.is_match(&cell.to_text()),
            Predicate::OneOf(set) => set.contains(&cell.to_text().as_str()),
            Predicate::InRange(range) => whole_number(cell).is_some_and(|n| range.contains(&n)),
            Predicate::IsInteger => matches!(cell, Cell::Int(_)),
        }
    }
}

/// What replaces a value that fails its predicate.
#[derive(Debug, Clone, Copy)]
pub enum Fallback {
    /// The value becomes missing.
    Missing,
    /// The first `(needle, replacement)` whose needle occurs in the text form
    /// wins; without a hit the value becomes missing.
    Correct(&'static [(&'static str, &'static str)]),
}

impl Fallback {
    fn resolve(&self, cell: &Cell) -> Field {
        match self {
            Fallback::Missing => None,
            Fallback::Correct(pairs) => {
                let text = cell.to_text();
                pairs
                    .iter()
                    .find(|(needle, _)| text.contains(needle))
                    .map(|(_, replacement)| Cell::text(*replacement))
            }
        }
    }
}

/// Outcome of validating one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Kept,
    Corrected,
    Rejected,
    Missing,
}

/// A predicate with its fallback policy.
#[derive(Debug, Clone)]
pub struct Validator {
    pub predicate: Predicate,
    pub fallback: Fallback,
}

impl Validator {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            fallback: Fallback::Missing,
        }
    }

    /// Regex validator over an already compiled pattern.
    pub fn pattern(re: &Regex) -> Self {
        Self::new(Predicate::Matches(re.clone()))
    }

    pub fn uuid() -> Self {
        Self::pattern(&UUID_RE)
    }

    pub fn one_of(set: &'static [&'static str]) -> Self {
        Self::new(Predicate::OneOf(set))
    }

    pub fn in_range(range: RangeInclusive<i64>) -> Self {
        Self::new(Predicate::InRange(range))
    }

    pub fn integer() -> Self {
        Self::new(Predicate::IsInteger)
    }

    /// Correct failures by substring instead of nulling them.
    pub fn or_correct(mut self, pairs: &'static [(&'static str, &'static str)]) -> Self {
        self.fallback = Fallback::Correct(pairs);
        self
    }

    /// Validate one field, returning the new field and what happened.
    pub fn judge(&self, field: Field) -> (Field, Verdict) {
        match field {
            None => (None, Verdict::Missing),
            Some(cell) if self.predicate.check(&cell) => (Some(cell), Verdict::Kept),
            Some(cell) => match self.fallback.resolve(&cell) {
                Some(fixed) => (Some(fixed), Verdict::Corrected),
                None => (None, Verdict::Rejected),
            },
        }
    }

    pub fn apply(&self, field: Field) -> Field {
        self.judge(field).0
    }
}

/// A validator bound to a column.
#[derive(Debug, Clone)]
pub struct ColumnRule {
    pub column: &'static str,
    pub validator: Validator,
}

impl ColumnRule {
    pub fn new(column: &'static str, validator: Validator) -> Self {
        Self { column, validator }
    }
}

/// Per-column tally from [`apply_rules`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub column: &'static str,
    pub corrected: usize,
    pub rejected: usize,
}

/// Apply every rule to its column, in order.
///
/// Fails only if a column is absent from the table.
pub fn apply_rules(table: &mut Table, rules: &[ColumnRule]) -> CleanResult<Vec<RuleOutcome>> {
    let mut outcomes = Vec::with_capacity(rules.len());

    for rule in rules {
        let mut outcome = RuleOutcome {
            column: rule.column,
            corrected: 0,
            rejected: 0,
        };
        table.map_column(rule.column, |field| {
            let (field, verdict) = rule.validator.judge(field);
            match verdict {
                Verdict::Corrected => outcome.corrected += 1,
                Verdict::Rejected => outcome.rejected += 1,
                Verdict::Kept | Verdict::Missing => {}
            }
            field
        })?;
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

/// Whole number a cell coerces to, if any. `"7"`, `7` and `7.0` all give 7.
pub fn whole_number(cell: &Cell) -> Option<i64> {
    integer_value(cell, false)
}

/// Integer a numeric or numeric-text cell coerces to.
///
/// Fractional values give `None`, or with `truncate` are cut toward zero
/// (`"2.7"` gives 2).
pub fn integer_value(cell: &Cell, truncate: bool) -> Option<i64> {
    let value = match cell {
        Cell::Int(n) => return Some(*n),
        Cell::Float(f) => *f,
        Cell::Text(s) => s.trim().parse::<f64>().ok()?,
        Cell::Bool(_) | Cell::Date(_) | Cell::Time(_) => return None,
    };
    if !value.is_finite() || value.abs() >= i64::MAX as f64 {
        return None;
    }
    if truncate {
        Some(value.trunc() as i64)
    } else if value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}
