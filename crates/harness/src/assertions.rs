//! Expected-vs-actual checks
//!
//! Pure functions: they read nothing but their arguments and report a
//! mismatch as a typed [`HarnessError`].

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{HarnessError, HarnessResult};

static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s*(-?[0-9][0-9,]*(?:\.[0-9]+)?)").expect("valid price regex"));

static BARE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9][0-9,]*(?:\.[0-9]+)?$").expect("valid number regex"));

static NON_ALNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]").expect("valid regex"));

/// Largest gap between an item sum and a displayed total still treated as equal
pub const CART_TOTAL_TOLERANCE: f64 = 0.01;

/// Parse currency text into an exact decimal.
///
/// Accepts `$29.99`, `Item total: $39.98` or a bare `29.99`. Thousands
/// separators are ignored.
pub fn parse_price(text: &str) -> HarnessResult<Decimal> {
    let trimmed = text.trim();
    let number = match PRICE_RE.captures(trimmed) {
        Some(caps) => caps[1].to_string(),
        None if BARE_NUMBER_RE.is_match(trimmed) => trimmed.to_string(),
        None => {
            return Err(HarnessError::assertion(format!(
                "no price found in '{}'",
                trimmed
            )))
        }
    };
    Decimal::from_str(&number.replace(',', ""))
        .map_err(|e| HarnessError::assertion(format!("invalid price '{}': {}", trimmed, e)))
}

/// Exact decimal equality; `29.99` and `29.990` are equal, `29.99` and `30.00` are not
pub fn assert_price_eq(item: &str, expected: Decimal, actual: Decimal) -> HarnessResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(HarnessError::PriceMismatch {
            item: item.to_string(),
            expected,
            actual,
        })
    }
}

/// Compare a sum of prices against a displayed total within [`CART_TOTAL_TOLERANCE`]
pub fn assert_cart_total(label: &str, expected: Decimal, actual: Decimal) -> HarnessResult<()> {
    let expected_f = expected.to_f64().unwrap_or(f64::NAN);
    let actual_f = actual.to_f64().unwrap_or(f64::NAN);
    if (expected_f - actual_f).abs() < CART_TOTAL_TOLERANCE {
        Ok(())
    } else {
        Err(HarnessError::assertion(format!(
            "{} mismatch: expected ${}, got ${}",
            label, expected, actual
        )))
    }
}

/// Lower-case and drop every character that is not `a-z` or `0-9`
pub fn normalize_text(text: &str) -> String {
    NON_ALNUM_RE
        .replace_all(&text.to_lowercase(), "")
        .into_owned()
}

/// Containment after [`normalize_text`] on both sides
pub fn assert_normalized_contains(expected: &str, actual: &str) -> HarnessResult<()> {
    if normalize_text(actual).contains(&normalize_text(expected)) {
        Ok(())
    } else {
        Err(HarnessError::assertion(format!(
            "expected text '{}' not found in '{}'",
            expected, actual
        )))
    }
}

/// Plain substring containment
pub fn assert_text_contains(expected: &str, actual: &str) -> HarnessResult<()> {
    if actual.contains(expected) {
        Ok(())
    } else {
        Err(HarnessError::assertion(format!(
            "Expected error message '{}' not found in '{}'",
            expected, actual
        )))
    }
}

/// Equality after trimming surrounding whitespace
pub fn assert_text_eq(expected: &str, actual: &str) -> HarnessResult<()> {
    if actual.trim() == expected.trim() {
        Ok(())
    } else {
        Err(HarnessError::DescriptionMismatch {
            expected: expected.to_string(),
            actual: actual.trim().to_string(),
        })
    }
}

/// Threshold precedence: case override, then per-user value, then default
pub fn response_threshold(case_override: Option<u64>, user_threshold: u64) -> u64 {
    case_override.unwrap_or(user_threshold)
}

pub fn assert_response_time(measured_ms: u64, threshold_ms: u64) -> HarnessResult<()> {
    if measured_ms <= threshold_ms {
        Ok(())
    } else {
        Err(HarnessError::PerformanceThresholdExceeded {
            measured_ms,
            threshold_ms,
        })
    }
}

pub fn assert_count(what: &str, expected: usize, actual: usize) -> HarnessResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(HarnessError::assertion(format!(
            "{} should have {} items, found {}",
            what, expected, actual
        )))
    }
}

pub fn assert_at_least(what: &str, minimum: usize, actual: usize) -> HarnessResult<()> {
    if actual >= minimum {
        Ok(())
    } else {
        Err(HarnessError::assertion(format!(
            "{} should contain at least {} items, found {}",
            what, minimum, actual
        )))
    }
}

pub fn assert_visible(what: &str, visible: bool) -> HarnessResult<()> {
    if visible {
        Ok(())
    } else {
        Err(HarnessError::assertion(format!("{} should be visible", what)))
    }
}

/// Absent and hidden both count as not visible
pub fn assert_not_visible(what: &str, visible: bool) -> HarnessResult<()> {
    if visible {
        Err(HarnessError::assertion(format!("{} should not be visible", what)))
    } else {
        Ok(())
    }
}

/// Error-path check: the indicator must be shown and, when an expected
/// message is given, contain it. Returns the displayed message.
pub fn assert_error_shown(
    indicator_visible: bool,
    message: Option<&str>,
    expected: Option<&str>,
) -> HarnessResult<String> {
    if !indicator_visible {
        return Err(HarnessError::ExpectedErrorNotShown {
            expected: expected.map(str::to_string),
        });
    }
    let message = message.unwrap_or_default().to_string();
    if let Some(expected) = expected {
        assert_text_contains(expected, &message)?;
    }
    Ok(message)
}
