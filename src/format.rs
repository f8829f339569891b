//! Display normalization for values pulled from the affiliate API.
//!
//! Every function here is total: malformed input degrades to a best-effort
//! string instead of an error, so one odd record never breaks a sheet write.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::str::FromStr;
use std::sync::LazyLock;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

pub const DEFAULT_CURRENCY: &str = "USD";

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Render a timestamp in UTC. Unparsable input is returned unchanged.
pub fn format_date(raw: Option<&str>) -> String {
    let Some(trimmed) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return String::new();
    };

    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return datetime
            .with_timezone(&Utc)
            .format(DATETIME_FORMAT)
            .to_string();
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return datetime.format(DATETIME_FORMAT).to_string();
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return date.format(DATE_FORMAT).to_string();
    }

    raw.unwrap_or_default().to_string()
}

/// Render an amount like `-$1,234.50`. Non-numeric input is returned unchanged.
pub fn format_currency(amount: &Value, currency: &str) -> String {
    let parsed = match amount {
        Value::Null => return String::new(),
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        other => return other.to_string(),
    };

    let Some(decimal) = parsed else {
        return value_text(amount).unwrap_or_default();
    };

    let mut rounded = decimal
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .abs();
    rounded.rescale(2);

    let digits = rounded.to_string();
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let sign = if decimal.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    format!(
        "{}{}{}.{}",
        sign,
        currency_prefix(currency),
        group_thousands(whole),
        fraction
    )
}

/// Replace each CR, LF and tab with a space, then trim.
pub fn sanitize_string(value: Option<&str>) -> String {
    value
        .map(|s| s.replace(['\r', '\n', '\t'], " ").trim().to_string())
        .unwrap_or_default()
}

/// Permissive `local@domain.tld` check.
pub fn validate_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

/// Scalar JSON value as text. `None` for null.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Numeric JSON value or numeric string; anything else counts as zero.
pub fn value_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn currency_prefix(currency: &str) -> String {
    let code = currency.trim().to_uppercase();
    match code.as_str() {
        "" | "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" => "¥".to_string(),
        _ => format!("{} ", code),
    }
}

fn group_thousands(whole: &str) -> String {
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
