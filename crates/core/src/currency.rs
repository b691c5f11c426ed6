//! Currency-aware text formatting for inventory figures.
//!
//! Formatting never alters stored values and never fails: unknown currency
//! codes format as USD and unparseable amounts format as zero.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurrencyCode {
    #[default]
    Usd,
    Inr,
    Eur,
    Gbp,
    Jpy,
    Cad,
    Aud,
}

impl CurrencyCode {
    /// Lenient lookup used for per-account preferences.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "INR" => Self::Inr,
            "EUR" => Self::Eur,
            "GBP" => Self::Gbp,
            "JPY" => Self::Jpy,
            "CAD" => Self::Cad,
            "AUD" => Self::Aud,
            _ => Self::Usd,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Inr => "INR",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Jpy => "JPY",
            Self::Cad => "CAD",
            Self::Aud => "AUD",
        }
    }

    pub fn decimal_places(&self) -> u32 {
        match self {
            Self::Jpy => 0,
            _ => 2,
        }
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

pub fn format_money_symbol(currency: CurrencyCode) -> &'static str {
    match currency {
        CurrencyCode::Usd => "$",
        CurrencyCode::Inr => "₹",
        CurrencyCode::Eur => "€",
        CurrencyCode::Gbp => "£",
        CurrencyCode::Jpy => "¥",
        CurrencyCode::Cad => "C$",
        CurrencyCode::Aud => "A$",
    }
}

pub fn format_currency(amount: Decimal, currency: CurrencyCode) -> String {
    let places = currency.decimal_places();
    let rounded = amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    format!("{}{:.*}", format_money_symbol(currency), places as usize, rounded)
}

/// Formats a raw stored value, coercing anything non-numeric to zero.
pub fn format_currency_raw(raw: &str, currency: CurrencyCode) -> String {
    format_currency(parse_amount(raw), currency)
}

/// Parses a stored numeric value. Invalid input yields zero instead of an error.
pub fn parse_amount(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or(Decimal::ZERO)
}

pub fn format_percent(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}%")
}

/// Share of `part` in `whole` as a one-decimal percentage string.
pub fn format_share(part: usize, whole: usize) -> String {
    if whole == 0 {
        return "0.0%".to_string();
    }
    let share = Decimal::from(part as u64) * Decimal::ONE_HUNDRED / Decimal::from(whole as u64);
    let rounded = share.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.1}%")
}
