use chrono::{DateTime, Duration, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::account::AccountId;
use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaleId(pub String);

/// One line of a sale. Product and category names are resolved when the sale
/// is read so analytics never need a second lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub category_name: Option<String>,
    pub quantity: i64,
    pub unit_price: Decimal,
}

impl SaleItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub account_id: AccountId,
    pub total_amount: Decimal,
    pub sale_date: DateTime<Utc>,
    pub payment_method: String,
    pub items: Vec<SaleItem>,
}

/// Half-open `[start, end)` window over sale dates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Everything from UTC midnight of `now` up to and including `now`.
    pub fn today(now: DateTime<Utc>) -> Self {
        let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        Self::new(midnight, now + Duration::seconds(1))
    }

    pub fn trailing_days(now: DateTime<Utc>, days: i64) -> Self {
        Self::new(now - Duration::days(days), now + Duration::seconds(1))
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Renders a stored payment tag such as `credit_card` as `Credit Card`.
pub fn payment_method_label(tag: &str) -> String {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return "Other".to_string();
    }

    trimmed
        .split(['_', '-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{payment_method_label, DateRange};

    #[test]
    fn today_starts_at_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 15, 30, 0).single().expect("valid date");
        let range = DateRange::today(now);

        let morning = Utc.with_ymd_and_hms(2024, 3, 10, 0, 5, 0).single().expect("valid date");
        let yesterday = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 0).single().expect("valid date");
        assert!(range.contains(morning));
        assert!(range.contains(now));
        assert!(!range.contains(yesterday));
    }

    #[test]
    fn trailing_window_covers_requested_days() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).single().expect("valid date");
        let range = DateRange::trailing_days(now, 7);

        let six_days_ago = Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).single().expect("valid date");
        let eight_days_ago =
            Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).single().expect("valid date");
        assert!(range.contains(six_days_ago));
        assert!(!range.contains(eight_days_ago));
    }

    #[test]
    fn payment_tags_render_as_titles() {
        assert_eq!(payment_method_label("credit_card"), "Credit Card");
        assert_eq!(payment_method_label("CASH"), "Cash");
        assert_eq!(payment_method_label("bank-transfer"), "Bank Transfer");
        assert_eq!(payment_method_label("  "), "Other");
    }
}
