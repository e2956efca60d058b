//! Subscription records and the validated values that flow into and out of the store.

use chrono::{DateTime, Datelike, Days, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

// ###################################
// ->   STRUCTS
// ###################################
/// A row of the `subscriptions` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Subscription {
    pub id: i64,
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
    pub is_active: bool,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Everything needed to insert a subscription. The timestamp is set by the store.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub email: SubscriberEmail,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Normalized (trimmed, lowercased) subscriber email.
/// Validation is deliberately loose: non-empty, contains `@` and `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberEmail(String);

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SubscriberEmail {
    pub fn parse<S>(value: S) -> Result<Self, EmailError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref().trim().to_lowercase();

        if value.is_empty() {
            return Err(EmailError::Empty);
        }
        if value.graphemes(true).count() > 256 {
            return Err(EmailError::TooLong);
        }
        if !value.contains('@') || !value.contains('.') {
            return Err(EmailError::Invalid);
        }

        Ok(SubscriberEmail(value))
    }
}

/// Counts over the whole table. `inactive` is derived so `total == active + inactive` holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
}

impl Stats {
    pub fn new(total: i64, active: i64) -> Self {
        Stats {
            total,
            active,
            inactive: total - active,
        }
    }
}

/// Admin list filters. Every `None` means "don't filter on this".
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    pub is_active: Option<bool>,
    pub subscribed_since: Option<DateTime<Utc>>,
    /// Case-insensitive substring matched against email and IP address.
    pub search: Option<String>,
}

/// The date ranges offered by the admin list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum DateRange {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "past_7_days")]
    Past7Days,
    #[serde(rename = "this_month")]
    ThisMonth,
    #[serde(rename = "this_year")]
    ThisYear,
}

impl DateRange {
    /// Inclusive lower bound of the range relative to `now` (UTC midnight based).
    pub fn lower_bound(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive();
        let first_day = match self {
            DateRange::Today => today,
            DateRange::Past7Days => today - Days::new(7),
            DateRange::ThisMonth => today.with_day(1).unwrap_or(today),
            DateRange::ThisYear => today.with_ordinal(1).unwrap_or(today),
        };

        first_day.and_time(NaiveTime::MIN).and_utc()
    }
}

/// One page of the admin list.
#[derive(Debug, Clone)]
pub struct Listing {
    pub rows: Vec<Subscription>,
    /// Number of rows matching the filter across all pages.
    pub total_matching: i64,
    pub page: u32,
    pub page_count: u32,
}

// ###################################
// ->   ERROR
// ###################################
/// The `Display` output is shown to visitors as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EmailError {
    #[error("Email address is required.")]
    Empty,
    #[error("Please enter a valid email address.")]
    Invalid,
    #[error("Please enter a valid email address.")]
    TooLong,
}
