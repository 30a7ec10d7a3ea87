//! Default shelf life per item category.
//!
//! The offset table is configuration supplied from outside (a JSON document);
//! only the lookup rule lives here: a category missing from the table gets the
//! same offset as `"other"`, which itself defaults to the fallback offset.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use larder_core::{DomainError, DomainResult};

use crate::item::ItemDraft;

/// Offset used for any category absent from the table when `"other"` has no
/// entry either.
pub const DEFAULT_FALLBACK_DAYS: u32 = 7;

/// Table entry consulted for categories without one of their own.
pub const OTHER_CATEGORY: &str = "other";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryPolicy {
    #[serde(default)]
    offsets: BTreeMap<String, u32>,
    #[serde(default = "default_fallback_days")]
    fallback_days: u32,
}

fn default_fallback_days() -> u32 {
    DEFAULT_FALLBACK_DAYS
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            offsets: BTreeMap::new(),
            fallback_days: DEFAULT_FALLBACK_DAYS,
        }
    }
}

impl ExpiryPolicy {
    pub fn new(offsets: BTreeMap<String, u32>, fallback_days: u32) -> Self {
        Self {
            offsets,
            fallback_days,
        }
    }

    /// Parse a table such as `{"offsets": {"dairy": 5}, "fallbackDays": 7}`.
    pub fn from_json_str(raw: &str) -> DomainResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| DomainError::validation(format!("invalid expiry table: {e}")))
    }

    pub fn with_offset(mut self, category: impl Into<String>, days: u32) -> Self {
        self.offsets.insert(category.into(), days);
        self
    }

    pub fn fallback_days(&self) -> u32 {
        self.fallback_days
    }

    /// Shelf life in days for `category` (exact label match), else the
    /// `"other"` entry, else the fallback.
    pub fn offset_days(&self, category: &str) -> u32 {
        self.offsets
            .get(category)
            .or_else(|| self.offsets.get(OTHER_CATEGORY))
            .copied()
            .unwrap_or(self.fallback_days)
    }

    /// `today + offset_days(category)`.
    pub fn default_expiry_date(&self, category: &str, today: NaiveDate) -> NaiveDate {
        today
            .checked_add_days(Days::new(u64::from(self.offset_days(category))))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Same as [`default_expiry_date`](Self::default_expiry_date), formatted
    /// `YYYY-MM-DD`.
    pub fn default_expiry(&self, category: &str, today: NaiveDate) -> String {
        format_date(self.default_expiry_date(category, today))
    }

    /// Give a draft without an expiry date its category default.
    pub fn fill_default_expiry(&self, draft: &mut ItemDraft, today: NaiveDate) {
        if draft.expiry_date.trim().is_empty() {
            draft.expiry_date = self.default_expiry(&draft.item_category, today);
        }
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(raw: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| DomainError::validation(format!("invalid date '{raw}': {e}")))
}

/// Signed number of days from `today` until a stored expiry date (negative
/// once expired).
pub fn days_until_expiry(expiry_date: &str, today: NaiveDate) -> DomainResult<i64> {
    let expiry = parse_date(expiry_date)?;
    Ok(expiry.signed_duration_since(today).num_days())
}
