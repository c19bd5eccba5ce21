//! Listing criteria shared by every content type.
//!
//! A criteria value is a bag of optional filters. Every filter has an "unset"
//! sentinel (empty string, zero, [`FilterState::All`], [`DateFilter::All`]) and only
//! filters holding a real value contribute to the compiled predicate.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Tri-state status filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterState {
    Disabled,
    Enabled,
    #[default]
    All,
}

impl FilterState {
    pub fn is_set(self) -> bool {
        self != FilterState::All
    }

    /// The flag value a record must carry to pass, `None` for `All`.
    pub fn wanted(self) -> Option<bool> {
        match self {
            FilterState::Disabled => Some(false),
            FilterState::Enabled => Some(true),
            FilterState::All => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterState::Disabled => "disabled",
            FilterState::Enabled => "enabled",
            FilterState::All => "all",
        }
    }
}

/// Status flags a record may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFlag {
    Enabled,
    Approved,
    Draft,
    Archived,
}

/// Named creation-date ranges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateFilter {
    #[default]
    All,
    Today,
    ThisWeek,
    ThisMonth,
    ThisYear,
    Last7Days,
    Last30Days,
}

impl DateFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            DateFilter::All => "all",
            DateFilter::Today => "today",
            DateFilter::ThisWeek => "thisWeek",
            DateFilter::ThisMonth => "thisMonth",
            DateFilter::ThisYear => "thisYear",
            DateFilter::Last7Days => "last7Days",
            DateFilter::Last30Days => "last30Days",
        }
    }

    /// Resolve to a half-open `[start, end)` window ending after `now`.
    pub fn range(self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let today = Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN));
        let end = today + Duration::days(1);
        let start = match self {
            DateFilter::All => return None,
            DateFilter::Today => today,
            DateFilter::ThisWeek => {
                today - Duration::days(i64::from(now.weekday().num_days_from_monday()))
            }
            DateFilter::ThisMonth => today - Duration::days(i64::from(now.day0())),
            DateFilter::ThisYear => today - Duration::days(i64::from(now.ordinal0())),
            DateFilter::Last7Days => end - Duration::days(7),
            DateFilter::Last30Days => end - Duration::days(30),
        };
        Some((start, end))
    }
}

/// Which fields populate listed records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnOptions {
    /// Summary fields only
    #[default]
    List,
    /// Id and title only, for selectors
    Dropdown,
    /// Every field, including expensive ones
    Profile,
}

impl ColumnOptions {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnOptions::List => "list",
            ColumnOptions::Dropdown => "dropdown",
            ColumnOptions::Profile => "profile",
        }
    }
}

/// Base criteria fields shared by every content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryCriteria {
    pub page_number: i64,
    pub page_size: i64,
    pub load_all: bool,
    /// Field + direction, e.g. `"createdAt desc"`; empty uses the type's default
    pub order: String,
    pub id: i64,
    pub slug: String,
    pub slug_started_with: String,
    pub is_enabled: FilterState,
    pub is_approved: FilterState,
    pub is_draft: FilterState,
    pub is_archived: FilterState,
    pub date_filter: DateFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    pub term: String,
    pub advance_filter: bool,
    pub is_cache: bool,
    pub skip_record_stats: bool,
    pub column_options: ColumnOptions,
}

impl Default for QueryCriteria {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
            load_all: false,
            order: String::new(),
            id: 0,
            slug: String::new(),
            slug_started_with: String::new(),
            is_enabled: FilterState::All,
            is_approved: FilterState::All,
            is_draft: FilterState::All,
            is_archived: FilterState::All,
            date_filter: DateFilter::All,
            start_date: None,
            end_date: None,
            term: String::new(),
            advance_filter: false,
            is_cache: false,
            skip_record_stats: false,
            column_options: ColumnOptions::List,
        }
    }
}

impl QueryCriteria {
    /// Reject criteria that must never be silently corrected.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.page_size <= 0 {
            return Err(AppError::InvalidArgument(format!(
                "pageSize must be positive, got {}",
                self.page_size
            )));
        }
        if self.page_number < 1 {
            return Err(AppError::InvalidArgument(format!(
                "pageNumber must be at least 1, got {}",
                self.page_number
            )));
        }
        if self.date_filter != DateFilter::All
            && (self.start_date.is_some() || self.end_date.is_some())
        {
            return Err(AppError::InvalidArgument(
                "dateFilter cannot be combined with startDate/endDate".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(AppError::InvalidArgument(
                    "startDate must not be after endDate".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Trim text filters and lower-case the search term.
    pub fn normalize(&mut self) {
        self.term = self.term.trim().to_lowercase();
        self.slug = self.slug.trim().to_string();
        self.slug_started_with = self.slug_started_with.trim().to_string();
        self.order = self.order.split_whitespace().collect::<Vec<_>>().join(" ");
    }

    /// Direct single-record lookup; every other filter is bypassed.
    pub fn is_lookup(&self) -> bool {
        self.id > 0
    }

    /// Detail lookups (by id or slug) always receive every column.
    pub fn effective_columns(&self) -> ColumnOptions {
        if self.is_lookup() || !self.slug.trim().is_empty() {
            ColumnOptions::Profile
        } else {
            self.column_options
        }
    }

    pub fn is_paginated(&self) -> bool {
        !self.is_lookup() && !self.load_all
    }

    /// Number of records skipped before the requested page.
    pub fn offset(&self) -> usize {
        usize::try_from((self.page_number - 1).saturating_mul(self.page_size)).unwrap_or(0)
    }

    /// Replace a named date range by the explicit `[start, end)` window it denotes.
    pub fn resolve_dates(&mut self, now: DateTime<Utc>) {
        if let Some((start, end)) = self.date_filter.range(now) {
            self.start_date = Some(start);
            self.end_date = Some(end);
            self.date_filter = DateFilter::All;
        }
    }
}
