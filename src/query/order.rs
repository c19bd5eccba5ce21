//! Ordering expressions: `"<field> [asc|desc]"`.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::Listable;
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Typed sort key produced by [`Listable::sort_value`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Int(i64),
    Text(String),
    Time(DateTime<Utc>),
}

impl SortValue {
    /// Text keys compare case-insensitively.
    pub fn text(s: &str) -> Self {
        SortValue::Text(s.to_lowercase())
    }
}

/// A parsed, validated ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: &'static str,
    pub direction: Direction,
}

impl OrderBy {
    /// Parse `expr` against `R`'s sortable fields; an empty expression yields the
    /// content type's default order.
    pub fn parse<R: Listable>(expr: &str) -> Result<Self, AppError> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Self::parse_expr::<R>(R::DEFAULT_ORDER);
        }
        Self::parse_expr::<R>(expr)
    }

    fn parse_expr<R: Listable>(expr: &str) -> Result<Self, AppError> {
        let mut parts = expr.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => Direction::Asc,
            Some("desc") => Direction::Desc,
            Some(other) => {
                return Err(AppError::InvalidArgument(format!(
                    "Invalid order direction '{}'",
                    other
                )))
            }
        };
        if parts.next().is_some() {
            return Err(AppError::InvalidArgument(format!(
                "Malformed order expression '{}'",
                expr
            )));
        }

        let wanted = name.replace('_', "").to_ascii_lowercase();
        let field = R::ORDER_FIELDS
            .iter()
            .copied()
            .find(|f| f.to_ascii_lowercase() == wanted)
            .ok_or_else(|| {
                AppError::InvalidArgument(format!("Unknown order field '{}'", name))
            })?;

        Ok(Self { field, direction })
    }

    /// Canonical textual form, used in cache keys.
    pub fn normalized(&self) -> String {
        match self.direction {
            Direction::Asc => format!("{} asc", self.field),
            Direction::Desc => format!("{} desc", self.field),
        }
    }

    /// Stable sort; ties keep ascending id order.
    pub fn sort<R: Listable>(&self, records: &mut [R]) {
        records.sort_by(|a, b| {
            let ord = a.sort_value(self.field).cmp(&b.sort_value(self.field));
            let ord = match self.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
            match ord {
                Ordering::Equal => a.id().cmp(&b.id()),
                other => other,
            }
        });
    }
}
