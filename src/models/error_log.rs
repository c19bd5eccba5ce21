//! Error log model and its listing criteria.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::{
    CacheKey, ColumnOptions, ContentQuery, Listable, QueryCriteria, Rule, SortValue, StatusFlag,
};

use super::BulkAction;

/// A captured application error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ErrorLog {
    pub id: i64,
    pub description: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ErrorLog {
    pub const ACTIONS: &'static [BulkAction] = &[BulkAction::Delete];
}

impl Listable for ErrorLog {
    const ORDER_FIELDS: &'static [&'static str] = &["id", "createdAt", "url"];
    const DEFAULT_ORDER: &'static str = "createdAt desc";

    fn id(&self) -> i64 {
        self.id
    }

    // error logs have no slug
    fn slug(&self) -> &str {
        ""
    }

    fn title(&self) -> &str {
        &self.description
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn status(&self, _flag: StatusFlag) -> Option<bool> {
        None
    }

    fn search_columns(&self) -> Vec<&str> {
        vec![&self.description[..], &self.url[..]]
    }

    fn sort_value(&self, field: &str) -> SortValue {
        match field {
            "createdAt" => SortValue::Time(self.created_at),
            "url" => SortValue::text(&self.url),
            _ => SortValue::Int(self.id),
        }
    }

    fn project(self, columns: ColumnOptions) -> Self {
        match columns {
            ColumnOptions::Profile => self,
            ColumnOptions::List => Self {
                stack_trace: None,
                ..self
            },
            ColumnOptions::Dropdown => Self {
                id: self.id,
                description: self.description,
                ..Default::default()
            },
        }
    }
}

/// Listing criteria for error logs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ErrorLogQuery {
    #[serde(flatten)]
    pub base: QueryCriteria,
    /// Substring of the failing URL
    pub url: String,
}

impl ContentQuery for ErrorLogQuery {
    type Record = ErrorLog;

    const NAMESPACE: &'static str = "errorlogs";

    fn base(&self) -> &QueryCriteria {
        &self.base
    }

    fn base_mut(&mut self) -> &mut QueryCriteria {
        &mut self.base
    }

    fn rules() -> Vec<Rule<Self>> {
        vec![Rule::new("url", |q| !q.url.trim().is_empty(), |q, r| {
            r.url
                .to_lowercase()
                .contains(&q.url.trim().to_lowercase())
        })]
    }

    fn key_parts(&self, key: &mut CacheKey) {
        key.push_text(&self.url.trim().to_lowercase());
    }
}
