//! Category model and its listing criteria.
//!
//! Categories form a tree through `parent_id` (0 = root). The record itself is flat;
//! nested views are derived by the tree module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::{
    CacheKey, ColumnOptions, ContentQuery, Listable, QueryCriteria, Rule, SortValue, StatusFlag,
};

use super::BulkAction;

/// A category node as stored: no children, only a parent reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    /// 0 until the server assigns one
    pub id: i64,
    /// 0 for root categories
    pub parent_id: i64,
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: i64,
    pub category_type: i64,
    pub is_enabled: bool,
    /// Number of direct children on the server when the record was listed
    pub child_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub const ACTIONS: &'static [BulkAction] = &[
        BulkAction::Enable,
        BulkAction::Disable,
        BulkAction::High,
        BulkAction::Medium,
        BulkAction::Low,
        BulkAction::Delete,
    ];

    pub fn is_root(&self) -> bool {
        self.parent_id == 0
    }
}

impl Listable for Category {
    const ORDER_FIELDS: &'static [&'static str] = &["id", "title", "priority", "createdAt"];
    const DEFAULT_ORDER: &'static str = "priority asc";

    fn id(&self) -> i64 {
        self.id
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn status(&self, flag: StatusFlag) -> Option<bool> {
        match flag {
            StatusFlag::Enabled => Some(self.is_enabled),
            _ => None,
        }
    }

    fn search_columns(&self) -> Vec<&str> {
        vec![&self.title[..], &self.slug[..]]
    }

    fn sort_value(&self, field: &str) -> SortValue {
        match field {
            "title" => SortValue::text(&self.title),
            "priority" => SortValue::Int(self.priority),
            "createdAt" => SortValue::Time(self.created_at),
            _ => SortValue::Int(self.id),
        }
    }

    fn project(self, columns: ColumnOptions) -> Self {
        match columns {
            ColumnOptions::Profile => self,
            ColumnOptions::List => Self {
                description: None,
                ..self
            },
            ColumnOptions::Dropdown => Self {
                id: self.id,
                parent_id: self.parent_id,
                title: self.title,
                ..Default::default()
            },
        }
    }
}

/// Listing criteria for categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryQuery {
    #[serde(flatten)]
    pub base: QueryCriteria,
    /// `Some(0)` selects root categories; `None` leaves the parent unconstrained
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    pub category_type: i64,
}

impl CategoryQuery {
    /// Every direct child of `parent_id`, as the tree loads them.
    pub fn children_of(parent_id: i64) -> Self {
        Self {
            base: QueryCriteria {
                load_all: true,
                advance_filter: true,
                ..Default::default()
            },
            parent_id: Some(parent_id),
            ..Default::default()
        }
    }
}

impl ContentQuery for CategoryQuery {
    type Record = Category;

    const NAMESPACE: &'static str = "categories";

    fn base(&self) -> &QueryCriteria {
        &self.base
    }

    fn base_mut(&mut self) -> &mut QueryCriteria {
        &mut self.base
    }

    fn rules() -> Vec<Rule<Self>> {
        vec![
            Rule::new("parentId", |q| q.parent_id.is_some(), |q, r| {
                q.parent_id == Some(r.parent_id)
            }),
            Rule::new("categoryType", |q| q.category_type > 0, |q, r| {
                r.category_type == q.category_type
            }),
        ]
    }

    fn key_parts(&self, key: &mut CacheKey) {
        key.push_opt(self.parent_id).push(self.category_type);
    }
}
