//! Tag model and its listing criteria.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::{
    CacheKey, ColumnOptions, ContentQuery, Listable, QueryCriteria, Rule, SortValue, StatusFlag,
};

use super::BulkAction;

/// A reusable tag for labelling posts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tag {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub tag_type: i64,
    pub priority: i64,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    pub const ACTIONS: &'static [BulkAction] = &[
        BulkAction::Enable,
        BulkAction::Disable,
        BulkAction::High,
        BulkAction::Medium,
        BulkAction::Low,
        BulkAction::Delete,
    ];
}

impl Listable for Tag {
    const ORDER_FIELDS: &'static [&'static str] = &["id", "title", "priority", "createdAt"];
    const DEFAULT_ORDER: &'static str = "title asc";

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
        vec![&self.title[..]]
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
            ColumnOptions::Dropdown => Self {
                id: self.id,
                title: self.title,
                ..Default::default()
            },
            _ => self,
        }
    }
}

/// Listing criteria for tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TagQuery {
    #[serde(flatten)]
    pub base: QueryCriteria,
    pub tag_type: i64,
}

impl ContentQuery for TagQuery {
    type Record = Tag;

    const NAMESPACE: &'static str = "tags";

    fn base(&self) -> &QueryCriteria {
        &self.base
    }

    fn base_mut(&mut self) -> &mut QueryCriteria {
        &mut self.base
    }

    fn rules() -> Vec<Rule<Self>> {
        vec![Rule::new("tagType", |q| q.tag_type > 0, |q, r| {
            r.tag_type == q.tag_type
        })]
    }

    fn key_parts(&self, key: &mut CacheKey) {
        key.push(self.tag_type);
    }
}
