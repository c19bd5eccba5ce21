//! Bulk action requests.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// A bulk action tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkAction {
    Enable,
    Disable,
    Approve,
    Unapprove,
    Draft,
    Publish,
    Archive,
    Unarchive,
    Featured,
    Unfeatured,
    High,
    Medium,
    Low,
    Delete,
}

impl BulkAction {
    pub fn as_str(self) -> &'static str {
        match self {
            BulkAction::Enable => "enable",
            BulkAction::Disable => "disable",
            BulkAction::Approve => "approve",
            BulkAction::Unapprove => "unapprove",
            BulkAction::Draft => "draft",
            BulkAction::Publish => "publish",
            BulkAction::Archive => "archive",
            BulkAction::Unarchive => "unarchive",
            BulkAction::Featured => "featured",
            BulkAction::Unfeatured => "unfeatured",
            BulkAction::High => "high",
            BulkAction::Medium => "medium",
            BulkAction::Low => "low",
            BulkAction::Delete => "delete",
        }
    }

    /// Column assignment performed by the action; `None` for deletion.
    pub fn assignment(self) -> Option<(&'static str, i64)> {
        match self {
            BulkAction::Enable => Some(("is_enabled", 1)),
            BulkAction::Disable => Some(("is_enabled", 0)),
            BulkAction::Approve => Some(("is_approved", 1)),
            BulkAction::Unapprove => Some(("is_approved", 0)),
            BulkAction::Draft => Some(("is_draft", 1)),
            BulkAction::Publish => Some(("is_draft", 0)),
            BulkAction::Archive => Some(("is_archived", 1)),
            BulkAction::Unarchive => Some(("is_archived", 0)),
            BulkAction::Featured => Some(("is_featured", 1)),
            BulkAction::Unfeatured => Some(("is_featured", 0)),
            BulkAction::High => Some(("priority", 2)),
            BulkAction::Medium => Some(("priority", 1)),
            BulkAction::Low => Some(("priority", 0)),
            BulkAction::Delete => None,
        }
    }
}

impl FromStr for BulkAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = match s.trim().to_ascii_lowercase().as_str() {
            "enable" => BulkAction::Enable,
            "disable" => BulkAction::Disable,
            "approve" => BulkAction::Approve,
            "unapprove" => BulkAction::Unapprove,
            "draft" => BulkAction::Draft,
            "publish" => BulkAction::Publish,
            "archive" => BulkAction::Archive,
            "unarchive" => BulkAction::Unarchive,
            "featured" => BulkAction::Featured,
            "unfeatured" => BulkAction::Unfeatured,
            "high" => BulkAction::High,
            "medium" => BulkAction::Medium,
            "low" => BulkAction::Low,
            "delete" => BulkAction::Delete,
            other => {
                return Err(AppError::InvalidArgument(format!(
                    "Unknown action '{}'",
                    other
                )))
            }
        };
        Ok(action)
    }
}

/// One record targeted by a bulk action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_status: Option<String>,
}

/// Request body for bulk actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    pub records: Vec<ActionRecord>,
    /// Applies to records that carry no tag of their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_status: Option<String>,
}

impl ActionRequest {
    /// Same action for every record.
    pub fn uniform(ids: &[i64], action: BulkAction) -> Self {
        Self {
            records: ids
                .iter()
                .map(|&id| ActionRecord {
                    id,
                    action_status: None,
                })
                .collect(),
            action_status: Some(action.as_str().to_string()),
        }
    }

    /// Resolve every record's action, checking it against `supported`.
    pub fn resolve(&self, supported: &[BulkAction]) -> Result<Vec<(i64, BulkAction)>, AppError> {
        if self.records.is_empty() {
            return Err(AppError::InvalidArgument("No records provided".to_string()));
        }

        self.records
            .iter()
            .map(|record| {
                let tag = record
                    .action_status
                    .as_deref()
                    .or(self.action_status.as_deref())
                    .ok_or_else(|| {
                        AppError::InvalidArgument(format!(
                            "No action given for record {}",
                            record.id
                        ))
                    })?;
                let action: BulkAction = tag.parse()?;
                if !supported.contains(&action) {
                    return Err(AppError::InvalidArgument(format!(
                        "Action '{}' is not supported here",
                        action.as_str()
                    )));
                }
                Ok((record.id, action))
            })
            .collect()
    }
}
