use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of the shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: Uuid,
    pub text: String,
    pub is_checked: bool,
    /// Creation-order rank; tie-breaker for the display order.
    pub original_index: usize,
}

impl ChecklistItem {
    pub fn new(text: impl Into<String>, original_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            is_checked: false,
            original_index,
        }
    }

    /// Display order: unchecked before checked, then ascending `original_index`.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        (self.is_checked, self.original_index).cmp(&(other.is_checked, other.original_index))
    }
}
