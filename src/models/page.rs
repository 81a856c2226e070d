//! Pagination, sorting and search parameters for member listings.

use serde::{Deserialize, Serialize};

use super::{GroupMember, MemberField};

/// Default number of members per page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Parameters for one page of members. Pages are zero-based.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<MemberField>,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub search: String,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            sort_field: None,
            sort_order: SortOrder::Asc,
            search: String::new(),
        }
    }
}

impl PageQuery {
    /// Index of the first row on this page.
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.page_size)
    }
}

/// One page of persisted members plus the total for the active filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MemberPage {
    pub members: Vec<GroupMember>,
    pub total_count: usize,
}
