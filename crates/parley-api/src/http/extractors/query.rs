//! Query parameter extractors for list and owner-scoped endpoints.

use serde::Deserialize;

use parley_core::repository::Page;

/// Identifies the acting user on endpoints without a JSON body.
#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub external_id: String,
}

/// Query parameters for paginated chat listing.
#[derive(Debug, Deserialize)]
pub struct ChatListQuery {
    pub external_id: String,
    /// Maximum results.
    pub limit: Option<i64>,
    /// Offset for pagination.
    pub offset: Option<i64>,
}

impl ChatListQuery {
    pub fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }
}
