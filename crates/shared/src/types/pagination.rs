//! List limits for listing endpoints.

use serde::{Deserialize, Serialize};

/// Query parameters for bounded listings, newest first.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ListRequest {
    /// Requested number of items.
    pub limit: Option<u64>,
}

/// Default and ceiling for one kind of listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListBounds {
    /// Limit used when none is requested.
    pub default: u64,
    /// Largest limit a caller may request.
    pub max: u64,
}

impl ListBounds {
    /// Invoice listings.
    pub const INVOICES: Self = Self { default: 25, max: 100 };
    /// Current-account statements.
    pub const CURRENT_ACCOUNT: Self = Self { default: 100, max: 300 };
    /// Cash movement listings.
    pub const CASH: Self = Self { default: 50, max: 200 };
    /// Product and quote listings.
    pub const CATALOG: Self = Self { default: 25, max: 100 };
    /// Customer and lead listings.
    pub const CUSTOMERS: Self = Self { default: 50, max: 200 };
}

impl ListRequest {
    /// Resolves the effective limit: the default when absent, never zero,
    /// never above the ceiling.
    #[must_use]
    pub fn resolve(&self, bounds: ListBounds) -> u64 {
        self.limit.unwrap_or(bounds.default).clamp(1, bounds.max)
    }
}

/// Response wrapper for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    /// The items, newest first.
    pub data: Vec<T>,
    /// Limit that was applied.
    pub limit: u64,
}

impl<T> ListResponse<T> {
    /// Creates a new listing response.
    #[must_use]
    pub fn new(data: Vec<T>, limit: u64) -> Self {
        Self { data, limit }
    }
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod tests;
