//! Collection naming and the fixed token URI.

use serde::{Deserialize, Serialize};

use crate::chain::TokenId;

/// Name, symbol and metadata URI of a collection.
///
/// Every pass in a collection shares the same URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionMetadata {
    pub name: String,
    pub symbol: String,
    pub token_uri: String,
}

impl CollectionMetadata {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        token_uri: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            token_uri: token_uri.into(),
        }
    }

    /// Returns the URI of `token_id`, or `None` if no such token was issued
    /// given `total_issued` sequential ids starting at 1.
    pub fn uri_for(&self, token_id: TokenId, total_issued: u64) -> Option<&str> {
        (1..=total_issued)
            .contains(&token_id)
            .then_some(self.token_uri.as_str())
    }
}
