//! Composite account references (`itemId_accountId`)

use crate::common::error::{GatewayError, Result};

pub const REFERENCE_DELIMITER: char = '_';

/// Account id, optionally qualified by the item it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeAccountRef {
    pub item_id: Option<String>,
    pub account_id: String,
}

impl CompositeAccountRef {
    /// Split at the first delimiter; both sides must be non-empty when it is present
    pub fn parse(id: &str) -> Result<Self> {
        match id.split_once(REFERENCE_DELIMITER) {
            Some((item_id, account_id)) => {
                if item_id.is_empty() || account_id.is_empty() {
                    return Err(GatewayError::MalformedReference(id.to_string()));
                }
                Ok(Self {
                    item_id: Some(item_id.to_string()),
                    account_id: account_id.to_string(),
                })
            }
            None => Ok(Self {
                item_id: None,
                account_id: id.to_string(),
            }),
        }
    }
}
