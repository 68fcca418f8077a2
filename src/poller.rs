//! Sandbox Item Poller
//!
//! Re-fetches an item until its status is terminal (UPDATED, OUTDATED or
//! LOGIN_ERROR) or the attempt budget runs out. Waiting between attempts
//! is an async sleep; dropping the future cancels the wait.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::client::PluggyClient;
use crate::common::error::Result;

pub const DEFAULT_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_MAX_TRIES: u32 = 15;

/// Item status as far as the poller cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Pending,
    Updated,
    Outdated,
    LoginError,
}

impl ItemState {
    /// Case-insensitive; anything unrecognized is still pending
    pub fn from_status(status: &str) -> Self {
        match status.to_ascii_uppercase().as_str() {
            "UPDATED" => ItemState::Updated,
            "OUTDATED" => ItemState::Outdated,
            "LOGIN_ERROR" => ItemState::LoginError,
            _ => ItemState::Pending,
        }
    }

    pub fn of(item: &Value) -> Self {
        item.get("status")
            .and_then(Value::as_str)
            .map(Self::from_status)
            .unwrap_or(ItemState::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ItemState::Pending)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    pub interval: Duration,
    pub max_tries: u32,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            max_tries: DEFAULT_MAX_TRIES,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    /// Item reached a terminal state
    Ready { state: ItemState, item: Value },
    /// Budget exhausted; `last` is the final fetched item
    TimedOut { attempts: u32, last: Option<Value> },
}

impl WaitOutcome {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitOutcome::TimedOut { .. })
    }

    /// Response body: the item itself, or `{timeout: true, last}`
    pub fn into_body(self) -> Value {
        match self {
            WaitOutcome::Ready { item, .. } => item,
            WaitOutcome::TimedOut { last, .. } => json!({ "timeout": true, "last": last }),
        }
    }
}

/// Something that can fetch an item by id
#[async_trait]
pub trait ItemSource: Send {
    async fn fetch_item(&mut self, item_id: &str) -> Result<Value>;
}

#[async_trait]
impl ItemSource for PluggyClient {
    async fn fetch_item(&mut self, item_id: &str) -> Result<Value> {
        self.get_item(item_id).await
    }
}

/// Poll `item_id` until it is terminal or `max_tries` attempts were made
///
/// Fetch errors abort the wait. No sleep follows the final attempt.
pub async fn wait_for_item<S>(
    source: &mut S,
    item_id: &str,
    options: &WaitOptions,
) -> Result<WaitOutcome>
where
    S: ItemSource + ?Sized,
{
    let mut last = None;

    for attempt in 1..=options.max_tries {
        let item = source.fetch_item(item_id).await?;
        let state = ItemState::of(&item);

        tracing::debug!(item_id, attempt, ?state, "Polled item");

        if state.is_terminal() {
            tracing::info!(item_id, attempt, ?state, "Item ready");
            return Ok(WaitOutcome::Ready { state, item });
        }
        last = Some(item);

        if attempt < options.max_tries {
            tokio::time::sleep(options.interval).await;
        }
    }

    tracing::warn!(item_id, attempts = options.max_tries, "Timed out waiting for item");
    Ok(WaitOutcome::TimedOut {
        attempts: options.max_tries,
        last,
    })
}
