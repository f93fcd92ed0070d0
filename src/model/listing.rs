//! Read models served by the backend listing endpoints.
//!
//! These are deliberately separate from [`Product`](super::Product) and
//! [`OosEvent`](super::OosEvent): the backend inventory carries `sku`/`location`
//! where the simulator catalog carries `brand`/`price`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of `GET /api/inventory`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryListingItem {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub quantity: i64,
    pub location: String,
}

/// One row of `GET /api/events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(rename = "itemId", default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}

/// Orders entries newest first, the way the event log is displayed.
pub fn sort_event_log(entries: &mut [EventLogEntry]) {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
