use super::product::ProductId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded out-of-stock transition for one product.
///
/// Created once per qualifying stock-out; only `resolved` ever changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OosEvent {
    pub id: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
}
