//! Deduplicating log of out-of-stock events.

use super::error::SimulatorError;
use crate::model::{OosEvent, Product, ProductId};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Records stock-outs, most recent first.
///
/// At most one unresolved event exists per product. Events are never removed;
/// only their `resolved` flag changes.
#[derive(Debug, Clone, Default)]
pub struct OosEventLogger {
    events: Vec<OosEvent>,
    sequence: u64,
}

impl OosEventLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events, most recent first.
    pub fn events(&self) -> &[OosEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn unresolved_for(&self, product_id: ProductId) -> Option<&OosEvent> {
        self.events
            .iter()
            .find(|e| e.product_id == product_id && !e.resolved)
    }

    pub fn unresolved_count(&self) -> usize {
        self.events.iter().filter(|e| !e.resolved).count()
    }

    /// Logs a stock-out for `product` unless one is already outstanding.
    ///
    /// Returns the new event, or `None` when suppressed as a duplicate.
    pub fn record(&mut self, product: &Product, at: DateTime<Utc>) -> Option<OosEvent> {
        if let Some(existing) = self.unresolved_for(product.id) {
            debug!(product_id = product.id, event_id = %existing.id, "Stock-out already logged");
            return None;
        }

        let event = OosEvent {
            id: format!("oos-{}-{}", at.timestamp_millis(), self.sequence),
            product_id: product.id,
            product_name: product.name.clone(),
            timestamp: at,
            resolved: false,
        };
        self.sequence += 1;
        info!(product_id = product.id, event_id = %event.id, "Stock-out logged");
        self.events.insert(0, event.clone());
        Some(event)
    }

    /// Marks one event resolved. Returns `false` if it already was.
    pub fn resolve(&mut self, event_id: &str) -> Result<bool, SimulatorError> {
        let event = self
            .events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| SimulatorError::UnknownEvent(event_id.to_string()))?;
        if event.resolved {
            return Ok(false);
        }
        event.resolved = true;
        info!(event_id, product_id = event.product_id, "Stock-out resolved");
        Ok(true)
    }

    /// Resolves every outstanding event for a product, returning their ids.
    pub fn resolve_product(&mut self, product_id: ProductId) -> Vec<String> {
        let mut resolved = Vec::new();
        for event in self
            .events
            .iter_mut()
            .filter(|e| e.product_id == product_id && !e.resolved)
        {
            event.resolved = true;
            resolved.push(event.id.clone());
        }
        if !resolved.is_empty() {
            info!(product_id, events = ?resolved, "Stock-out resolved by restock");
        }
        resolved
    }
}
