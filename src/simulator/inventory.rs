//! The synchronous simulator core.
//!
//! [`InventorySimulator`] owns the catalog and the stock-out log. Every mutation is a
//! single `&mut self` call, so a tick is applied completely or not at all. The actor
//! in [`super::actor`] serialises calls onto one task; this type never schedules
//! anything itself.

use super::catalog::Catalog;
use super::context::SimulationContext;
use super::error::SimulatorError;
use super::logger::OosEventLogger;
use crate::model::{OosEvent, Product, ProductId};
use serde::Serialize;
use tracing::{debug, info, warn};

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Nothing to sell from.
    EmptyCatalog,
    /// The chosen product was already out of stock.
    Skipped { product_id: ProductId },
    /// One unit sold, stock remains.
    Sold { product_id: ProductId, remaining: u32 },
    /// The last unit sold. `event` is `None` when an outstanding event suppressed a new one.
    StockedOut {
        product_id: ProductId,
        event: Option<OosEvent>,
    },
}

impl TickOutcome {
    /// Whether the tick changed the catalog.
    pub fn mutated(&self) -> bool {
        matches!(self, TickOutcome::Sold { .. } | TickOutcome::StockedOut { .. })
    }
}

/// Point-in-time view of catalog and log for rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySnapshot {
    pub products: Vec<Product>,
    pub events: Vec<OosEvent>,
    pub currently_oos: usize,
}

/// Catalog, stock-out log and the context ticks draw time and randomness from.
#[derive(Debug)]
pub struct InventorySimulator {
    catalog: Catalog,
    log: OosEventLogger,
    context: SimulationContext,
}

impl InventorySimulator {
    pub fn new(catalog: Catalog, context: SimulationContext) -> Self {
        Self {
            catalog,
            log: OosEventLogger::new(),
            context,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn log(&self) -> &OosEventLogger {
        &self.log
    }

    pub fn set_context(&mut self, context: SimulationContext) {
        self.context = context;
    }

    /// Sells one unit of a uniformly chosen product.
    ///
    /// A product already at zero is left alone. Reaching zero logs a stock-out.
    pub fn tick(&mut self) -> TickOutcome {
        if self.catalog.is_empty() {
            debug!("Tick on empty catalog");
            return TickOutcome::EmptyCatalog;
        }

        let len = self.catalog.len();
        let picked = self.context.select(len);
        if picked >= len {
            warn!(index = picked, len, "Selector returned an index outside the catalog");
        }
        let Some(product) = self.catalog.at_mut(picked % len) else {
            return TickOutcome::EmptyCatalog;
        };

        if product.stock == 0 {
            debug!(product_id = product.id, "Tick skipped, already out of stock");
            return TickOutcome::Skipped {
                product_id: product.id,
            };
        }

        product.stock -= 1;
        let product_id = product.id;
        let remaining = product.stock;
        debug!(product_id, remaining, "Unit sold");

        if remaining > 0 {
            return TickOutcome::Sold {
                product_id,
                remaining,
            };
        }

        let product = product.clone();
        let event = self.log.record(&product, self.context.now());
        TickOutcome::StockedOut { product_id, event }
    }

    /// Adds `delta` to a product's stock, clamping at zero.
    ///
    /// Raising a product from zero resolves its outstanding stock-out; lowering one to
    /// zero logs a new stock-out. Returns the updated product.
    pub fn adjust_stock(
        &mut self,
        product_id: ProductId,
        delta: i64,
    ) -> Result<Product, SimulatorError> {
        let product = self.catalog.get_mut(product_id).ok_or_else(|| {
            warn!(product_id, delta, "Adjustment for unknown product");
            SimulatorError::UnknownProduct(product_id)
        })?;

        let before = product.stock;
        let after = i64::from(before)
            .saturating_add(delta)
            .clamp(0, i64::from(u32::MAX));
        product.stock = u32::try_from(after).unwrap_or(u32::MAX);
        let product = product.clone();
        info!(product_id, delta, before, after = product.stock, "Stock adjusted");

        if before == 0 && product.stock > 0 {
            self.log.resolve_product(product_id);
        } else if before > 0 && product.stock == 0 {
            self.log.record(&product, self.context.now());
        }
        Ok(product)
    }

    /// Marks a logged stock-out resolved by hand. Returns `false` if it already was.
    pub fn resolve(&mut self, event_id: &str) -> Result<bool, SimulatorError> {
        self.log.resolve(event_id)
    }

    pub fn search(&self, term: &str) -> Vec<Product> {
        self.catalog.search(term)
    }

    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            products: self.catalog.products().to_vec(),
            events: self.log.events().to_vec(),
            currently_oos: self.catalog.currently_oos(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::{ManualClock, RandomSelector, ScriptedSelector};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2025, 9, 8, 16, 0, 0).unwrap())
    }

    fn simulator(products: Vec<Product>, script: Vec<usize>) -> InventorySimulator {
        let context = SimulationContext::new(Arc::new(clock()), ScriptedSelector::new(script));
        InventorySimulator::new(Catalog::new(products).unwrap(), context)
    }

    #[test]
    fn last_unit_logs_exactly_one_event_then_skips() {
        let mut sim = simulator(vec![Product::new(1, "Corn Flakes", "Kellogg's", 4.99, 1)], vec![0]);

        match sim.tick() {
            TickOutcome::StockedOut {
                product_id: 1,
                event: Some(event),
            } => {
                assert_eq!(event.product_id, 1);
                assert_eq!(event.product_name, "Corn Flakes");
                assert!(!event.resolved);
            }
            other => panic!("Expected stock-out, got {other:?}"),
        }
        assert_eq!(sim.catalog().get(1).unwrap().stock, 0);
        assert_eq!(sim.log().len(), 1);

        let before = sim.snapshot();
        assert_eq!(sim.tick(), TickOutcome::Skipped { product_id: 1 });
        assert_eq!(sim.snapshot(), before);
    }

    #[test]
    fn sold_reports_remaining_stock() {
        let mut sim = simulator(
            vec![
                Product::new(1, "A", "X", 1.0, 5),
                Product::new(2, "B", "Y", 2.0, 2),
            ],
            vec![1],
        );
        assert_eq!(
            sim.tick(),
            TickOutcome::Sold {
                product_id: 2,
                remaining: 1
            }
        );
        assert_eq!(sim.catalog().get(1).unwrap().stock, 5);
    }

    #[test]
    fn empty_catalog_tick_is_a_no_op() {
        let mut sim = simulator(vec![], vec![0]);
        assert_eq!(sim.tick(), TickOutcome::EmptyCatalog);
    }

    #[test]
    fn random_ticks_never_go_negative_or_double_log() {
        let products = (1..=6)
            .map(|id| Product::new(id, format!("Cereal {id}"), "Brand", 3.0, id % 3))
            .collect();
        let context = SimulationContext::new(Arc::new(clock()), RandomSelector::seeded(7));
        let mut sim = InventorySimulator::new(Catalog::new(products).unwrap(), context);

        for round in 0..200u32 {
            sim.tick();
            if round % 25 == 0 {
                let product_id = (round / 25) % 6 + 1;
                sim.adjust_stock(product_id, 2).unwrap();
            }
            for product in sim.catalog().products() {
                let unresolved = sim
                    .log()
                    .events()
                    .iter()
                    .filter(|e| e.product_id == product.id && !e.resolved)
                    .count();
                assert!(unresolved <= 1, "product {} has {unresolved} open events", product.id);
            }
        }
    }

    #[test]
    fn adjust_clamps_at_zero_and_logs_stock_out() {
        let mut sim = simulator(vec![Product::new(1, "A", "X", 1.0, 3)], vec![0]);
        let product = sim.adjust_stock(1, -10).unwrap();
        assert_eq!(product.stock, 0);
        assert_eq!(sim.log().unresolved_count(), 1);
    }

    #[test]
    fn restock_resolves_outstanding_event() {
        let mut sim = simulator(vec![Product::new(1, "A", "X", 1.0, 1)], vec![0]);
        sim.tick();
        assert_eq!(sim.log().unresolved_count(), 1);

        let product = sim.adjust_stock(1, 4).unwrap();
        assert_eq!(product.stock, 4);
        assert_eq!(sim.log().unresolved_count(), 0);
        assert!(sim.log().events()[0].resolved);

        for _ in 0..4 {
            sim.tick();
        }
        assert_eq!(sim.log().len(), 2);
        assert_eq!(sim.log().unresolved_count(), 1);
    }

    #[test]
    fn extreme_deltas_saturate() {
        let mut sim = simulator(vec![Product::new(1, "A", "X", 1.0, 5)], vec![0]);

        let product = sim.adjust_stock(1, i64::MAX).unwrap();
        assert_eq!(product.stock, u32::MAX);
        assert_eq!(sim.adjust_stock(1, 1).unwrap().stock, u32::MAX);

        let product = sim.adjust_stock(1, i64::MIN).unwrap();
        assert_eq!(product.stock, 0);
        assert_eq!(sim.log().unresolved_count(), 1);
    }

    #[derive(Debug)]
    struct OutOfRange;

    impl crate::simulator::Selector for OutOfRange {
        fn select(&mut self, len: usize) -> usize {
            len + 1
        }
    }

    #[test]
    fn out_of_range_selection_wraps_into_catalog() {
        let context = SimulationContext::new(Arc::new(clock()), OutOfRange);
        let mut sim = InventorySimulator::new(
            Catalog::new(vec![
                Product::new(1, "A", "X", 1.0, 3),
                Product::new(2, "B", "Y", 1.0, 3),
            ])
            .unwrap(),
            context,
        );
        // len + 1 == 3, which wraps to index 1.
        assert_eq!(
            sim.tick(),
            TickOutcome::Sold {
                product_id: 2,
                remaining: 2
            }
        );
    }

    #[test]
    fn adjust_unknown_product_leaves_catalog_unchanged() {
        let mut sim = simulator(vec![Product::new(1, "A", "X", 1.0, 3)], vec![0]);
        let before = sim.snapshot();
        assert_eq!(sim.adjust_stock(42, 1), Err(SimulatorError::UnknownProduct(42)));
        assert_eq!(sim.snapshot(), before);
    }

    #[test]
    fn event_timestamp_comes_from_context_clock() {
        let clock = clock();
        let context = SimulationContext::new(Arc::new(clock.clone()), ScriptedSelector::new([0]));
        let mut sim = InventorySimulator::new(
            Catalog::new(vec![Product::new(1, "A", "X", 1.0, 1)]).unwrap(),
            context,
        );
        clock.advance(chrono::Duration::minutes(3));
        sim.tick();
        assert_eq!(
            sim.log().events()[0].timestamp,
            Utc.with_ymd_and_hms(2025, 9, 8, 16, 3, 0).unwrap()
        );
    }
}
