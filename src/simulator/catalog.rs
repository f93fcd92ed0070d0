//! The product catalog a simulator mutates.

use super::error::SimulatorError;
use crate::model::{Product, ProductId};
use std::collections::HashSet;

/// Ordered, externally seeded set of products.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Validates seed data: ids must be unique and prices finite and non-negative.
    pub fn new(products: Vec<Product>) -> Result<Self, SimulatorError> {
        let mut seen = HashSet::with_capacity(products.len());
        for product in &products {
            if !seen.insert(product.id) {
                return Err(SimulatorError::InvalidCatalog(format!(
                    "duplicate product id {}",
                    product.id
                )));
            }
            if !product.price.is_finite() || product.price < 0.0 {
                return Err(SimulatorError::InvalidCatalog(format!(
                    "product {} has invalid price {}",
                    product.id, product.price
                )));
            }
        }
        Ok(Self { products })
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: ProductId) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id)
    }

    pub(crate) fn at_mut(&mut self, index: usize) -> Option<&mut Product> {
        self.products.get_mut(index)
    }

    /// Products whose name or brand contains `term`, ignoring case. An empty term matches all.
    pub fn search(&self, term: &str) -> Vec<Product> {
        self.products
            .iter()
            .filter(|p| p.matches(term))
            .cloned()
            .collect()
    }

    /// Number of products with zero stock.
    pub fn currently_oos(&self) -> usize {
        self.products.iter().filter(|p| p.is_out_of_stock()).count()
    }
}
