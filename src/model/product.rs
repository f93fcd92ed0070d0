use serde::{Deserialize, Serialize};

/// Identifier of a catalog product.
pub type ProductId = u32;

/// A product on the shelf, as seen by the inventory simulator.
///
/// Products are seeded from outside the simulator and never created or removed by it.
/// Only `stock` changes over time, through simulated sales or explicit adjustments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub price: f64,
    pub stock: u32,
}

impl Product {
    /// Creates a new Product instance.
    ///
    /// # Arguments
    /// * `id` - Unique identifier within the catalog
    /// * `name` - Product name
    /// * `brand` - Brand shown next to the name
    /// * `price` - Unit price, must be finite and non-negative
    /// * `stock` - Units currently on the shelf
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        brand: impl Into<String>,
        price: f64,
        stock: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            brand: brand.into(),
            price,
            stock,
        }
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }

    /// Case-insensitive substring match on name or brand.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term) || self.brand.to_lowercase().contains(&term)
    }
}
