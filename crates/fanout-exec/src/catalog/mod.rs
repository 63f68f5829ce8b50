use std::fmt;

use fanout_model::TaskIndex;
use rand::Rng;
use serde::{Deserialize, Serialize};

const IMAGES: [&str; 12] = [
    "https://images.unsplash.com/photo-1592750475338-74b7b21085ab?w=300&h=300&fit=crop",
    "https://images.unsplash.com/photo-1549298916-b41d501d3772?w=300&h=300&fit=crop",
    "https://images.unsplash.com/photo-1517336714731-489689fd1ca8?w=300&h=300&fit=crop",
    "https://images.unsplash.com/photo-1606983340126-99ab4feaa64a?w=300&h=300&fit=crop",
    "https://images.unsplash.com/photo-1586023492125-27b2c045efd7?w=300&h=300&fit=crop",
    "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=300&h=300&fit=crop",
    "https://images.unsplash.com/photo-1495474472287-4d71bcdd2085?w=300&h=300&fit=crop",
    "https://images.unsplash.com/photo-1558618666-fcd25c85cd64?w=300&h=300&fit=crop",
    "https://images.unsplash.com/photo-1553062407-98eeb64c6a62?w=300&h=300&fit=crop",
    "https://images.unsplash.com/photo-1493225457124-a3eb161ffa5f?w=300&h=300&fit=crop",
    "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=300&h=300&fit=crop",
    "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=300&h=300&fit=crop",
];

/// Mock product served by the simulated backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// 1-based product id (`task index + 1`).
    pub id: u32,
    pub name: String,
    /// Price in won, always a multiple of 1000.
    pub price: u64,
    pub image: String,
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}₩)", self.name, self.price)
    }
}

/// Lookup table supplying the value of each fulfilled task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog<V> {
    entries: Vec<V>,
}

impl<V> Catalog<V> {
    pub fn new(entries: Vec<V>) -> Self {
        Self { entries }
    }

    pub fn get(&self, index: TaskIndex) -> Option<&V> {
        self.entries.get(index.get())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> FromIterator<V> for Catalog<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Catalog<Product> {
    /// `count` products with random prices between 1 000 and 40 000 won.
    pub fn products<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        (0..count)
            .map(|i| Product {
                id: i as u32 + 1,
                name: format!("Product {}", i + 1),
                price: rng.gen_range(1..=40u64) * 1_000,
                image: IMAGES[i % IMAGES.len()].to_string(),
            })
            .collect()
    }
}
