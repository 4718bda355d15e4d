//! Shopping cart for digital study resources.

pub mod catalog;
pub mod store;

pub use catalog::{catalog, find_product};
pub use store::CartStore;

use crate::contact::is_valid_email;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("No product with id {0:?}")]
    UnknownProduct(String),
    #[error("{0:?} is not in the cart")]
    NotInCart(String),
    #[error("Please add items to your cart before proceeding to checkout.")]
    EmptyCart,
    #[error("Invalid customer details: {0}")]
    InvalidCustomer(String),
    #[error("Cart file {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to serialize cart: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    Maths,
    Physics,
    #[default]
    General,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Display price such as `£19.99`; absent for free resources.
    #[serde(rename = "price", default, skip_serializing_if = "Option::is_none")]
    pub price_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_price: Option<f64>,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
}

impl Product {
    pub fn unit_price(&self) -> f64 {
        if self.is_free {
            0.0
        } else {
            self.numeric_price.unwrap_or(0.0)
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    pub fn subtotal(&self) -> f64 {
        self.product.unit_price() * f64::from(self.quantity)
    }
}

/// Items in the order they were first added.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub full_name: String,
    pub email: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer: Customer,
    pub items: Vec<CartItem>,
    pub total: f64,
    pub placed_at: DateTime<Utc>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds one unit, or bumps the quantity if the product is already here.
    pub fn add(&mut self, product: Product) {
        match self.items.iter_mut().find(|i| i.product.id == product.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(1),
            None => self.items.push(CartItem {
                product,
                quantity: 1,
            }),
        }
    }

    /// A quantity of zero removes the item.
    pub fn update_quantity(&mut self, product_id: &str, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return self
                .remove(product_id)
                .map(|_| ())
                .ok_or_else(|| CartError::NotInCart(product_id.to_string()));
        }
        let item = self
            .items
            .iter_mut()
            .find(|i| i.product.id == product_id)
            .ok_or_else(|| CartError::NotInCart(product_id.to_string()))?;
        item.quantity = quantity;
        Ok(())
    }

    pub fn remove(&mut self, product_id: &str) -> Option<CartItem> {
        let index = self.items.iter().position(|i| i.product.id == product_id)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.items.iter().any(|i| i.product.id == product_id)
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Places the order and empties the cart.
    pub fn checkout(&mut self, customer: Customer) -> Result<Order, CartError> {
        if self.is_empty() {
            return Err(CartError::EmptyCart);
        }
        if customer.full_name.trim().is_empty() {
            return Err(CartError::InvalidCustomer("full name is required".into()));
        }
        if !is_valid_email(&customer.email) {
            return Err(CartError::InvalidCustomer(format!(
                "{:?} is not a valid email address",
                customer.email
            )));
        }

        let placed_at = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            order_number: format!("ORD-{}", placed_at.timestamp_millis()),
            total: self.total(),
            items: std::mem::take(&mut self.items),
            customer,
            placed_at,
        };
        info!(
            order = %order.order_number,
            items = order.items.len(),
            total = order.total,
            "Order placed"
        );
        debug!(customer = ?order.customer, "Checkout data");
        Ok(order)
    }
}
