//! Product catalog lookups and the in-memory shopping cart.

use crate::error::{AppError, Result};
use crate::models::{CartItem, Product};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Products keyed by the serial number encoded in their barcode.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProductCatalog {
    products: HashMap<String, Product>,
}

impl ProductCatalog {
    pub(crate) fn from_products(products: Vec<Product>) -> Self {
        let products = products
            .into_iter()
            .map(|p| (p.serial.trim().to_string(), p))
            .collect();
        Self { products }
    }

    /// Loads a catalog from a JSON array of `{serial, name, price}` objects.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let products: Vec<Product> = serde_json::from_str(&data)?;
        let catalog = Self::from_products(products);
        tracing::info!("Loaded {} products from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub(crate) fn lookup(&self, serial: &str) -> Option<&Product> {
        self.products.get(serial.trim())
    }

    pub(crate) fn len(&self) -> usize {
        self.products.len()
    }
}

#[derive(Debug, Default)]
pub(crate) struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds one unit of `product`, merging with an existing line.
    pub(crate) fn add(&mut self, product: &Product) -> &CartItem {
        let index = match self
            .items
            .iter()
            .position(|item| item.product_id == product.serial)
        {
            Some(index) => {
                self.items[index].quantity += 1;
                index
            }
            None => {
                self.items.push(CartItem {
                    product_id: product.serial.clone(),
                    name: product.name.clone(),
                    price: product.price,
                    quantity: 1,
                });
                self.items.len() - 1
            }
        };
        tracing::debug!(target: "cart", "Cart now holds {} x {}", self.items[index].quantity, product.name);
        &self.items[index]
    }

    /// Looks up a scanned serial in `catalog` and adds the product.
    pub(crate) fn add_scanned(&mut self, catalog: &ProductCatalog, serial: &str) -> Result<&CartItem> {
        let product = catalog
            .lookup(serial)
            .ok_or_else(|| AppError::UnknownProduct(serial.to_string()))?;
        Ok(self.add(product))
    }

    /// Sets the quantity of a line; zero removes it.
    pub(crate) fn set_quantity(&mut self, product_id: &str, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return self.remove(product_id).map(|_| ());
        }
        let item = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
            .ok_or_else(|| AppError::NotInCart(product_id.to_string()))?;
        item.quantity = quantity;
        Ok(())
    }

    pub(crate) fn remove(&mut self, product_id: &str) -> Result<CartItem> {
        let index = self
            .items
            .iter()
            .position(|item| item.product_id == product_id)
            .ok_or_else(|| AppError::NotInCart(product_id.to_string()))?;
        Ok(self.items.remove(index))
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }

    pub(crate) fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Total number of units across all lines.
    pub(crate) fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub(crate) fn total(&self) -> f64 {
        self.items.iter().map(CartItem::line_total).sum()
    }
}
