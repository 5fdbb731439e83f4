use aurum_domain::entities::product::Product;
use aurum_domain::repositories::quote_store::{QuoteStore, StoreError};
use aurum_domain::value_objects::quote::{ProductId, Quote};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
struct MemoryState {
    schema_ready: bool,
    products: BTreeMap<ProductId, String>,
    quotes: HashMap<ProductId, Vec<Quote>>,
    rows: usize,
}

/// Process-local quote store with the same contract as the Postgres adapter:
/// inserts require a known catalog product, and the latest row wins ties by
/// insertion order.
#[derive(Debug, Default)]
pub struct InMemoryQuoteStore {
    state: RwLock<MemoryState>,
}

impl InMemoryQuoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn quotes_for(&self, product_id: ProductId) -> Vec<Quote> {
        self.state
            .read()
            .quotes
            .get(&product_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn products(&self) -> Vec<Product> {
        self.state
            .read()
            .products
            .iter()
            .map(|(id, name)| Product {
                id: *id,
                name: name.clone(),
            })
            .collect()
    }
}

impl QuoteStore for InMemoryQuoteStore {
    fn ensure_schema(&self, catalog: &[Product]) -> Result<(), StoreError> {
        let mut state = self.state.write();
        state.schema_ready = true;
        for product in catalog {
            state.products.insert(product.id, product.name.clone());
        }
        Ok(())
    }

    fn insert(&self, quote: &Quote) -> Result<(), StoreError> {
        let mut state = self.state.write();
        if !state.schema_ready {
            return Err(StoreError::Insert("schema not initialized".to_string()));
        }
        if !state.products.contains_key(&quote.product_id) {
            return Err(StoreError::Insert(format!(
                "unknown product id {}",
                quote.product_id
            )));
        }
        state
            .quotes
            .entry(quote.product_id)
            .or_default()
            .push(quote.clone());
        state.rows += 1;
        Ok(())
    }

    fn latest_quote(&self, product_id: ProductId) -> Result<Quote, StoreError> {
        let state = self.state.read();
        state
            .quotes
            .get(&product_id)
            .and_then(|rows| {
                // max_by_key keeps the last maximum, matching `ORDER BY observed_at DESC, id DESC`.
                rows.iter().max_by_key(|quote| quote.observed_at)
            })
            .cloned()
            .ok_or(StoreError::NotFound(product_id))
    }
}
