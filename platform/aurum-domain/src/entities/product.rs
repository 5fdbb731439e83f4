use crate::value_objects::quote::ProductId;
use serde::{Deserialize, Serialize};

/// Catalog entry; the foreign-key target of every persisted quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
}
