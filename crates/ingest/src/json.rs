use std::path::Path;

use tracing::info;

use basket_core::TransactionStore;

use crate::error::IngestError;

/// A JSON array of baskets, each an array of item labels.
pub struct JsonImporter;

impl JsonImporter {
    pub fn import(path: &Path) -> Result<TransactionStore, IngestError> {
        let text = std::fs::read_to_string(path).map_err(|e| IngestError::io(path, e))?;
        let store = Self::parse(&text)?;
        info!(
            path = %path.display(),
            transactions = store.len(),
            items = store.universe().len(),
            "JSON baskets loaded"
        );
        Ok(store)
    }

    pub fn parse(text: &str) -> Result<TransactionStore, IngestError> {
        let baskets: Vec<Vec<String>> = serde_json::from_str(text).map_err(|source| IngestError::Json {
            line: source.line(),
            source,
        })?;
        Ok(TransactionStore::from_baskets(baskets))
    }
}
