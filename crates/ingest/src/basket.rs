use std::path::Path;

use tracing::info;

use basket_core::TransactionStore;

use crate::error::IngestError;

/// Delimited basket text: one transaction per line, items separated by
/// `delimiter`. Labels are trimmed; blank lines and `#` comments are skipped;
/// repeated labels on a line collapse.
pub struct BasketImporter;

impl BasketImporter {
    pub fn import(path: &Path, delimiter: char) -> Result<TransactionStore, IngestError> {
        let text = std::fs::read_to_string(path).map_err(|e| IngestError::io(path, e))?;
        let store = Self::parse(&text, delimiter);
        info!(
            path = %path.display(),
            transactions = store.len(),
            items = store.universe().len(),
            "Basket file loaded"
        );
        Ok(store)
    }

    pub fn parse(text: &str, delimiter: char) -> TransactionStore {
        let baskets = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| {
                line.split(delimiter)
                    .map(str::trim)
                    .filter(|label| !label.is_empty())
                    .map(str::to_owned)
                    .collect::<Vec<String>>()
            });
        TransactionStore::from_baskets(baskets)
    }
}
