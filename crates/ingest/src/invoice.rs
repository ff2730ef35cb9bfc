use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use basket_core::TransactionStore;

use crate::error::IngestError;

/// One line-item of an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    #[serde(alias = "InvoiceNo")]
    pub invoice: String,
    #[serde(alias = "Description")]
    pub item: String,
    #[serde(alias = "Quantity")]
    pub quantity: i64,
}

/// Invoice records, either JSON-lines (one [`InvoiceLine`] per line) or
/// CSV with a header row naming at least `InvoiceNo`, `Description` and
/// `Quantity` (the retail export layout; other columns are ignored).
///
/// Quantities are summed per (invoice, item) and an item is in the
/// invoice's basket iff its total is positive, so returns cancel out
/// purchases. Every invoice becomes a transaction, even one whose basket
/// ends up empty. Transactions keep first-seen invoice order.
pub struct InvoiceImporter;

impl InvoiceImporter {
    pub fn import(path: &Path) -> Result<TransactionStore, IngestError> {
        let text = std::fs::read_to_string(path).map_err(|e| IngestError::io(path, e))?;
        let store = Self::parse(&text)?;
        info!(
            path = %path.display(),
            invoices = store.len(),
            items = store.universe().len(),
            "Invoice lines loaded"
        );
        Ok(store)
    }

    pub fn parse(text: &str) -> Result<TransactionStore, IngestError> {
        let mut lines = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let line: InvoiceLine = serde_json::from_str(raw).map_err(|source| IngestError::Json {
                line: idx + 1,
                source,
            })?;
            lines.push(line);
        }
        Ok(Self::group(&lines))
    }

    pub fn import_csv(path: &Path) -> Result<TransactionStore, IngestError> {
        let file = std::fs::File::open(path).map_err(|e| IngestError::io(path, e))?;
        let store = Self::parse_csv(file)?;
        info!(
            path = %path.display(),
            invoices = store.len(),
            items = store.universe().len(),
            "Invoice CSV loaded"
        );
        Ok(store)
    }

    /// Read CSV rows by header name; quoted fields may contain the delimiter.
    pub fn parse_csv<R: Read>(reader: R) -> Result<TransactionStore, IngestError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(reader);
        let lines = rdr
            .deserialize::<InvoiceLine>()
            .collect::<Result<Vec<_>, csv::Error>>()?;
        Ok(Self::group(&lines))
    }

    /// Collapse invoice lines into one basket per invoice.
    pub fn group(lines: &[InvoiceLine]) -> TransactionStore {
        let mut invoices: IndexMap<&str, IndexMap<&str, i64>> = IndexMap::new();
        for line in lines {
            let item = line.item.trim();
            let quantities = invoices.entry(line.invoice.trim()).or_default();
            if item.is_empty() {
                continue;
            }
            *quantities.entry(item).or_insert(0) += line.quantity;
        }

        debug!(lines = lines.len(), invoices = invoices.len(), "Grouped invoice lines");

        let baskets = invoices.values().map(|quantities| {
            quantities
                .iter()
                .filter(|(_, qty)| **qty > 0)
                .map(|(&item, _)| item.to_owned())
                .collect::<Vec<String>>()
        });
        TransactionStore::from_baskets(baskets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
{"invoice": "536365", "item": "WHITE HANGING HEART", "quantity": 6}
{"invoice": "536365", "item": "WHITE METAL LANTERN", "quantity": 6}
{"invoice": "536366", "item": "HAND WARMER", "quantity": 6}
{"invoice": "536366", "item": "HAND WARMER", "quantity": -6}
{"invoice": "536367", "item": "WHITE HANGING HEART", "quantity": 2}
{"invoice": "536367", "item": "WHITE HANGING HEART", "quantity": 1}
"#;

    #[test]
    fn groups_lines_by_invoice() {
        let store = InvoiceImporter::parse(SAMPLE).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.transactions()[0].len(), 2);
        // Returned in full: empty basket, still a transaction.
        assert!(store.transactions()[1].is_empty());
        assert_eq!(store.transactions()[2].len(), 1);
        // The cancelled item never appears in a basket, so it is not in the universe either.
        assert!(store.universe().id_of("HAND WARMER").is_none());
    }

    #[test]
    fn accepts_retail_column_names() {
        let store = InvoiceImporter::parse(
            r#"{"InvoiceNo": "1", "Description": "MUG", "Quantity": 3}"#,
        )
        .unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.universe().id_of("MUG").is_some());
    }

    const RETAIL_CSV: &str = "\
InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country
536365,85123A,WHITE HANGING HEART T-LIGHT HOLDER,6,12/1/10 8:26,2.55,17850,United Kingdom
536365,71053,\"LANTERN, WHITE METAL\",6,12/1/10 8:26,3.39,17850,United Kingdom
536366,22633,HAND WARMER UNION JACK,6,12/1/10 8:28,1.85,17850,United Kingdom
C536366,22633,HAND WARMER UNION JACK,-6,12/1/10 8:29,1.85,17850,United Kingdom
536367,22745,\"LANTERN, WHITE METAL\",2,12/1/10 8:34,3.39,13047,United Kingdom
";

    #[test]
    fn parses_retail_csv_with_quoted_commas() {
        let store = InvoiceImporter::parse_csv(RETAIL_CSV.as_bytes()).unwrap();
        // Cancellation rows carry their own invoice number.
        assert_eq!(store.len(), 4);
        assert_eq!(store.universe().len(), 3);
        let lantern = store.universe().id_of("LANTERN, WHITE METAL").unwrap();
        assert!(store.transactions()[0].contains(lantern));
        assert!(store.transactions()[3].contains(lantern));
        assert!(store.transactions()[2].is_empty());
    }

    #[test]
    fn imports_csv_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(RETAIL_CSV.as_bytes()).unwrap();
        let store = InvoiceImporter::import_csv(file.path()).unwrap();
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn csv_without_quantity_column_is_rejected() {
        let err = InvoiceImporter::parse_csv("InvoiceNo,Description\n1,MUG\n".as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::Csv(_)));
    }

    #[test]
    fn reports_the_failing_line() {
        let err = InvoiceImporter::parse("{\"invoice\": \"1\", \"item\": \"a\", \"quantity\": 1}\nnot json")
            .unwrap_err();
        match err {
            IngestError::Json { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
