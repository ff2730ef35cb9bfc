pub mod basket;
pub mod error;
pub mod invoice;
pub mod json;

use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use basket_core::TransactionStore;

pub use basket::BasketImporter;
pub use error::IngestError;
pub use invoice::{InvoiceImporter, InvoiceLine};
pub use json::JsonImporter;

/// On-disk shape of a transaction file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// One basket per line, items separated by a delimiter.
    Basket { delimiter: char },
    /// JSON array of label arrays.
    Json,
    /// JSON-lines invoice records.
    Invoice,
    /// CSV invoice records with a header row (`InvoiceNo,Description,Quantity,...`).
    InvoiceCsv,
}

impl InputFormat {
    /// Guess from the file extension: `.json` → Json, `.jsonl`/`.ndjson` →
    /// Invoice, `.tsv` → tab baskets, anything else → comma baskets. A `.csv`
    /// file whose first line names invoice and quantity columns is InvoiceCsv.
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("json") => InputFormat::Json,
            Some("jsonl") | Some("ndjson") => InputFormat::Invoice,
            Some("tsv") => InputFormat::Basket { delimiter: '\t' },
            Some("csv") if has_invoice_header(path) => InputFormat::InvoiceCsv,
            _ => InputFormat::Basket { delimiter: ',' },
        }
    }

    /// Parse a format name: `basket`, `tsv`, `json`, `invoice` or `invoice-csv`.
    pub fn from_name(name: &str) -> Result<Self, IngestError> {
        match name.to_ascii_lowercase().as_str() {
            "basket" | "csv" => Ok(InputFormat::Basket { delimiter: ',' }),
            "tsv" => Ok(InputFormat::Basket { delimiter: '\t' }),
            "json" => Ok(InputFormat::Json),
            "invoice" | "jsonl" => Ok(InputFormat::Invoice),
            "invoice-csv" | "invoice_csv" | "retail" => Ok(InputFormat::InvoiceCsv),
            other => Err(IngestError::UnknownFormat(other.to_string())),
        }
    }
}

/// Load a transaction store from `path` in the given format.
pub fn load(path: &Path, format: InputFormat) -> Result<TransactionStore, IngestError> {
    match format {
        InputFormat::Basket { delimiter } => BasketImporter::import(path, delimiter),
        InputFormat::Json => JsonImporter::import(path),
        InputFormat::Invoice => InvoiceImporter::import(path),
        InputFormat::InvoiceCsv => InvoiceImporter::import_csv(path),
    }
}

/// Unreadable files fall through to the basket importer, which reports the error.
fn has_invoice_header(path: &Path) -> bool {
    let Ok(file) = std::fs::File::open(path) else {
        return false;
    };
    let mut first = String::new();
    if BufReader::new(file).read_line(&mut first).is_err() {
        return false;
    }
    let columns: Vec<String> = first
        .split(',')
        .map(|c| c.trim().trim_matches('"').to_ascii_lowercase())
        .collect();
    let has = |names: &[&str]| columns.iter().any(|c| names.contains(&c.as_str()));
    has(&["invoiceno", "invoice"]) && has(&["quantity"])
}
