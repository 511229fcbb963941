//! CSV input reader for product rows.
//!
//! Column headers are matched loosely (case, spaces and punctuation ignored)
//! so exports with different spellings of the same column load unchanged.

use std::io::Read;
use std::path::Path;

use crate::models::source_item::SourceItem;

const PRODUCT_HEADERS: &[&str] = &["productname", "product", "name"];
const BRAND_HEADERS: &[&str] = &["brand", "brandname"];
const CATEGORY_HEADERS: &[&str] = &["category", "productcategory"];
const ID_HEADERS: &[&str] = &["id", "productid"];
const IMAGE_HEADERS: &[&str] = &["imageurl", "image", "imagelink"];

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV has no {0} column")]
    MissingColumn(&'static str),
}

#[derive(Debug, Default)]
struct ColumnMap {
    product: Option<usize>,
    brand: Option<usize>,
    category: Option<usize>,
    id: Option<usize>,
    image_url: Option<usize>,
}

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Index of the first header matching any alias; aliases are tried in order.
fn find_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| headers.iter().position(|h| h == alias))
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        Self {
            product: find_column(&normalized, PRODUCT_HEADERS),
            brand: find_column(&normalized, BRAND_HEADERS),
            category: find_column(&normalized, CATEGORY_HEADERS),
            id: find_column(&normalized, ID_HEADERS),
            image_url: find_column(&normalized, IMAGE_HEADERS),
        }
    }
}

/// Load source items from a CSV file.
pub fn load_items(path: &Path) -> Result<Vec<SourceItem>, InputError> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    read_items(file)
}

/// Read source items from any CSV source. Rows without a product name are skipped.
pub fn read_items<R: Read>(reader: R) -> Result<Vec<SourceItem>, InputError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = ColumnMap::from_headers(csv_reader.headers()?);
    let product_col = columns.product.ok_or(InputError::MissingColumn("product name"))?;
    if columns.brand.is_none() {
        tracing::warn!("CSV has no brand column, brand names will be empty");
    }

    let mut items = Vec::new();
    for (index, row) in csv_reader.records().enumerate() {
        let row = row?;
        let cell = |col: Option<usize>| col.and_then(|i| row.get(i)).filter(|v| !v.is_empty());

        let Some(product) = cell(Some(product_col)) else {
            tracing::warn!(row = index + 1, "Skipping row without a product name");
            continue;
        };

        items.push(SourceItem::new(
            cell(columns.id),
            product,
            cell(columns.brand).unwrap_or_default(),
            cell(columns.category),
            cell(columns.image_url),
        ));
    }

    tracing::info!(count = items.len(), "Loaded source items");
    Ok(items)
}
