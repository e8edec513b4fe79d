//! CSV product import: header mapping, row extraction, and row validation.
//!
//! This module has **zero database dependencies**. The API layer's import
//! engine drives the reader, resolves lookups, and writes rows; everything
//! here operates on `csv::StringRecord`s.

use std::collections::{HashMap, HashSet};
use std::io::Read;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identifier::{validate_identifier, IdentifierPattern, DEFAULT_MAX_ATTEMPTS};
use crate::product::{
    max_price, max_tax_rate, ProductStatus, MAX_NAME_LENGTH, MAX_QUANTITY, VALID_STATUSES,
};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Column schema
// ---------------------------------------------------------------------------

/// Columns that must be present in the header row. Values may still be
/// blank for `barcode` and `category`.
pub const REQUIRED_COLUMNS: &[&str] = &["name", "price", "quantity", "barcode", "category"];

/// Columns read when present.
pub const OPTIONAL_COLUMNS: &[&str] = &[
    "sku",
    "brand",
    "supplier",
    "description",
    "sale_price",
    "sale_start_date",
    "sale_end_date",
    "tax_rate",
    "status",
    "weight",
    "dimensions",
];

/// Default ceiling on data rows per file.
pub const DEFAULT_MAX_ROWS: usize = 10_000;

/// Default ceiling on upload size in bytes (10 MiB).
pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

pub const POLICY_SKIP: &str = "skip";
pub const POLICY_UPDATE: &str = "update";
pub const POLICY_CREATE_WITH_NEW_IDENTIFIER: &str = "create_with_new_identifier";

pub const VALID_POLICIES: &[&str] = &[POLICY_SKIP, POLICY_UPDATE, POLICY_CREATE_WITH_NEW_IDENTIFIER];

/// What to do when a row's SKU or barcode already exists in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    Skip,
    Update,
    CreateWithNewIdentifier,
}

impl DuplicatePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skip => POLICY_SKIP,
            Self::Update => POLICY_UPDATE,
            Self::CreateWithNewIdentifier => POLICY_CREATE_WITH_NEW_IDENTIFIER,
        }
    }

    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s.trim().to_lowercase().as_str() {
            POLICY_SKIP => Ok(Self::Skip),
            POLICY_UPDATE => Ok(Self::Update),
            POLICY_CREATE_WITH_NEW_IDENTIFIER => Ok(Self::CreateWithNewIdentifier),
            _ => Err(CoreError::unknown("duplicate policy", s, VALID_POLICIES)),
        }
    }
}

/// Per-call import settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub duplicate_policy: DuplicatePolicy,
    /// Ceiling on data rows; exceeding it aborts the import.
    pub max_rows: usize,
    /// Pattern used for SKUs the file leaves blank.
    pub sku_pattern: IdentifierPattern,
    /// Uniqueness retries per generated identifier.
    pub max_identifier_attempts: u32,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::default(),
            max_rows: DEFAULT_MAX_ROWS,
            sku_pattern: IdentifierPattern::default_sku(),
            max_identifier_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

// ---------------------------------------------------------------------------
// Reader and header mapping
// ---------------------------------------------------------------------------

/// Build a CSV reader with the settings every import uses: a header row and
/// ragged rows tolerated. Fields are kept verbatim so line breaks inside
/// quoted values stay countable; [`HeaderMap`] trims on access.
pub fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input)
}

/// Empty lines the reader passed over before `record`.
///
/// The reader drops empty lines without yielding a record, so they only
/// show up in its line counter. `lines_read` is how far the counter moved
/// while reading `record`; one line is its terminator and the rest are
/// breaks inside quoted fields or skipped empty lines.
pub fn blank_lines_before(lines_read: u64, record: &csv::StringRecord) -> u64 {
    let embedded: u64 = record
        .iter()
        .map(|field| field.bytes().filter(|&b| b == b'\n').count() as u64)
        .sum();
    lines_read.saturating_sub(1 + embedded)
}

/// Lower-cased column name to field index.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    columns: HashMap<String, usize>,
}

impl HeaderMap {
    pub fn from_record(headers: &csv::StringRecord) -> Self {
        let columns = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();
        Self { columns }
    }

    /// Required columns absent from the header, in schema order.
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !self.columns.contains_key(*c))
            .collect()
    }

    /// Trimmed field value, or `None` when the column is absent or blank.
    pub fn get<'r>(&self, record: &'r csv::StringRecord, column: &str) -> Option<&'r str> {
        self.columns
            .get(column)
            .and_then(|&idx| record.get(idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Map the header row and require every column in [`REQUIRED_COLUMNS`].
pub fn validate_headers(headers: &csv::StringRecord) -> Result<HeaderMap, String> {
    let map = HeaderMap::from_record(headers);
    let missing = map.missing_required();
    if !missing.is_empty() {
        return Err(format!("Missing required columns: {}", missing.join(", ")));
    }
    Ok(map)
}

/// `true` when every field of the record is blank.
pub fn is_blank_record(record: &csv::StringRecord) -> bool {
    record.iter().all(|f| f.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Row extraction
// ---------------------------------------------------------------------------

/// One CSV record after column mapping and type coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub description: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub supplier: Option<String>,
    pub sale_price: Option<Decimal>,
    pub sale_start: Option<Timestamp>,
    pub sale_end: Option<Timestamp>,
    pub tax_rate: Option<Decimal>,
    pub status: ProductStatus,
    pub weight: Option<Decimal>,
    pub dimensions: Option<String>,
}

/// SKUs and barcodes already claimed by earlier rows of the current file,
/// including generated ones.
#[derive(Debug, Clone, Default)]
pub struct RunIdentifiers {
    skus: HashSet<String>,
    barcodes: HashSet<String>,
}

impl RunIdentifiers {
    pub fn has_sku(&self, sku: &str) -> bool {
        self.skus.contains(sku)
    }

    pub fn has_barcode(&self, barcode: &str) -> bool {
        self.barcodes.contains(barcode)
    }

    pub fn claim_sku(&mut self, sku: &str) {
        self.skus.insert(sku.to_string());
    }

    pub fn claim_barcode(&mut self, barcode: &str) {
        self.barcodes.insert(barcode.to_string());
    }
}

/// Extract and validate one record.
///
/// Every violation is collected; the caller joins them into a single
/// `"Row N: ..."` line.
pub fn parse_row(
    record: &csv::StringRecord,
    headers: &HeaderMap,
    seen: &RunIdentifiers,
) -> Result<ImportRow, Vec<String>> {
    let mut errors = Vec::new();

    let name = headers.get(record, "name").unwrap_or_default().to_string();
    if name.is_empty() {
        errors.push("Name is required".to_string());
    } else if name.chars().count() > MAX_NAME_LENGTH {
        errors.push(format!(
            "Name exceeds maximum length of {MAX_NAME_LENGTH} characters"
        ));
    }

    let price = match headers.get(record, "price") {
        None => {
            errors.push("Price is required".to_string());
            None
        }
        Some(raw) => money(raw, "Price", &mut errors),
    };

    let quantity = match headers.get(record, "quantity") {
        None => 0,
        Some(raw) => match raw.parse::<i64>() {
            Ok(q) if (0..=MAX_QUANTITY).contains(&q) => q as i32,
            Ok(_) => {
                errors.push(format!("Quantity must be between 0 and {MAX_QUANTITY}"));
                0
            }
            Err(_) => {
                errors.push(format!("Quantity '{raw}' is not a whole number"));
                0
            }
        },
    };

    let sku = headers.get(record, "sku").map(str::to_string);
    if let Some(sku) = &sku {
        if let Err(e) = validate_identifier("SKU", sku) {
            errors.push(e);
        } else if seen.has_sku(sku) {
            errors.push(format!("SKU '{sku}' appears more than once in this file"));
        }
    }

    let barcode = headers.get(record, "barcode").map(str::to_string);
    if let Some(barcode) = &barcode {
        if let Err(e) = validate_identifier("Barcode", barcode) {
            errors.push(e);
        } else if seen.has_barcode(barcode) {
            errors.push(format!(
                "Barcode '{barcode}' appears more than once in this file"
            ));
        }
    }

    let sale_price = headers
        .get(record, "sale_price")
        .and_then(|raw| money(raw, "Sale price", &mut errors));
    if let (Some(sale), Some(regular)) = (sale_price, price) {
        if sale >= regular {
            errors.push("Sale price must be less than regular price".to_string());
        }
    }

    let sale_start = headers
        .get(record, "sale_start_date")
        .and_then(|raw| date(raw, "sale start date", &mut errors));
    let sale_end = headers
        .get(record, "sale_end_date")
        .and_then(|raw| date(raw, "sale end date", &mut errors));
    if let (Some(start), Some(end)) = (sale_start, sale_end) {
        if start >= end {
            errors.push("Sale start date must be before sale end date".to_string());
        }
    }

    let tax_rate = headers.get(record, "tax_rate").and_then(|raw| {
        match raw.parse::<Decimal>() {
            Ok(rate) if rate >= Decimal::ZERO && rate <= max_tax_rate() => Some(rate),
            Ok(_) => {
                errors.push("Tax rate must be between 0 and 100".to_string());
                None
            }
            Err(_) => {
                errors.push(format!("Tax rate '{raw}' is not a valid number"));
                None
            }
        }
    });

    let status = match headers.get(record, "status") {
        None => ProductStatus::default(),
        Some(raw) => ProductStatus::from_str_value(raw).unwrap_or_else(|_| {
            errors.push(format!(
                "Unknown status '{raw}'. Must be one of: {}",
                VALID_STATUSES.join(", ")
            ));
            ProductStatus::default()
        }),
    };

    let weight = headers
        .get(record, "weight")
        .and_then(|raw| match raw.parse::<Decimal>() {
            Ok(w) if w >= Decimal::ZERO => Some(w),
            Ok(_) => {
                errors.push("Weight must not be negative".to_string());
                None
            }
            Err(_) => {
                errors.push(format!("Weight '{raw}' is not a valid number"));
                None
            }
        });

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ImportRow {
        name,
        price: price.unwrap_or_default(),
        quantity,
        sku,
        barcode,
        description: headers
            .get(record, "description")
            .unwrap_or_default()
            .to_string(),
        category: headers.get(record, "category").map(str::to_string),
        brand: headers.get(record, "brand").map(str::to_string),
        supplier: headers.get(record, "supplier").map(str::to_string),
        sale_price,
        sale_start,
        sale_end,
        tax_rate,
        status,
        weight,
        dimensions: headers.get(record, "dimensions").map(str::to_string),
    })
}

/// Parse a non-negative monetary amount within the accepted ceiling.
fn money(raw: &str, label: &str, errors: &mut Vec<String>) -> Option<Decimal> {
    match raw.parse::<Decimal>() {
        Ok(v) if v >= Decimal::ZERO && v <= max_price() => Some(v),
        Ok(_) => {
            errors.push(format!("{label} must be between 0 and {}", max_price()));
            None
        }
        Err(_) => {
            errors.push(format!("{label} '{raw}' is not a valid number"));
            None
        }
    }
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or `YYYY-MM-DD HH:MM:SS` (UTC).
fn date(raw: &str, label: &str, errors: &mut Vec<String>) -> Option<Timestamp> {
    let parsed = NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        });
    match parsed {
        Some(dt) => Some(dt.and_utc()),
        None => {
            errors.push(format!(
                "Invalid {label} '{raw}' (expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)"
            ));
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// Downloadable CSV template: the full header and one example row.
pub fn template_csv() -> String {
    let header: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .chain(OPTIONAL_COLUMNS.iter())
        .copied()
        .collect();
    let example = [
        "Example Widget",
        "19.99",
        "25",
        "",
        "Tools",
        "",
        "Acme",
        "Acme Supply",
        "Sturdy steel widget",
        "17.99",
        "2025-01-01",
        "2025-01-31",
        "8.5",
        "active",
        "0.450",
        "10x5x2 cm",
    ];
    format!("{}\n{}\n", header.join(","), example.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn rows(data: &str) -> (HeaderMap, Vec<csv::StringRecord>) {
        let mut rdr = csv_reader(data.as_bytes());
        let headers = validate_headers(rdr.headers().unwrap()).unwrap();
        let records = rdr.records().map(Result::unwrap).collect();
        (headers, records)
    }

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn headers_are_case_insensitive() {
        let mut rdr = csv_reader("Name,PRICE,Quantity,Barcode,category\n".as_bytes());
        assert!(validate_headers(rdr.headers().unwrap()).is_ok());
    }

    #[test]
    fn empty_lines_are_recovered_from_the_line_counter() {
        let data = "name,price,quantity\nA,1,1\n\n\nB,1,1\n\"two\nlines\",2,2\nC,1,1";
        let mut rdr = csv_reader(data.as_bytes());
        rdr.headers().unwrap();

        let mut record = csv::StringRecord::new();
        let mut gaps = Vec::new();
        loop {
            let before = rdr.position().line();
            if !rdr.read_record(&mut record).unwrap() {
                break;
            }
            gaps.push(blank_lines_before(rdr.position().line() - before, &record));
        }
        assert_eq!(gaps, vec![0, 2, 0, 0]);
    }

    #[test]
    fn missing_required_columns_are_listed() {
        let mut rdr = csv_reader("name,price\n".as_bytes());
        let err = validate_headers(rdr.headers().unwrap()).unwrap_err();
        assert_eq!(err, "Missing required columns: quantity, barcode, category");
    }

    #[test]
    fn minimal_row_parses_with_defaults() {
        let (h, recs) = rows("name,price,quantity,barcode,category\nWidget,9.99,5,ABC123,Tools\n");
        let row = parse_row(&recs[0], &h, &RunIdentifiers::default()).unwrap();
        assert_eq!(row.name, "Widget");
        assert_eq!(row.price, d("9.99"));
        assert_eq!(row.quantity, 5);
        assert_eq!(row.barcode.as_deref(), Some("ABC123"));
        assert_eq!(row.category.as_deref(), Some("Tools"));
        assert_eq!(row.sku, None);
        assert_eq!(row.status, ProductStatus::Active);
        assert_eq!(row.description, "");
    }

    #[test]
    fn blank_quantity_and_barcode_coerce() {
        let (h, recs) = rows("name,price,quantity,barcode,category\nWidget,1,,,\n");
        let row = parse_row(&recs[0], &h, &RunIdentifiers::default()).unwrap();
        assert_eq!(row.quantity, 0);
        assert_eq!(row.barcode, None);
        assert_eq!(row.category, None);
    }

    #[test]
    fn sale_price_must_be_below_price() {
        let (h, recs) =
            rows("name,price,quantity,barcode,category,sale_price\nWidget,10,1,,,12\n");
        let errs = parse_row(&recs[0], &h, &RunIdentifiers::default()).unwrap_err();
        assert_eq!(errs, vec!["Sale price must be less than regular price".to_string()]);
    }

    #[test]
    fn all_violations_are_collected() {
        let (h, recs) = rows(
            "name,price,quantity,barcode,category,tax_rate,status\n,-1,2000000,a b,,101,archived\n",
        );
        let errs = parse_row(&recs[0], &h, &RunIdentifiers::default()).unwrap_err();
        assert_eq!(errs.len(), 6, "{errs:?}");
        assert!(errs.contains(&"Name is required".to_string()));
    }

    #[test]
    fn repeated_identifiers_in_file_are_rejected() {
        let (h, recs) = rows("name,price,quantity,barcode,category,sku\nA,1,1,B1,,S1\n");
        let mut seen = RunIdentifiers::default();
        seen.claim_sku("S1");
        seen.claim_barcode("B1");
        let errs = parse_row(&recs[0], &h, &seen).unwrap_err();
        assert_eq!(errs.len(), 2);
    }

    #[test]
    fn sale_dates_accept_both_formats_and_must_be_ordered() {
        let (h, recs) = rows(
            "name,price,quantity,barcode,category,sale_start_date,sale_end_date\n\
             A,1,1,,,2025-01-01,2025-01-02 12:00:00\n\
             B,1,1,,,2025-02-01,2025-01-01\n\
             C,1,1,,,01/02/2025,\n",
        );
        let seen = RunIdentifiers::default();
        let ok = parse_row(&recs[0], &h, &seen).unwrap();
        assert!(ok.sale_start < ok.sale_end);
        assert_matches!(parse_row(&recs[1], &h, &seen), Err(e) if e[0].contains("before"));
        assert_matches!(parse_row(&recs[2], &h, &seen), Err(e) if e[0].contains("Invalid sale start date"));
    }

    #[test]
    fn blank_records_are_detected() {
        let (_, recs) = rows("name,price,quantity,barcode,category\n , ,,,\nA,1,1,,\n");
        assert!(is_blank_record(&recs[0]));
        assert!(!is_blank_record(&recs[1]));
    }

    #[test]
    fn duplicate_policy_parses() {
        assert_eq!(
            DuplicatePolicy::from_str_value("Create_With_New_Identifier").unwrap(),
            DuplicatePolicy::CreateWithNewIdentifier
        );
        assert!(DuplicatePolicy::from_str_value("merge").is_err());
    }

    #[test]
    fn template_parses_as_valid_import() {
        let template = template_csv();
        let (h, recs) = rows(&template);
        assert_eq!(recs.len(), 1);
        assert!(parse_row(&recs[0], &h, &RunIdentifiers::default()).is_ok());
    }
}
