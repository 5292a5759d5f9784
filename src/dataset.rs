//! In-memory typed tables and the six-file dataset loader.

use std::path::Path;

use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    config::DatasetFiles,
    data::{Value, parse_typed_value},
    error::{PipelineError, PipelineResult},
    io_utils,
    schema::{self, ColumnType},
};

pub const ORDER_ID: &str = "order_id";
pub const PRODUCT_ID: &str = "product_id";
pub const CUSTOMER_ID: &str = "customer_id";
pub const PRICE: &str = "price";
pub const PURCHASE_TIMESTAMP: &str = "order_purchase_timestamp";
pub const CATEGORY: &str = "product_category_name";
pub const CATEGORY_ENGLISH: &str = "product_category_name_english";

/// Identifier columns kept as text so joins compare them exactly.
pub const KEY_COLUMNS: [&str; 4] = [ORDER_ID, PRODUCT_ID, CUSTOMER_ID, CATEGORY];

pub type Row = Vec<Option<Value>>;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub types: Vec<ColumnType>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>, types: Vec<ColumnType>) -> Self {
        Self {
            name: name.into(),
            headers,
            types,
            rows: Vec::new(),
        }
    }

    /// Builds a table from raw text rows, inferring column types.
    pub fn from_raw(
        name: impl Into<String>,
        headers: Vec<String>,
        raw_rows: Vec<Vec<String>>,
    ) -> PipelineResult<Self> {
        Self::from_raw_with_text_columns(name, headers, raw_rows, &[])
    }

    /// Like [`Table::from_raw`], but the named columns are always `String`.
    pub fn from_raw_with_text_columns(
        name: impl Into<String>,
        headers: Vec<String>,
        raw_rows: Vec<Vec<String>>,
        text_columns: &[&str],
    ) -> PipelineResult<Self> {
        let name = name.into();
        let mut types = schema::infer_column_types(headers.len(), &raw_rows);
        for (header, ty) in headers.iter().zip(types.iter_mut()) {
            if text_columns.contains(&header.as_str()) {
                *ty = ColumnType::String;
            }
        }
        let mut table = Table::new(name, headers, types);
        for (row_idx, raw) in raw_rows.into_iter().enumerate() {
            let typed = table.parse_row(&raw).map_err(|err| PipelineError::Parse {
                table: table.name.clone(),
                row: row_idx + 2,
                message: format!("{err:#}"),
            })?;
            table.rows.push(typed);
        }
        Ok(table)
    }

    fn parse_row(&self, raw: &[String]) -> anyhow::Result<Row> {
        self.types
            .iter()
            .enumerate()
            .map(|(idx, ty)| {
                let cell = raw.get(idx).map(|s| s.trim()).unwrap_or("");
                parse_typed_value(cell, ty)
            })
            .collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> PipelineResult<usize> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn {
                table: self.name.clone(),
                column: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column)).and_then(|c| c.as_ref())
    }

    pub fn missing_count(&self, column: usize) -> usize {
        self.rows
            .iter()
            .filter(|row| row.get(column).is_none_or(|cell| cell.is_none()))
            .count()
    }

    /// Removes a column by name, returning whether it existed.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        self.headers.remove(idx);
        self.types.remove(idx);
        for row in &mut self.rows {
            if idx < row.len() {
                row.remove(idx);
            }
        }
        true
    }
}

/// Reads one CSV file into a typed table; `text_columns` skip type inference.
pub fn load_table(
    table: &str,
    path: &Path,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
    text_columns: &[&str],
) -> PipelineResult<Table> {
    let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
    let mut reader = io_utils::open_table_reader(table, path, delimiter)?;
    let read_error = |source| PipelineError::Read {
        table: table.to_string(),
        path: path.to_path_buf(),
        source,
    };
    let header_record = reader.byte_headers().map_err(read_error)?.clone();
    let headers = io_utils::decode_record(&header_record, encoding).ok_or_else(|| {
        PipelineError::Decode {
            table: table.to_string(),
            row: 1,
            encoding: encoding.name(),
        }
    })?;
    let headers = headers
        .into_iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect::<Vec<_>>();

    let mut raw_rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.map_err(read_error)?;
        let decoded = io_utils::decode_record(&record, encoding).ok_or_else(|| {
            PipelineError::Decode {
                table: table.to_string(),
                row: row_idx + 2,
                encoding: encoding.name(),
            }
        })?;
        raw_rows.push(decoded);
    }
    debug!("Read {} row(s) for '{}' from {:?}", raw_rows.len(), table, path);
    Table::from_raw_with_text_columns(table, headers, raw_rows, text_columns)
}

/// The six source tables, as loaded and before any joins.
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub orders: Table,
    pub items: Table,
    pub products: Table,
    pub translations: Table,
    pub customers: Table,
    pub payments: Table,
}

impl SourceTables {
    pub fn tables_mut(&mut self) -> [&mut Table; 6] {
        [
            &mut self.orders,
            &mut self.items,
            &mut self.products,
            &mut self.translations,
            &mut self.customers,
            &mut self.payments,
        ]
    }

    pub fn tables(&self) -> [&Table; 6] {
        [
            &self.orders,
            &self.items,
            &self.products,
            &self.translations,
            &self.customers,
            &self.payments,
        ]
    }
}

/// Loads and validates every dataset file under `data_dir`.
pub fn load_sources(
    data_dir: &Path,
    files: &DatasetFiles,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> PipelineResult<SourceTables> {
    let load = |table: &str, file: &str, required: &[&str]| -> PipelineResult<Table> {
        let loaded = load_table(
            table,
            &data_dir.join(file),
            delimiter,
            encoding,
            &KEY_COLUMNS,
        )?;
        schema::require_columns(table, &loaded.headers, required)?;
        info!(
            "Loaded '{}' ({} row(s), {} column(s))",
            table,
            loaded.len(),
            loaded.headers.len()
        );
        Ok(loaded)
    };

    Ok(SourceTables {
        orders: load("orders", &files.orders, &[ORDER_ID, PURCHASE_TIMESTAMP])?,
        items: load("order_items", &files.order_items, &[ORDER_ID, PRODUCT_ID, PRICE])?,
        products: load("products", &files.products, &[PRODUCT_ID, CATEGORY])?,
        translations: load(
            "category_translation",
            &files.category_translation,
            &[CATEGORY, CATEGORY_ENGLISH],
        )?,
        customers: load("customers", &files.customers, &[CUSTOMER_ID])?,
        payments: load("payments", &files.payments, &[ORDER_ID])?,
    })
}
