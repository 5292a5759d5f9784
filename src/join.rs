use std::collections::{HashMap, HashSet};

use log::info;

use crate::{
    data::Value,
    dataset::{CATEGORY, CATEGORY_ENGLISH, ORDER_ID, PRODUCT_ID, SourceTables, Table},
    error::PipelineResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

/// Hash-joins `right` onto `left`.
///
/// Output keeps left row order; several matches for one left row follow the
/// right table's order. Rows whose key cell is missing never match.
pub fn join(
    left: &Table,
    right: &Table,
    left_key: &str,
    right_key: &str,
    kind: JoinKind,
) -> PipelineResult<Table> {
    let left_idx = left.require_column(left_key)?;
    let right_idx = right.require_column(right_key)?;

    let lookup = build_right_lookup(right, right_idx);
    let (headers, right_columns) = build_output_headers(&left.headers, &right.headers, right_idx);
    let mut types = left.types.clone();
    types.extend(right_columns.iter().map(|idx| right.types[*idx]));

    let mut output = Table::new(format!("{}+{}", left.name, right.name), headers, types);
    let mut matched_rows = 0usize;
    for row in &left.rows {
        let bucket = row
            .get(left_idx)
            .and_then(|cell| cell.as_ref())
            .and_then(|key| lookup.get(&key.as_display()));
        match bucket {
            Some(matches) => {
                for right_row in matches {
                    let mut combined = row.clone();
                    combined.extend(
                        right_columns
                            .iter()
                            .map(|idx| right.rows[*right_row].get(*idx).cloned().flatten()),
                    );
                    output.rows.push(combined);
                    matched_rows += 1;
                }
            }
            None if kind == JoinKind::Left => {
                let mut combined = row.clone();
                combined.extend(right_columns.iter().map(|_| None));
                output.rows.push(combined);
            }
            None => {}
        }
    }
    info!(
        "{:?} join {} ⋈ {} on {}={}: {} output row(s), {} matched",
        kind,
        left.name,
        right.name,
        left_key,
        right_key,
        output.len(),
        matched_rows
    );
    Ok(output)
}

fn build_right_lookup(table: &Table, key_idx: usize) -> HashMap<String, Vec<usize>> {
    let mut map: HashMap<String, Vec<usize>> = HashMap::new();
    for (row_idx, row) in table.rows.iter().enumerate() {
        if let Some(Some(key)) = row.get(key_idx) {
            map.entry(key.as_display()).or_default().push(row_idx);
        }
    }
    map
}

fn build_output_headers(
    left_headers: &[String],
    right_headers: &[String],
    right_key_idx: usize,
) -> (Vec<String>, Vec<usize>) {
    let mut headers = left_headers.to_vec();
    let mut seen: HashSet<String> = headers.iter().cloned().collect();
    let mut right_columns = Vec::new();

    for (idx, name) in right_headers.iter().enumerate() {
        if idx == right_key_idx {
            continue;
        }
        let mut candidate = name.clone();
        let mut counter = 1usize;
        while seen.contains(&candidate) {
            candidate = format!("right_{name}_{counter}");
            counter += 1;
        }
        seen.insert(candidate.clone());
        headers.push(candidate);
        right_columns.push(idx);
    }

    (headers, right_columns)
}

/// Replaces the raw category code with its English label, or `fallback`.
///
/// The English column is dropped afterwards, so the category column is the
/// single place the label lives.
pub fn resolve_category_labels(table: &mut Table, fallback: &str) -> PipelineResult<usize> {
    let category_idx = table.require_column(CATEGORY)?;
    let english_idx = table.require_column(CATEGORY_ENGLISH)?;
    let mut fallbacks = 0usize;
    for row in &mut table.rows {
        let label = match row.get(english_idx).and_then(|c| c.as_ref()) {
            Some(value) if !value.as_display().trim().is_empty() => value.as_display(),
            _ => {
                fallbacks += 1;
                fallback.to_string()
            }
        };
        row[category_idx] = Some(Value::String(label));
    }
    table.types[category_idx] = crate::schema::ColumnType::String;
    table.drop_column(CATEGORY_ENGLISH);
    Ok(fallbacks)
}

/// Orders ⋈ items ⋈ products ⟕ translations, with labels resolved.
pub fn build_joined_table(sources: &SourceTables, fallback: &str) -> PipelineResult<Table> {
    let order_items = join(
        &sources.orders,
        &sources.items,
        ORDER_ID,
        ORDER_ID,
        JoinKind::Inner,
    )?;
    let with_products = join(
        &order_items,
        &sources.products,
        PRODUCT_ID,
        PRODUCT_ID,
        JoinKind::Inner,
    )?;
    let mut joined = join(
        &with_products,
        &sources.translations,
        CATEGORY,
        CATEGORY,
        JoinKind::Left,
    )?;
    let fallbacks = resolve_category_labels(&mut joined, fallback)?;
    info!(
        "Joined table has {} row(s); {} without an English category label",
        joined.len(),
        fallbacks
    );
    joined.name = "joined".into();
    Ok(joined)
}
