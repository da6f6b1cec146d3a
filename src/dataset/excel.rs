//! Excel workbook ingestion

use crate::error::{PipelineError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use polars::prelude::*;
use std::io::Cursor;

/// Read the first worksheet of an `.xls`/`.xlsx` workbook.
///
/// The first row holds the column names.
pub fn read_workbook(bytes: &[u8]) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| PipelineError::Ingest(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PipelineError::Ingest("workbook has no worksheets".to_string()))?
        .map_err(|e| PipelineError::Ingest(e.to_string()))?;
    range_to_frame(&range)
}

/// Build a frame from a cell range, one typed column per sheet column.
///
/// A column whose filled cells are all whole numbers becomes Int64, all
/// numbers Float64, all booleans Boolean, anything else String. Empty cells
/// are nulls.
pub fn range_to_frame(range: &Range<Data>) -> Result<DataFrame> {
    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| PipelineError::Ingest("worksheet is empty".to_string()))?;
    let body: Vec<&[Data]> = rows.collect();

    let columns = header
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let name = match cell_text(name) {
                Some(name) => name,
                None => format!("column_{}", idx),
            };
            let cells: Vec<&Data> = body
                .iter()
                .map(|row| row.get(idx).unwrap_or(&Data::Empty))
                .collect();
            column_from_cells(&name, &cells).into()
        })
        .collect::<Vec<Column>>();

    Ok(DataFrame::new(columns)?)
}

fn column_from_cells(name: &str, cells: &[&Data]) -> Series {
    let filled: Vec<&Data> = cells.iter().copied().filter(|c| !is_empty(c)).collect();

    if filled.iter().all(|c| matches!(c, Data::Int(_)) || whole_float(c)) && !filled.is_empty() {
        let values: Vec<Option<i64>> = cells.iter().map(|c| cell_f64(c).map(|v| v as i64)).collect();
        Series::new(name.into(), values)
    } else if filled.iter().all(|c| matches!(c, Data::Int(_) | Data::Float(_))) && !filled.is_empty() {
        let values: Vec<Option<f64>> = cells.iter().map(|c| cell_f64(c)).collect();
        Series::new(name.into(), values)
    } else if filled.iter().all(|c| matches!(c, Data::Bool(_))) && !filled.is_empty() {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|c| match c {
                Data::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        Series::new(name.into(), values)
    } else {
        let values: Vec<Option<String>> = cells.iter().map(|c| cell_text(c)).collect();
        Series::new(name.into(), values)
    }
}

fn is_empty(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn whole_float(cell: &Data) -> bool {
    matches!(cell, Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64)
}

fn cell_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        _ => None,
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    if is_empty(cell) {
        return None;
    }
    Some(match cell {
        Data::String(s) => s.clone(),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        other => other.to_string(),
    })
}
