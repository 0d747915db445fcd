//! # Tabular Output
//!
//! Stable rendering of section results and load rows: fixed headers, four
//! decimals for computed values, CSV export through the `csv` crate and a
//! plain-text table for terminals.
//!
//! ## Example
//!
//! ```rust
//! use plumb_core::calculations::{calculate_sections, PipeSection, SectionRequest};
//! use plumb_core::reference::ReferenceDataset;
//! use plumb_core::report;
//!
//! let dataset = ReferenceDataset::standard().unwrap();
//! let request = SectionRequest::new(1, vec![PipeSection::new(1, 10.0, 20)]);
//! let batch = calculate_sections(dataset, &request).unwrap();
//!
//! let mut csv = Vec::new();
//! report::write_sections_csv(&mut csv, request.stream, &batch.results).unwrap();
//! let numbers = report::read_section_numbers(csv.as_slice()).unwrap();
//! assert_eq!(numbers.len(), 1);
//! ```

use std::io;

use csv::{ReaderBuilder, WriterBuilder};

use crate::calculations::{AggregateReport, CalculationResult};
use crate::errors::{CalcError, CalcResult};
use crate::reference::Stream;

/// Position of the consumer label in the section table
const LABEL_COLUMN: usize = 6;

/// Headers of the section result table for a stream.
pub fn section_headers(stream: Stream) -> [&'static str; 11] {
    let (hru, q0, pn) = match stream {
        Stream::Cold => ("q_(c)hru", "q_(c)0", "Pc*N"),
        Stream::Hot => ("q_(h)hru", "q_(h)0", "Ph*N"),
        Stream::Total => ("q_(tot)hru", "q_(tot)0", "Ptot*N"),
    };
    [
        "t",
        "U",
        "D",
        hru,
        q0,
        "Группа (t_num)",
        "Потребитель",
        pn,
        "alpha",
        "Q",
        "Скорость",
    ]
}

/// One section result as table cells.
pub fn section_row(result: &CalculationResult) -> Vec<String> {
    vec![
        result.t.to_string(),
        result.fixtures.to_string(),
        result.diameter_mm.to_string(),
        result.q_hru.to_string(),
        result.q0.to_string(),
        result.group.to_string(),
        result.consumer.clone(),
        format!("{:.4}", result.probability),
        format!("{:.4}", result.alpha),
        format!("{:.4}", result.discharge),
        format!("{:.4}", result.velocity),
    ]
}

pub fn section_rows(results: &[CalculationResult]) -> Vec<Vec<String>> {
    results.iter().map(section_row).collect()
}

pub fn aggregate_headers() -> [&'static str; 3] {
    ["Параметр", "Значение", "Ед. изм."]
}

pub fn aggregate_rows(report: &AggregateReport) -> Vec<Vec<String>> {
    report
        .rows
        .iter()
        .map(|row| vec![row.label.clone(), row.formatted_value(), row.unit.clone()])
        .collect()
}

/// Write any header/rows table as CSV.
pub fn write_table_csv<W: io::Write>(writer: W, headers: &[&str], rows: &[Vec<String>]) -> CalcResult<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .flush()
        .map_err(|e| CalcError::file_error("write", "csv", e.to_string()))
}

/// Write section results as CSV with the stream's headers.
pub fn write_sections_csv<W: io::Write>(writer: W, stream: Stream, results: &[CalculationResult]) -> CalcResult<()> {
    write_table_csv(writer, &section_headers(stream), &section_rows(results))
}

/// Write the load battery as CSV.
pub fn write_aggregate_csv<W: io::Write>(writer: W, report: &AggregateReport) -> CalcResult<()> {
    write_table_csv(writer, &aggregate_headers(), &aggregate_rows(report))
}

/// Read back the numeric columns of an exported section table.
///
/// Each returned row holds the ten numeric cells in header order, with the
/// consumer label skipped.
pub fn read_section_numbers<R: io::Read>(reader: R) -> CalcResult<Vec<Vec<f64>>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let mut numbers = Vec::with_capacity(record.len().saturating_sub(1));
        for (column, cell) in record.iter().enumerate() {
            if column == LABEL_COLUMN {
                continue;
            }
            let value = cell.trim().parse::<f64>().map_err(|_| {
                CalcError::serialization(format!(
                    "row {}, column {}: '{cell}' is not a number",
                    line + 1,
                    column + 1
                ))
            })?;
            numbers.push(value);
        }
        rows.push(numbers);
    }
    Ok(rows)
}

/// Render rows as a plain-text table with aligned columns.
pub fn render_table<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.as_ref().chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(i) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers.iter().map(|h| h.as_ref()).collect()));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|&w| "-".repeat(w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}
