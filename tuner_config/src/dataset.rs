//! Step-test CSV loading.
//!
//! Expected layout:
//! ```text
//! Time (s),Level (%),Valve (%)
//! 0.0,41.2,30.0
//! 0.5,41.2,30.0
//! ```
//! The header row is optional. When present, each of the first three cells may carry a unit
//! in parentheses; the units label every derived quantity on display. Columns past the third
//! are ignored.

use std::io::Read;
use std::path::Path;

use thiserror::Error;

/// Typed loader failures. Wrapped in `eyre::Report` by the loader functions so callers can
/// either propagate or `downcast_ref::<LoadError>()`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoadError {
    #[error("cannot open dataset {path}: {reason}")]
    Open { path: String, reason: String },
    #[error("dataset has no data rows")]
    Empty,
    #[error("line {line} has {found} columns, need at least 3 (time, pv, cv)")]
    TooFewColumns { line: u64, found: usize },
    #[error("line {line}, column {column}: {value:?} is not a number")]
    NonNumeric {
        line: u64,
        column: usize,
        value: String,
    },
    #[error("header column {column} ({header:?}) has no unit in parentheses")]
    MissingUnits { column: usize, header: String },
    #[error("malformed CSV at line {line}: {reason}")]
    Malformed { line: u64, reason: String },
}

/// Unit labels parsed from the header, in column order. Empty when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Units {
    pub time: String,
    pub pv: String,
    pub cv: String,
}

/// Raw step-test columns as read from disk. Shape checks only; series invariants
/// (monotonic time etc.) belong to the consumer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepTestData {
    pub time: Vec<f64>,
    pub pv: Vec<f64>,
    pub cv: Vec<f64>,
    pub units: Units,
}

impl StepTestData {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

pub fn load_step_test_csv(path: &Path, parse_units: bool) -> eyre::Result<StepTestData> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::Open {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_step_test_csv(file, parse_units)
}

pub fn parse_step_test_csv<R: Read>(reader: R, parse_units: bool) -> eyre::Result<StepTestData> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut data = StepTestData::default();
    let mut first = true;
    for rec in rdr.records() {
        let rec = rec.map_err(|e| LoadError::Malformed {
            line: e.position().map_or(0, csv::Position::line),
            reason: e.to_string(),
        })?;
        let line = rec.position().map_or(0, csv::Position::line);
        let cells: Vec<&str> = rec
            .iter()
            .enumerate()
            .map(|(i, c)| if i == 0 { c.trim_start_matches('\u{feff}') } else { c })
            .collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }

        if first {
            first = false;
            if looks_like_header(&cells) {
                if cells.len() < 3 {
                    return Err(LoadError::TooFewColumns {
                        line,
                        found: cells.len(),
                    }
                    .into());
                }
                if parse_units {
                    data.units = header_units(&cells)?;
                }
                continue;
            }
        }

        if cells.len() < 3 {
            return Err(LoadError::TooFewColumns {
                line,
                found: cells.len(),
            }
            .into());
        }
        data.time.push(parse_cell(cells[0], line, 1)?);
        data.pv.push(parse_cell(cells[1], line, 2)?);
        data.cv.push(parse_cell(cells[2], line, 3)?);
    }

    if data.is_empty() {
        return Err(LoadError::Empty.into());
    }
    Ok(data)
}

/// A first record is a header when none of its first three cells is a number. A row with
/// some numeric cells is data, so a bad cell there is reported instead of skipped.
fn looks_like_header(cells: &[&str]) -> bool {
    cells.iter().take(3).all(|c| c.parse::<f64>().is_err())
}

fn header_units(cells: &[&str]) -> Result<Units, LoadError> {
    let unit = |column: usize| -> Result<String, LoadError> {
        let header = cells[column - 1];
        unit_of(header)
            .map(str::to_string)
            .ok_or_else(|| LoadError::MissingUnits {
                column,
                header: header.to_string(),
            })
    };
    Ok(Units {
        time: unit(1)?,
        pv: unit(2)?,
        cv: unit(3)?,
    })
}

/// Text between the first `(` and the next `)`, trimmed.
pub fn unit_of(header: &str) -> Option<&str> {
    let open = header.find('(')?;
    let rest = &header[open + 1..];
    let close = rest.find(')')?;
    Some(rest[..close].trim())
}

fn parse_cell(cell: &str, line: u64, column: usize) -> Result<f64, LoadError> {
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(LoadError::NonNumeric {
            line,
            column,
            value: cell.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::unit_of;

    #[test]
    fn unit_between_parentheses() {
        assert_eq!(unit_of("Time (min)"), Some("min"));
        assert_eq!(unit_of("Flow ( kg/h )"), Some("kg/h"));
        assert_eq!(unit_of("Duty (%) (raw)"), Some("%"));
    }

    #[test]
    fn unit_missing_or_unbalanced() {
        assert_eq!(unit_of("Time"), None);
        assert_eq!(unit_of("Time (min"), None);
        assert_eq!(unit_of("Time min)"), None);
    }
}
