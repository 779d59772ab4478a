//! Data structures and methods for dealing with datasets.

use std::{fs, path::Path};

use crate::error::{Error, Result};

/// A single row of features.
pub type FeatureVector = Vec<f64>;

/// An ordered collection of rows that all have the same width.
pub type Dataset = Vec<FeatureVector>;

/// A single sample within a dataset of mappings from vectors to vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// The input data.
    pub input: Vec<f64>,
    /// The output data.
    pub output: Vec<f64>,
}

impl Sample {
    /// Creates a sample whose target is its own input.
    #[must_use]
    pub fn reconstruction(input: Vec<f64>) -> Self {
        Self {
            output: input.clone(),
            input,
        }
    }
}

/// Checks that every row of `rows` has exactly `width` features.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] naming the first row of a different width.
pub fn check_width<R: AsRef<[f64]>>(rows: &[R], width: usize) -> Result<()> {
    for (row, x) in rows.iter().enumerate() {
        let actual = x.as_ref().len();
        if actual != width {
            return Err(Error::ShapeMismatch {
                row,
                expected: width,
                actual,
            });
        }
    }
    Ok(())
}

/// Parses comma-separated numeric rows.
///
/// The first line is treated as a header and skipped, as are lines without a comma. When
/// `drop_label` is set the first column of every row is discarded.
///
/// # Errors
///
/// Returns [`Error::Parse`] if a field is not a number and [`Error::ShapeMismatch`] if rows have
/// different widths.
pub fn parse_csv(text: &str, drop_label: bool) -> Result<Dataset> {
    let mut rows = Dataset::new();
    for (i, line) in text.lines().enumerate().skip(1) {
        if !line.contains(',') {
            continue;
        }
        let fields = line.split(',').skip(usize::from(drop_label));
        let row = fields
            .map(|field| {
                field.trim().parse::<f64>().map_err(|_| Error::Parse {
                    line: i + 1,
                    field: field.to_string(),
                })
            })
            .collect::<Result<FeatureVector>>()?;
        rows.push(row);
    }
    if let Some(first) = rows.first() {
        check_width(&rows, first.len())?;
    }
    Ok(rows)
}

/// Reads a numeric CSV file, see [`parse_csv`].
///
/// # Errors
///
/// Returns [`Error::Io`] if the file can't be read, or any error from [`parse_csv`].
pub fn read_csv<P: AsRef<Path>>(path: P, drop_label: bool) -> Result<Dataset> {
    let text = fs::read_to_string(path)?;
    parse_csv(&text, drop_label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_header_and_label() {
        let text = "id,a,b\nx1,1.5,2\n\nx2,-3,4e1\n";
        let rows = parse_csv(text, true).unwrap();
        assert_eq!(rows, vec![vec![1.5, 2.0], vec![-3.0, 40.0]]);
    }

    #[test]
    fn parse_reports_bad_field() {
        let err = parse_csv("a,b\n1,two\n", false).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, ref field } if field == "two"));
    }

    #[test]
    fn parse_rejects_ragged_rows() {
        let err = parse_csv("a,b\n1,2\n3,4,5\n", false).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                row: 1,
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn reconstruction_sample_targets_its_input() {
        let s = Sample::reconstruction(vec![1.0, 2.0]);
        assert_eq!(s.input, s.output);
    }
}
