//! Per-feature min-max normalization.

use crate::{
    dataset::{check_width, Dataset, FeatureVector},
    error::{Error, Result},
};

/// The per-feature range observed while fitting.
#[derive(Clone, Debug, PartialEq)]
struct Range {
    min: FeatureVector,
    max: FeatureVector,
}

/// Rescales every feature to `[0, 1]` using the minimum and maximum seen during [`fit`].
///
/// A feature that was constant during fitting is mapped to `0`, and maps back to that constant.
///
/// [`fit`]: MinMaxScaler::fit
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MinMaxScaler {
    range: Option<Range>,
}

impl MinMaxScaler {
    /// Creates an unfitted scaler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once [`MinMaxScaler::fit`] has succeeded.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.range.is_some()
    }

    /// The per-feature minimums, if fitted.
    #[must_use]
    pub fn min(&self) -> Option<&[f64]> {
        self.range.as_ref().map(|r| r.min.as_slice())
    }

    /// The per-feature maximums, if fitted.
    #[must_use]
    pub fn max(&self) -> Option<&[f64]> {
        self.range.as_ref().map(|r| r.max.as_slice())
    }

    /// Records the minimum and maximum of every feature of `x`, replacing any earlier fit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDataset`] if `x` has no rows and [`Error::ShapeMismatch`] if its rows
    /// differ in width. The scaler is left unchanged on error.
    pub fn fit(&mut self, x: &[FeatureVector]) -> Result<()> {
        let (first, rest) = x.split_first().ok_or(Error::EmptyDataset)?;
        check_width(x, first.len())?;
        let mut min = first.clone();
        let mut max = first.clone();
        for row in rest {
            for (i, &v) in row.iter().enumerate() {
                if v > max[i] {
                    max[i] = v;
                } else if v < min[i] {
                    min[i] = v;
                }
            }
        }
        self.range = Some(Range { min, max });
        Ok(())
    }

    /// Maps every feature to `(x - min) / (max - min)`, or to `0` where `max == min`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFitted`] before the first fit and [`Error::ShapeMismatch`] if a row
    /// differs in width from the fitted data.
    pub fn transform(&self, x: &[FeatureVector]) -> Result<Dataset> {
        let range = self.fitted_range(x)?;
        Ok(x
            .iter()
            .map(|row| {
                row.iter()
                    .zip(range.min.iter().zip(&range.max))
                    .map(|(v, (lo, hi))| if hi > lo { (v - lo) / (hi - lo) } else { 0.0 })
                    .collect()
            })
            .collect())
    }

    /// Fits the scaler on `x` and then transforms it.
    ///
    /// # Errors
    ///
    /// See [`MinMaxScaler::fit`].
    pub fn fit_transform(&mut self, x: &[FeatureVector]) -> Result<Dataset> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Maps normalized features back with `min + y * (max - min)`.
    ///
    /// # Errors
    ///
    /// See [`MinMaxScaler::transform`].
    pub fn inverse_transform(&self, y: &[FeatureVector]) -> Result<Dataset> {
        let range = self.fitted_range(y)?;
        Ok(y
            .iter()
            .map(|row| {
                row.iter()
                    .zip(range.min.iter().zip(&range.max))
                    .map(|(v, (lo, hi))| lo + v * (hi - lo))
                    .collect()
            })
            .collect())
    }

    fn fitted_range(&self, x: &[FeatureVector]) -> Result<&Range> {
        let range = self.range.as_ref().ok_or(Error::NotFitted)?;
        check_width(x, range.min.len())?;
        Ok(range)
    }
}
