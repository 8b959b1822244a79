use std::sync::Arc;

use crate::rating::RatingCell;

/// Quality flag raised when a series has been heavily interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityWarning {
    /// interpolation_ratio > 0.3
    Degraded,
    /// interpolation_ratio > 0.5
    Severe,
}

/// One entity's rating series over the dataset's shared date axis.
#[derive(Debug, Clone)]
pub struct RatingSeries {
    pub dates: Arc<[String]>,
    pub cells: Vec<RatingCell>,
}

/// Side product of interpolation: how much of a series had to be filled in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationReport {
    pub missing_before: usize,
    pub total: usize,
}

impl InterpolationReport {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.missing_before as f64 / self.total as f64
        }
    }

    /// Data-quality warning threshold from spec: 30% triggers a warning,
    /// 50% a severe one.
    pub fn warning(&self) -> Option<QualityWarning> {
        let ratio = self.ratio();
        if ratio > 0.5 {
            Some(QualityWarning::Severe)
        } else if ratio > 0.3 {
            Some(QualityWarning::Degraded)
        } else {
            None
        }
    }
}

impl RatingSeries {
    pub fn new(dates: Arc<[String]>, cells: Vec<RatingCell>) -> Self {
        debug_assert_eq!(dates.len(), cells.len());
        Self { dates, cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn first_valid_index(&self) -> Option<usize> {
        self.cells.iter().position(|c| c.is_some())
    }

    fn last_valid_index(&self) -> Option<usize> {
        self.cells.iter().rposition(|c| c.is_some())
    }

    /// Bidirectional, position-aware fill per spec §4.2:
    ///
    /// 1. cells before the first valid one are back-filled with it;
    /// 2. cells at or after it are forward-filled from the nearest earlier
    ///    valid cell (this also covers interior gaps and the trailing
    ///    region, since a forward-fill naturally propagates through both);
    /// 3. a series with no valid cell at all is returned unchanged.
    pub fn interpolate(&self) -> (RatingSeries, InterpolationReport) {
        let total = self.cells.len();
        let missing_before = self.cells.iter().filter(|c| c.is_none()).count();
        let report = InterpolationReport {
            missing_before,
            total,
        };

        let Some(first_valid) = self.first_valid_index() else {
            return (self.clone(), report);
        };

        let mut filled = self.cells.clone();
        let first_value = filled[first_valid];
        for cell in filled.iter_mut().take(first_valid) {
            *cell = first_value;
        }

        let mut last_seen = first_value;
        for cell in filled.iter_mut().skip(first_valid) {
            match cell {
                Some(v) => last_seen = Some(*v),
                None => *cell = last_seen,
            }
        }

        (RatingSeries::new(self.dates.clone(), filled), report)
    }

    /// Index of the last originally-valid cell, used by calculators that
    /// need to know where real data ended (e.g. to bound a trailing window).
    pub fn last_valid(&self) -> Option<usize> {
        self.last_valid_index()
    }
}
