pub mod dataset;
pub mod error;
pub mod rating;
pub mod series;
pub mod stats;

pub use dataset::{Dataset, Entity, DEFAULT_INDUSTRY};
pub use error::AnalysisError;
pub use rating::{is_missing, Rating, RatingCell, MISSING_TOKEN};
pub use series::{InterpolationReport, QualityWarning, RatingSeries};
