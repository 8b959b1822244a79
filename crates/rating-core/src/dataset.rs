use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::rating::RatingCell;
use crate::series::RatingSeries;

/// Identity columns for one rated entity (a stock or an industry/index row).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub code: String,
    pub name: String,
    pub industry: String,
}

/// Shared label for entities whose source industry was empty or the literal
/// "uncategorized" (case-insensitive).
pub const DEFAULT_INDUSTRY: &str = "Uncategorized";

fn normalize_industry(industry: String) -> String {
    let trimmed = industry.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("uncategorized") {
        DEFAULT_INDUSTRY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// A rating table: a shared date axis plus one [`RatingSeries`] per entity.
///
/// Mirrors the wide CSV/table shape described for the source data: rows are
/// entities, columns are trading dates, cells are rating tokens.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub dates: Arc<[String]>,
    pub entities: Vec<Entity>,
    pub series: Vec<RatingSeries>,
}

impl Dataset {
    /// Build a dataset from parallel rows of raw tokens, validating shape.
    pub fn from_rows(
        dates: Vec<String>,
        rows: Vec<(Entity, Vec<String>)>,
    ) -> Result<Self, AnalysisError> {
        if dates.is_empty() {
            return Err(AnalysisError::InputEmpty("no date columns".into()));
        }
        if rows.is_empty() {
            return Err(AnalysisError::InputEmpty("no entity rows".into()));
        }

        let dates: Arc<[String]> = dates.into();
        let mut entities = Vec::with_capacity(rows.len());
        let mut series = Vec::with_capacity(rows.len());

        for (mut entity, tokens) in rows {
            if tokens.len() != dates.len() {
                return Err(AnalysisError::InputMalformed(format!(
                    "entity {} has {} rating cells, expected {}",
                    entity.code,
                    tokens.len(),
                    dates.len()
                )));
            }
            entity.industry = normalize_industry(entity.industry);
            let cells: Vec<RatingCell> = tokens.iter().map(|t| crate::rating::Rating::parse(t)).collect();
            entities.push(entity);
            series.push(RatingSeries::new(dates.clone(), cells));
        }

        Ok(Dataset {
            dates,
            entities,
            series,
        })
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn row(&self, code: &str) -> Option<(&Entity, &RatingSeries)> {
        self.entities
            .iter()
            .zip(self.series.iter())
            .find(|(e, _)| e.code == code)
    }

    /// Industry rows whose entities share `industry`, in dataset order.
    pub fn industry_rows(&self, industry: &str) -> Vec<(&Entity, &RatingSeries)> {
        self.entities
            .iter()
            .zip(self.series.iter())
            .filter(|(e, _)| e.industry == industry)
            .collect()
    }

    /// Distinct industries in first-seen order.
    pub fn industries(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for e in &self.entities {
            if !seen.contains(&e.industry) {
                seen.push(e.industry.clone());
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(code: &str, industry: &str) -> Entity {
        Entity {
            code: code.into(),
            name: format!("{code} Inc"),
            industry: industry.into(),
        }
    }

    #[test]
    fn rejects_mismatched_row_width() {
        let result = Dataset::from_rows(
            vec!["20240101".into(), "20240102".into()],
            vec![(entity("A", "Tech"), vec!["strong_bull".into()])],
        );
        assert!(matches!(result, Err(AnalysisError::InputMalformed(_))));
    }

    #[test]
    fn rejects_empty_dataset() {
        assert!(matches!(
            Dataset::from_rows(vec![], vec![]),
            Err(AnalysisError::InputEmpty(_))
        ));
    }

    #[test]
    fn empty_and_uncategorized_industries_share_default_label() {
        let dataset = Dataset::from_rows(
            vec!["20240101".into()],
            vec![
                (entity("A", ""), vec!["strong_bull".into()]),
                (entity("B", "Uncategorized"), vec!["mid_bull".into()]),
                (entity("C", "  "), vec!["small_bear".into()]),
            ],
        )
        .unwrap();
        assert_eq!(dataset.industries(), vec![DEFAULT_INDUSTRY]);
    }

    #[test]
    fn groups_by_industry() {
        let dataset = Dataset::from_rows(
            vec!["20240101".into()],
            vec![
                (entity("A", "Tech"), vec!["strong_bull".into()]),
                (entity("B", "Tech"), vec!["mid_bull".into()]),
                (entity("C", "Energy"), vec!["small_bear".into()]),
            ],
        )
        .unwrap();
        assert_eq!(dataset.industry_rows("Tech").len(), 2);
        assert_eq!(dataset.industries(), vec!["Tech", "Energy"]);
    }
}
