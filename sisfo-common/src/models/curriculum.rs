//! Curricula and their grading tables

use super::{require_id, require_text, RecordMeta};
use crate::{FieldErrors, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curriculum {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub year: i64,
    pub is_active: bool,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Curriculum {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "name", "Name", &self.name);
        require_text(&mut errors, "tenant_id", "Tenant ID", &self.tenant_id);
        if self.year <= 0 {
            errors.add("year", "Year must be valid");
        }
        errors.into_result()
    }
}

/// Subject offered by a curriculum at a grade level and semester
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumSubject {
    pub id: Uuid,
    pub tenant_id: String,
    pub curriculum_id: Uuid,
    pub subject_id: Uuid,
    pub grade_level: i64,
    pub semester: i64,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl CurriculumSubject {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        require_id(&mut errors, "curriculum_id", "Curriculum ID", self.curriculum_id);
        require_id(&mut errors, "subject_id", "Subject ID", self.subject_id);
        if self.semester != 1 && self.semester != 2 {
            errors.add("semester", "Semester must be 1 or 2");
        }
        errors.into_result()
    }
}

/// One row of a curriculum's letter-grade table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingRule {
    pub id: Uuid,
    pub tenant_id: String,
    pub curriculum_id: Uuid,
    /// Letter, e.g. `A`
    pub grade: String,
    pub min_score: f64,
    pub max_score: f64,
    pub points: f64,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl GradingRule {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        require_id(&mut errors, "curriculum_id", "Curriculum ID", self.curriculum_id);
        require_text(&mut errors, "grade", "Grade", &self.grade);
        if self.min_score < 0.0 {
            errors.add("min_score", "Min score cannot be negative");
        }
        if self.max_score < 0.0 {
            errors.add("max_score", "Max score cannot be negative");
        }
        if self.min_score > self.max_score {
            errors.add("min_score", "Min score cannot be greater than max score");
        }
        if self.points < 0.0 {
            errors.add("points", "Points cannot be negative");
        }
        errors.into_result()
    }

    /// Inclusive range test
    pub fn covers(&self, score: f64) -> bool {
        self.min_score <= score && score <= self.max_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn rule(min: f64, max: f64) -> GradingRule {
        GradingRule {
            id: Uuid::new_v4(),
            tenant_id: "t1".into(),
            curriculum_id: Uuid::new_v4(),
            grade: "B".into(),
            min_score: min,
            max_score: max,
            points: 3.0,
            description: String::new(),
            meta: RecordMeta::default(),
        }
    }

    #[test]
    fn test_rule_inverted_range() {
        match rule(90.0, 80.0).validate() {
            Err(Error::Validation(e)) => assert_eq!(
                e.get("min_score"),
                Some("Min score cannot be greater than max score")
            ),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_rule_negative_min() {
        match rule(-1.0, 10.0).validate() {
            Err(Error::Validation(e)) => {
                assert_eq!(e.get("min_score"), Some("Min score cannot be negative"))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_rule_covers_bounds() {
        let r = rule(80.0, 89.99);
        assert!(r.covers(80.0));
        assert!(r.covers(89.99));
        assert!(!r.covers(90.0));
    }
}
