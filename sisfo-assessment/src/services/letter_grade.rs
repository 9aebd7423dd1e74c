//! Final score to letter grade and points
//!
//! A semester bound to a curriculum uses that curriculum's grading rules.
//! Otherwise the built-in A..E ladder applies.

use serde::Serialize;
use sisfo_common::models::GradingRule;

/// Credit used for a subject whose `credit_units` is not set
pub const DEFAULT_CREDIT: i64 = 3;

/// Built-in ladder: lower bound, letter, points
const BUILTIN_LADDER: [(f64, &str, f64); 5] = [
    (90.0, "A", 4.0),
    (80.0, "B", 3.0),
    (70.0, "C", 2.0),
    (60.0, "D", 1.0),
    (0.0, "E", 0.0),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LetterGrade {
    pub letter: String,
    pub points: f64,
}

#[derive(Debug, Clone)]
pub enum GradeScale {
    Builtin,
    /// Sorted by `min_score`, highest band first
    Rules(Vec<GradingRule>),
}

impl GradeScale {
    /// Rules scale, or the built-in ladder when there are no rules
    pub fn from_rules(mut rules: Vec<GradingRule>) -> Self {
        if rules.is_empty() {
            return GradeScale::Builtin;
        }
        rules.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));
        GradeScale::Rules(rules)
    }

    pub fn grade(&self, score: f64) -> LetterGrade {
        match self {
            GradeScale::Builtin => {
                let (_, letter, points) = BUILTIN_LADDER
                    .iter()
                    .find(|(min, _, _)| score >= *min)
                    .unwrap_or(&BUILTIN_LADDER[BUILTIN_LADDER.len() - 1]);
                LetterGrade {
                    letter: letter.to_string(),
                    points: *points,
                }
            }
            GradeScale::Rules(rules) => {
                // First covering band; a score in a gap between bands falls
                // to the next band down, below every band to the lowest.
                let rule = rules
                    .iter()
                    .find(|r| r.covers(score))
                    .or_else(|| rules.iter().find(|r| r.min_score <= score))
                    .or_else(|| rules.last());
                match rule {
                    Some(r) => LetterGrade {
                        letter: r.grade.clone(),
                        points: r.points,
                    },
                    None => GradeScale::Builtin.grade(score),
                }
            }
        }
    }

    /// Largest point value this scale can award
    pub fn max_points(&self) -> f64 {
        match self {
            GradeScale::Builtin => BUILTIN_LADDER[0].2,
            GradeScale::Rules(rules) => rules.iter().map(|r| r.points).fold(0.0, f64::max),
        }
    }
}

/// Credit for a report card line
pub fn credit_for(credit_units: Option<i64>) -> i64 {
    match credit_units {
        Some(units) if units > 0 => units,
        _ => DEFAULT_CREDIT,
    }
}
