//! Provider qualification points, scored independently of the risk categories.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Half-open numeric band `[min, max)`. `max: None` is open ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeBand {
    pub min: f64,
    #[serde(default)]
    pub max: Option<f64>,
    pub points: u32,
    #[serde(default)]
    pub label: String,
}

impl RangeBand {
    fn contains(&self, value: f64) -> bool {
        value >= self.min && self.max.map_or(true, |max| value < max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub id: String,
    pub label: String,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QualificationRule {
    Range { bands: Vec<RangeBand> },
    MultiSelect { options: Vec<SelectOption> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationCriterion {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub rule: QualificationRule,
}

impl QualificationCriterion {
    pub fn max_points(&self) -> u32 {
        match &self.rule {
            QualificationRule::Range { bands } => {
                bands.iter().map(|band| band.points).max().unwrap_or(0)
            }
            QualificationRule::MultiSelect { options } => {
                options.iter().map(|option| option.points).sum()
            }
        }
    }

    /// Points earned for an answer. Mismatched answer kinds score zero.
    pub fn score(&self, answer: Option<&QualificationAnswer>) -> u32 {
        match (&self.rule, answer) {
            (QualificationRule::Range { bands }, Some(QualificationAnswer::Value(value))) => {
                if !value.is_finite() {
                    return 0;
                }
                bands
                    .iter()
                    .find(|band| band.contains(*value))
                    .map(|band| band.points)
                    .unwrap_or(0)
            }
            (QualificationRule::MultiSelect { options }, Some(QualificationAnswer::Selected(ids))) => {
                let selected: BTreeSet<&str> = ids.iter().map(String::as_str).collect();
                options
                    .iter()
                    .filter(|option| selected.contains(option.id.as_str()))
                    .map(|option| option.points)
                    .sum()
            }
            _ => 0,
        }
    }
}

/// Reviewer answer for one criterion: a number for ranges, option ids for multi-selects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QualificationAnswer {
    Value(f64),
    Selected(Vec<String>),
}

pub type QualificationAnswers = BTreeMap<String, QualificationAnswer>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub criterion_id: String,
    pub name: String,
    pub points: u32,
    pub max_points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationScore {
    pub total: u32,
    pub max_possible: u32,
    pub breakdown: Vec<CriterionScore>,
}

pub fn score_qualifications(
    criteria: &[QualificationCriterion],
    answers: &QualificationAnswers,
) -> QualificationScore {
    let breakdown: Vec<CriterionScore> = criteria
        .iter()
        .map(|criterion| CriterionScore {
            criterion_id: criterion.id.clone(),
            name: criterion.name.clone(),
            points: criterion.score(answers.get(&criterion.id)),
            max_points: criterion.max_points(),
        })
        .collect();

    QualificationScore {
        total: breakdown.iter().map(|entry| entry.points).sum(),
        max_possible: breakdown.iter().map(|entry| entry.max_points).sum(),
        breakdown,
    }
}

fn band(min: f64, max: Option<f64>, points: u32, label: &str) -> RangeBand {
    RangeBand {
        min,
        max,
        points,
        label: label.to_string(),
    }
}

fn option(id: &str, label: &str, points: u32) -> SelectOption {
    SelectOption {
        id: id.to_string(),
        label: label.to_string(),
        points,
    }
}

/// Criteria installed on first run.
pub fn default_criteria() -> Vec<QualificationCriterion> {
    vec![
        QualificationCriterion {
            id: "years_experience".to_string(),
            name: "Years of Experience".to_string(),
            rule: QualificationRule::Range {
                bands: vec![
                    band(0.0, Some(3.0), 0, "Early career"),
                    band(3.0, Some(6.0), 1, "Established"),
                    band(6.0, Some(11.0), 2, "Experienced"),
                    band(11.0, None, 3, "Senior"),
                ],
            },
        },
        QualificationCriterion {
            id: "board_certifications".to_string(),
            name: "Board Certifications".to_string(),
            rule: QualificationRule::MultiSelect {
                options: vec![
                    option("board_certified", "Board certified in primary specialty", 2),
                    option("subspecialty", "Subspecialty certification", 2),
                    option("fellowship", "Fellowship trained", 1),
                ],
            },
        },
        QualificationCriterion {
            id: "academic_roles".to_string(),
            name: "Academic Roles".to_string(),
            rule: QualificationRule::MultiSelect {
                options: vec![
                    option("faculty_appointment", "Faculty appointment", 2),
                    option("research_grants", "Active research grants", 1),
                    option("publications", "Peer-reviewed publications", 1),
                ],
            },
        },
        QualificationCriterion {
            id: "leadership_roles".to_string(),
            name: "Leadership Roles".to_string(),
            rule: QualificationRule::MultiSelect {
                options: vec![
                    option("medical_director", "Medical director", 2),
                    option("department_chair", "Department chair", 2),
                    option("committee_chair", "Committee chair", 1),
                ],
            },
        },
    ]
}
