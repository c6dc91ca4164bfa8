use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::domain::{AnnotationQuery, DiseaseMode};

static AGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)age").expect("age pattern"));
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.?\d*").expect("number pattern"));
static BRCA1_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"brca1 mutation status: (\d)").expect("brca1 status pattern")
});
static DISEASE_STATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"disease state: (\S+)").expect("disease state pattern"));

static AGE_UNITS: LazyLock<Vec<(Regex, f64)>> = LazyLock::new(|| {
    [
        (r"(?i)year", 1.0),
        (r"(?i)month", 12.0),
        (r"(?i)day", 365.0),
        (r"(?i)hour", 8760.0),
    ]
    .into_iter()
    .map(|(pattern, divisor)| (Regex::new(pattern).expect("unit pattern"), divisor))
    .collect()
});

const BRCA1_MARKER: &str = "brca1 mutation status";
const DISEASE_MARKER: &str = "disease state";
const RHEUMATOID: &str = "rheumatoid";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum AnnotationField {
    Age { years: f64 },
    MutationStatus { code: u32 },
    DiseaseState { label: String },
}

pub type Rule = fn(&str) -> Option<AnnotationField>;

// No number means 0.0 (`age: newborn`), no unit word means years.
pub fn age_rule(row: &str) -> Option<AnnotationField> {
    if !AGE.is_match(row) {
        return None;
    }
    let value = NUMBER
        .find(row)
        .and_then(|found| found.as_str().parse::<f64>().ok())
        .unwrap_or(0.0);
    let divisor = AGE_UNITS
        .iter()
        .find(|(unit, _)| unit.is_match(row))
        .map(|(_, divisor)| *divisor)
        .unwrap_or(1.0);
    Some(AnnotationField::Age {
        years: value / divisor,
    })
}

pub fn mutation_status_rule(row: &str) -> Option<AnnotationField> {
    if !row.contains(BRCA1_MARKER) {
        return None;
    }
    let code = BRCA1_STATUS.captures(row)?[1].parse().ok()?;
    Some(AnnotationField::MutationStatus { code })
}

pub fn binary_disease_rule(row: &str) -> Option<AnnotationField> {
    let token = disease_token(row)?;
    let label = if token == RHEUMATOID {
        "rheumatoid arthritis"
    } else {
        "normal"
    };
    Some(AnnotationField::DiseaseState {
        label: label.to_string(),
    })
}

pub fn raw_disease_rule(row: &str) -> Option<AnnotationField> {
    disease_token(row).map(|token| AnnotationField::DiseaseState {
        label: token.to_string(),
    })
}

fn disease_token(row: &str) -> Option<&str> {
    if !row.contains(DISEASE_MARKER) {
        return None;
    }
    DISEASE_STATE
        .captures(row)
        .and_then(|caps| caps.get(1))
        .map(|token| token.as_str())
}

pub fn rule_for(query: AnnotationQuery) -> Rule {
    match query {
        AnnotationQuery::Age => age_rule,
        AnnotationQuery::MutationStatus => mutation_status_rule,
        AnnotationQuery::DiseaseState(DiseaseMode::Binary) => binary_disease_rule,
        AnnotationQuery::DiseaseState(DiseaseMode::Raw) => raw_disease_rule,
    }
}

pub fn extract<S: AsRef<str>>(rows: &[S], query: AnnotationQuery) -> Option<AnnotationField> {
    let rule = rule_for(query);
    rows.iter().find_map(|row| rule(row.as_ref()))
}
