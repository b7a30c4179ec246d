//! Rubric payload types.
//!
//! The rubric arrives from the grading platform as structured JSON and is
//! stored and passed through unmodified. The types here mirror the wire
//! shape (Moodle advanced-grading rubric export); an absent rubric is
//! treated as one with no criteria.

use serde::{Deserialize, Serialize};

use crate::evaluation::loose_id;

/// A grading rubric: a named list of criteria.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rubric {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
}

/// One rubric criterion with its achievable levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    /// Platform rubrics emit ids as numbers or strings.
    #[serde(deserialize_with = "loose_id")]
    pub criterionid: String,
    pub criterion: String,
    #[serde(default)]
    pub levels: Vec<Level>,
}

/// One achievable level within a criterion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    #[serde(deserialize_with = "loose_id")]
    pub id: String,
    pub definition: String,
    #[serde(default)]
    pub score: f64,
}

impl Rubric {
    /// Decode a rubric from a stored JSON value.
    ///
    /// `null` and `{}` both decode to an empty rubric. Anything else that
    /// does not match the rubric shape is a decode error; the store never
    /// holds a half-valid rubric.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_rubric_decodes_to_empty_criteria() {
        let rubric = Rubric::from_value(&serde_json::Value::Null).unwrap();
        assert!(rubric.criteria.is_empty());
    }

    #[test]
    fn empty_object_decodes_to_empty_criteria() {
        let rubric = Rubric::from_value(&json!({})).unwrap();
        assert!(rubric.criteria.is_empty());
        assert!(rubric.name.is_none());
    }

    #[test]
    fn full_rubric_round_trips() {
        let value = json!({
            "name": "Rubric Name",
            "description": "Rubric Description",
            "criteria": [
                {
                    "criterionid": "1",
                    "criterion": "Correctness",
                    "levels": [
                        {"id": "1", "definition": "little to no documentation", "score": 0},
                        {"id": "2", "definition": "good documentation", "score": 25}
                    ]
                },
                {
                    "criterionid": "2",
                    "criterion": "Logic",
                    "levels": [
                        {"id": "3", "definition": "partial functionality", "score": 15},
                        {"id": "4", "definition": "fully functional", "score": 25}
                    ]
                }
            ]
        });

        let rubric = Rubric::from_value(&value).unwrap();
        assert_eq!(rubric.criteria.len(), 2);
        assert_eq!(rubric.criteria[0].criterion, "Correctness");
        assert_eq!(rubric.criteria[1].levels[1].score, 25.0);
    }

    #[test]
    fn numeric_ids_decode_as_strings() {
        let value = json!({
            "criteria": [
                {
                    "criterionid": 7,
                    "criterion": "Style",
                    "levels": [{"id": 19, "definition": "clean", "score": 10}]
                }
            ]
        });

        let rubric = Rubric::from_value(&value).unwrap();
        assert_eq!(rubric.criteria[0].criterionid, "7");
        assert_eq!(rubric.criteria[0].levels[0].id, "19");
    }

    #[test]
    fn malformed_rubric_is_an_error() {
        let value = json!({"criteria": "not-a-list"});
        assert!(Rubric::from_value(&value).is_err());
    }
}
