use serde_json::{Map, Value};

use super::error::FilterError;

const ID_FIELD: &str = "_id";

/// Field projection over top-level document fields.
///
/// Follows MongoDB's rules: a projection either includes or excludes fields,
/// never both, except that `_id` is always returned unless explicitly excluded.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Include { fields: Vec<String>, keep_id: bool },
    Exclude { fields: Vec<String> },
}

impl Projection {
    pub fn parse(selection: &Map<String, Value>) -> Result<Self, FilterError> {
        let mut included = Vec::new();
        let mut excluded = Vec::new();
        let mut keep_id = true;

        for (field, flag) in selection {
            let include = match flag {
                Value::Bool(b) => *b,
                Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
                other => {
                    return Err(FilterError::InvalidProjection(format!(
                        "value for '{}' must be a boolean or number, got {}",
                        field, other
                    )))
                }
            };

            if field == ID_FIELD {
                keep_id = include;
            } else if include {
                included.push(field.clone());
            } else {
                excluded.push(field.clone());
            }
        }

        if !included.is_empty() && !excluded.is_empty() {
            return Err(FilterError::InvalidProjection(
                "cannot mix inclusion and exclusion".to_string(),
            ));
        }

        let id_only = selection.len() == 1 && selection.contains_key(ID_FIELD) && keep_id;
        if !included.is_empty() || id_only {
            return Ok(Projection::Include { fields: included, keep_id });
        }

        if !keep_id {
            excluded.push(ID_FIELD.to_string());
        }
        Ok(Projection::Exclude { fields: excluded })
    }

    pub fn apply(&self, document: &Map<String, Value>) -> Map<String, Value> {
        match self {
            Projection::Include { fields, keep_id } => document
                .iter()
                .filter(|(key, _)| {
                    if key.as_str() == ID_FIELD {
                        *keep_id
                    } else {
                        fields.iter().any(|f| f == *key)
                    }
                })
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            Projection::Exclude { fields } => document
                .iter()
                .filter(|(key, _)| !fields.iter().any(|f| f == *key))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn sample() -> Map<String, Value> {
        obj(json!({"_id": "abc", "weaponId": 7, "name": "Axe", "damage": 12}))
    }

    #[test]
    fn exclusion_drops_named_fields() {
        let projection = Projection::parse(&obj(json!({"damage": 0}))).unwrap();
        let out = projection.apply(&sample());
        assert!(!out.contains_key("damage"));
        assert_eq!(out.get("name"), Some(&json!("Axe")));
        assert!(out.contains_key("_id"));
    }

    #[test]
    fn inclusion_keeps_id_unless_excluded() {
        let projection = Projection::parse(&obj(json!({"name": 1}))).unwrap();
        assert_eq!(projection.apply(&sample()), obj(json!({"_id": "abc", "name": "Axe"})));

        let projection = Projection::parse(&obj(json!({"name": true, "_id": false}))).unwrap();
        assert_eq!(projection.apply(&sample()), obj(json!({"name": "Axe"})));
    }

    #[test]
    fn id_only_projections() {
        let projection = Projection::parse(&obj(json!({"_id": 0}))).unwrap();
        assert!(!projection.apply(&sample()).contains_key("_id"));

        let projection = Projection::parse(&obj(json!({"_id": 1}))).unwrap();
        assert_eq!(projection.apply(&sample()), obj(json!({"_id": "abc"})));
    }

    #[test]
    fn mixed_projection_is_rejected() {
        let err = Projection::parse(&obj(json!({"name": 1, "damage": 0}))).unwrap_err();
        assert!(matches!(err, FilterError::InvalidProjection(_)));

        let err = Projection::parse(&obj(json!({"name": "yes"}))).unwrap_err();
        assert!(matches!(err, FilterError::InvalidProjection(_)));
    }

    #[test]
    fn empty_projection_returns_everything() {
        let projection = Projection::parse(&Map::new()).unwrap();
        assert_eq!(projection.apply(&sample()), sample());
    }
}
