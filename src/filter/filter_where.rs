use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo};

/// A parsed MongoDB-style filter that can be evaluated against JSON documents.
///
/// Top-level keys are implicitly AND-ed. Field keys map either to a literal
/// (implicit `$eq`) or to an object of operators; `$and`, `$or` and `$nor`
/// take arrays of nested filters.
#[derive(Debug, Clone, Default)]
pub struct FilterWhere {
    conditions: Vec<Condition>,
}

#[derive(Debug, Clone)]
enum Condition {
    Field(FilterWhereInfo),
    Logical { operator: FilterOp, branches: Vec<FilterWhere> },
}

impl FilterWhere {
    pub fn parse(where_data: &Map<String, Value>) -> Result<Self, FilterError> {
        let mut filter_where = Self::default();
        for (key, value) in where_data {
            if key.starts_with('$') {
                filter_where.parse_logical_operator(key, value)?;
            } else {
                filter_where.parse_field_condition(key, value)?;
            }
        }
        Ok(filter_where)
    }

    fn parse_logical_operator(&mut self, op: &str, value: &Value) -> Result<(), FilterError> {
        let operator = FilterOp::from_key(op)?;
        if !operator.is_logical() {
            return Err(FilterError::UnsupportedOperator(op.to_string()));
        }

        let arr = value
            .as_array()
            .filter(|arr| !arr.is_empty())
            .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires a non-empty array", op)))?;

        let mut branches = Vec::with_capacity(arr.len());
        for v in arr {
            let obj = v
                .as_object()
                .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} entries must be objects", op)))?;
            branches.push(Self::parse(obj)?);
        }

        self.conditions.push(Condition::Logical { operator, branches });
        Ok(())
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<(), FilterError> {
        match value {
            Value::Object(obj) if !obj.is_empty() && obj.keys().all(|k| k.starts_with('$')) => {
                for (op_key, op_val) in obj {
                    let operator = FilterOp::from_key(op_key)?;
                    if operator.is_logical() {
                        return Err(FilterError::UnsupportedOperator(op_key.clone()));
                    }
                    if matches!(operator, FilterOp::In | FilterOp::NIn) && !op_val.is_array() {
                        return Err(FilterError::InvalidOperatorData(format!("{} requires an array", op_key)));
                    }
                    self.conditions.push(Condition::Field(FilterWhereInfo {
                        field: field.to_string(),
                        operator,
                        data: op_val.clone(),
                    }));
                }
            }
            // Implicit equality: { field: value }
            _ => self.conditions.push(Condition::Field(FilterWhereInfo {
                field: field.to_string(),
                operator: FilterOp::Eq,
                data: value.clone(),
            })),
        }
        Ok(())
    }

    pub fn matches(&self, document: &Map<String, Value>) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::Field(info) => field_matches(document, info),
            Condition::Logical { operator, branches } => match operator {
                FilterOp::And => branches.iter().all(|b| b.matches(document)),
                FilterOp::Or => branches.iter().any(|b| b.matches(document)),
                _ => !branches.iter().any(|b| b.matches(document)),
            },
        })
    }
}

fn field_matches(document: &Map<String, Value>, info: &FilterWhereInfo) -> bool {
    let actual = resolve(document, &info.field);
    match info.operator {
        FilterOp::Eq => equals(actual, &info.data),
        FilterOp::Ne => !equals(actual, &info.data),
        FilterOp::Gt => compares(actual, &info.data, |o| o == Ordering::Greater),
        FilterOp::Gte => compares(actual, &info.data, |o| o != Ordering::Less),
        FilterOp::Lt => compares(actual, &info.data, |o| o == Ordering::Less),
        FilterOp::Lte => compares(actual, &info.data, |o| o != Ordering::Greater),
        FilterOp::In => one_of(actual, &info.data),
        FilterOp::NIn => !one_of(actual, &info.data),
        FilterOp::Exists => actual.is_some() == truthy(&info.data),
        FilterOp::And | FilterOp::Or | FilterOp::Nor => false,
    }
}

/// Look up a possibly dotted path (`stats.hp`) inside nested objects
fn resolve<'a>(document: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

// A missing field equals null; an array field matches when any element does
fn equals(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => items.iter().any(|item| json_eq(item, expected)),
        Some(value) => json_eq(value, expected),
    }
}

fn compares(actual: Option<&Value>, expected: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    match actual {
        Some(Value::Array(items)) => items.iter().any(|item| order(item, expected).is_some_and(&accept)),
        Some(value) => order(value, expected).is_some_and(accept),
        None => false,
    }
}

fn one_of(actual: Option<&Value>, candidates: &Value) -> bool {
    candidates
        .as_array()
        .is_some_and(|values| values.iter().any(|candidate| equals(actual, candidate)))
}

fn order(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => true,
    }
}

/// Structural equality where numbers compare by value (`1` equals `1.0`)
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => x.len() == y.len() && x.iter().zip(y).all(|(l, r)| json_eq(l, r)),
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len() && x.iter().all(|(k, v)| y.get(k).is_some_and(|other| json_eq(v, other)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn check(filter: Value, document: Value) -> bool {
        FilterWhere::parse(&obj(filter)).unwrap().matches(&obj(document))
    }

    #[test]
    fn implicit_equality_and_numeric_coercion() {
        assert!(check(json!({"userId": -1}), json!({"userId": -1.0, "username": "x"})));
        assert!(!check(json!({"userId": -2}), json!({"userId": -1})));
        assert!(check(json!({}), json!({"anything": true})));
    }

    #[test]
    fn missing_field_equals_null() {
        assert!(check(json!({"owner": null}), json!({"name": "sword"})));
        assert!(!check(json!({"owner": null}), json!({"owner": "bob"})));
    }

    #[test]
    fn array_fields_match_any_element() {
        let doc = json!({"tags": ["fire", "sharp"]});
        assert!(check(json!({"tags": "fire"}), doc.clone()));
        assert!(!check(json!({"tags": "ice"}), doc.clone()));
        assert!(check(json!({"tags": ["fire", "sharp"]}), doc));
    }

    #[test]
    fn comparison_operators() {
        let doc = json!({"level": 10, "name": "orc"});
        assert!(check(json!({"level": {"$gt": 5, "$lte": 10}}), doc.clone()));
        assert!(!check(json!({"level": {"$lt": 10}}), doc.clone()));
        assert!(check(json!({"name": {"$gte": "o"}}), doc.clone()));
        assert!(!check(json!({"name": {"$gt": 3}}), doc));
    }

    #[test]
    fn set_and_existence_operators() {
        let doc = json!({"rarity": "epic", "stats": {"hp": 30}});
        assert!(check(json!({"rarity": {"$in": ["rare", "epic"]}}), doc.clone()));
        assert!(check(json!({"rarity": {"$nin": ["common"]}}), doc.clone()));
        assert!(check(json!({"stats.hp": {"$exists": true}}), doc.clone()));
        assert!(check(json!({"stats.mp": {"$exists": false}}), doc.clone()));
        assert!(check(json!({"stats.hp": {"$ne": 31}}), doc));
    }

    #[test]
    fn logical_operators() {
        let doc = json!({"level": 3, "kind": "goblin"});
        assert!(check(json!({"$or": [{"kind": "orc"}, {"level": 3}]}), doc.clone()));
        assert!(check(json!({"$and": [{"kind": "goblin"}, {"level": {"$gte": 1}}]}), doc.clone()));
        assert!(!check(json!({"$nor": [{"kind": "goblin"}]}), doc));
    }

    #[test]
    fn rejects_unknown_operators_and_bad_data() {
        let err = FilterWhere::parse(&obj(json!({"name": {"$regex": "^o"}}))).unwrap_err();
        assert_eq!(err, FilterError::UnsupportedOperator("$regex".to_string()));

        let err = FilterWhere::parse(&obj(json!({"$or": {}}))).unwrap_err();
        assert!(matches!(err, FilterError::InvalidOperatorData(_)));

        let err = FilterWhere::parse(&obj(json!({"rarity": {"$in": "epic"}}))).unwrap_err();
        assert!(matches!(err, FilterError::InvalidOperatorData(_)));
    }

    #[test]
    fn object_literals_compare_structurally() {
        assert!(check(json!({"stats": {"hp": 30}}), json!({"stats": {"hp": 30.0}})));
        assert!(!check(json!({"stats": {"hp": 30}}), json!({"stats": {"hp": 30, "mp": 1}})));
    }
}
