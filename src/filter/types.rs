use serde_json::Value;

use super::error::FilterError;

/// Query operators understood by the in-memory evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NIn,
    Exists,

    And,
    Or,
    Nor,
}

impl FilterOp {
    pub fn from_key(key: &str) -> Result<Self, FilterError> {
        Ok(match key {
            "$eq" => FilterOp::Eq,
            "$ne" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            "$exists" => FilterOp::Exists,
            "$and" => FilterOp::And,
            "$or" => FilterOp::Or,
            "$nor" => FilterOp::Nor,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, FilterOp::And | FilterOp::Or | FilterOp::Nor)
    }
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub field: String,
    pub operator: FilterOp,
    pub data: Value,
}
