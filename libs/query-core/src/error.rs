use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("`{key}` expects {expected}, got {got}")]
    Malformed {
        key: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("field reference for `{0}` must be a field name")]
    InvalidFieldRef(String),

    #[error("empty field name in `{0}`")]
    EmptyField(String),

    #[error("page and page_size must be >= 1 (got page={page}, page_size={page_size})")]
    InvalidPage { page: u64, page_size: u64 },
}

pub(crate) fn json_type_name(v: &serde_json::Value) -> &'static str {
    use serde_json::Value as V;
    match v {
        V::Null => "null",
        V::Bool(_) => "bool",
        V::Number(_) => "number",
        V::String(_) => "string",
        V::Array(_) => "array",
        V::Object(_) => "object",
    }
}
