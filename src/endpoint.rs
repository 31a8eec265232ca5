use std::collections::BTreeMap;
use std::fmt;

use url::form_urlencoded;

pub const PATH_QUERY: &str = "query";

pub const QUERY_API_KEY: &str = "apikey";
pub const QUERY_DATA_TYPE: &str = "datatype";
pub const QUERY_OUTPUT_SIZE: &str = "outputsize";
pub const QUERY_FUNCTION: &str = "function";
pub const QUERY_SYMBOL: &str = "symbol";
pub const QUERY_INTERVAL: &str = "interval";
pub const QUERY_MARKET: &str = "market";

pub const VALUE_CSV: &str = "csv";
pub const VALUE_COMPACT: &str = "compact";

/// Path plus query parameters identifying one remote operation.
///
/// Parameters are kept sorted by key so the rendered query string is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    path: String,
    params: BTreeMap<String, String>,
}

impl Endpoint {
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self {
            path: path.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn query() -> Self {
        Self::new(PATH_QUERY)
    }

    /// Sets `key`, replacing any earlier value.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.params.insert(key.into(), value.into());
    }

    pub fn with_param<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.set(key, value);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            f.write_str(&self.path)
        } else {
            write!(f, "{}?{}", self.path, self.query_string())
        }
    }
}
