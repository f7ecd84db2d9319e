//! Ordered query parameter map
//!
//! Keys keep their first-seen order and may carry several values, the way a
//! query dictionary does. Selector parameters are written with [`QueryParams::set`],
//! which replaces the values of an existing key in place.

use url::form_urlencoded;

/// Insertion-ordered, multi-valued query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    /// Create an empty parameter map
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string
    ///
    /// A leading `?` is ignored. A bare key (`download`) is present with an
    /// empty value.
    ///
    /// # Arguments
    /// * `query` - Raw query string, percent-encoded
    ///
    /// # Returns
    /// * `QueryParams` - Parsed parameters
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params.append(key.into_owned(), value.into_owned());
        }
        params
    }

    /// Add a value, keeping any existing values of the key
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Replace all values of a key, or append the key if it is new
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => *values = vec![value],
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Last value of a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).last().map(String::as_str)
    }

    /// All values of a key, in order
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the key is present, with or without a value
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Remove a key and all its values
    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    /// Iterate over keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate over `(key, value)` pairs in order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no parameters
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to a percent-encoded query string without the leading `?`
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.pairs() {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.append(key, value);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_order_and_values() {
        let params = QueryParams::parse("?b=2&a=1&b=3");
        assert_eq!(params.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(params.get("b"), Some("3"));
        assert_eq!(params.get_all("b"), ["2", "3"]);
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn test_bare_key_is_present() {
        let params = QueryParams::parse("download&page=2");
        assert!(params.contains("download"));
        assert_eq!(params.get("download"), Some(""));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut params = QueryParams::parse("resource_format=csv&q=x&resource_format=xls");
        params.set("resource_format", "json");
        params.set("resource_class", "1");
        assert_eq!(
            params.to_query_string(),
            "resource_format=json&q=x&resource_class=1"
        );
    }

    #[test]
    fn test_query_string_is_encoded() {
        let params: QueryParams = [("q", "a b&c"), ("name", "é")].into_iter().collect();
        assert_eq!(params.to_query_string(), "q=a+b%26c&name=%C3%A9");
        assert_eq!(QueryParams::parse(&params.to_query_string()), params);
    }

    #[test]
    fn test_remove() {
        let mut params = QueryParams::parse("a=1&b=2");
        params.remove("a");
        assert_eq!(params.len(), 1);
        assert!(!params.contains("a"));
        assert!(!params.is_empty());
    }
}
