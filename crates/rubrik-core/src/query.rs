//! Convenience builder for HTTP query parameters.
//!
//! Endpoints take their query strings as `(key, value)` pairs so the
//! transport can percent-encode them, rather than formatting them into the
//! endpoint path.

use std::fmt::Display;

/// Builder for assembling query parameter pairs.
#[derive(Debug, Default, Clone)]
pub struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append a required key/value pair.
    pub fn push<T>(&mut self, key: &'static str, value: T)
    where
        T: Display,
    {
        self.pairs.push((key, value.to_string()));
    }

    /// Chaining form of [`QueryParams::push`].
    #[must_use]
    pub fn with<T>(mut self, key: &'static str, value: T) -> Self
    where
        T: Display,
    {
        self.push(key, value);
        self
    }

    /// Return the collected key/value pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(&'static str, String)> {
        self.pairs
    }
}

#[cfg(test)]
mod tests {
    use super::QueryParams;

    #[test]
    fn with_preserves_order() {
        let params = QueryParams::new()
            .with("primary_cluster_id", "local")
            .with("is_relic", false);
        assert_eq!(
            params.into_pairs(),
            vec![
                ("primary_cluster_id", "local".to_string()),
                ("is_relic", "false".to_string())
            ]
        );
    }
}
