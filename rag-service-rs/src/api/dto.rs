use serde::{Deserialize, Serialize};

/// Bounds on the query length, in characters
pub const MIN_QUERY_CHARS: usize = 1;
pub const MAX_QUERY_CHARS: usize = 5000;

/// POST /ask request
#[derive(Debug, Deserialize)]
pub struct AskBody {
    pub query: String,
}

impl AskBody {
    /// Check the query length, returning the offending count on failure
    pub fn validate(&self) -> Result<(), usize> {
        let chars = self.query.chars().count();
        if (MIN_QUERY_CHARS..=MAX_QUERY_CHARS).contains(&chars) {
            Ok(())
        } else {
            Err(chars)
        }
    }
}

/// GET /healthz response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /readyz response
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub missing: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(query: &str) -> AskBody {
        AskBody { query: query.to_string() }
    }

    #[test]
    fn test_query_bounds() {
        assert_eq!(body("").validate(), Err(0));
        assert!(body("a").validate().is_ok());
        assert!(body(&"a".repeat(5000)).validate().is_ok());
        assert_eq!(body(&"a".repeat(5001)).validate(), Err(5001));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        assert!(body(&"é".repeat(5000)).validate().is_ok());
    }
}
