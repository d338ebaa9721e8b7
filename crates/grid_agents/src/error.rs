//! Error types for the grid agents crate.

/// A specialized `Result` type for agent operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The primary error enum for all fallible operations within `grid_agents`.
///
/// The perceive/decide/act/learn loop itself never fails; these errors come from
/// construction, validation and parsing at the edges.
#[derive(Debug)]
pub enum Error {
    /// A configuration value is out of range or inconsistent.
    Config(String),
    /// An action name could not be parsed or is not part of the vocabulary.
    Action(String),
    /// The environment could not be built from the supplied layout.
    Environment(String),
    /// A rule expression could not be parsed.
    Rule(String),
    /// An unexpected internal error, which may indicate a bug.
    Internal(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Config(s) => write!(f, "Configuration error: {}", s),
            Error::Action(s) => write!(f, "Action error: {}", s),
            Error::Environment(s) => write!(f, "Environment error: {}", s),
            Error::Rule(s) => write!(f, "Rule error: {}", s),
            Error::Internal(s) => write!(f, "Internal error: {}", s),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = vec![
            (
                Error::Config("grid_size must be > 0".into()),
                "Configuration error: grid_size must be > 0",
            ),
            (
                Error::Action("unknown action 'jump'".into()),
                "Action error: unknown action 'jump'",
            ),
            (
                Error::Environment("goal out of bounds".into()),
                "Environment error: goal out of bounds",
            ),
            (
                Error::Rule("missing operator".into()),
                "Rule error: missing operator",
            ),
            (
                Error::Internal("unexpected state".into()),
                "Internal error: unexpected state",
            ),
        ];

        for (error, expected) in errors {
            assert_eq!(format!("{}", error), expected);
        }
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("{invalid}");
        let error: Error = json_result.unwrap_err().into();
        assert!(matches!(error, Error::Internal(_)));
    }

    #[test]
    fn test_error_is_error_trait() {
        let error = Error::Rule("x >".into());
        let _: &dyn std::error::Error = &error;
    }
}
