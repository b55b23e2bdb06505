//! Error types for the data model

/// A feature identifier outside the fixed catalog
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown feature id: '{0}'")]
pub struct UnknownFeature(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_feature_display() {
        let err = UnknownFeature("checkout".to_string());
        assert_eq!(err.to_string(), "unknown feature id: 'checkout'");
    }
}
