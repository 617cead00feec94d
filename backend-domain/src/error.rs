use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("malformed input: {0}")]
    InputMalformed(String),
    #[error("missing geo data for record {0}")]
    MissingGeoData(String),
    #[error("unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}
