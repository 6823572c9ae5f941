use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum DatasetError {
    #[display("failed to read dataset file")]
    ReadFile,
    #[display("failed to parse dataset: {reason}")]
    Parse { reason: String },
    #[display("candles out of order at index {index}")]
    Unsorted { index: usize },
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
    #[display("unparsable parameters \"{input}\"")]
    Parse { input: String },
    #[display("expected {expected} parameters, got {got}")]
    Arity { expected: usize, got: usize },
    #[display("unknown indicator kind \"{kind}\"")]
    UnknownKind { kind: String },
}

#[derive(Debug, Display, Error)]
pub enum DrawingError {
    #[display("unknown drawing tool \"{kind}\"")]
    UnknownKind { kind: String },
    #[display("{kind} needs a second point")]
    MissingPoint { kind: String },
}
