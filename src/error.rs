use thiserror::Error;

/// Errors raised at the JSON boundary. Text parsing itself never fails.
#[derive(Debug, Error)]
pub enum Error {
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("invalid document: {0}")]
    Shape(String),
    #[error("invalid parse options: {0}")]
    Options(String),
    #[error("serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl Error {
    pub(crate) fn from_document_json(e: serde_json::Error) -> Self {
        match e.classify() {
            serde_json::error::Category::Syntax | serde_json::error::Category::Eof => {
                Error::Syntax {
                    line: e.line(),
                    column: e.column(),
                    message: e.to_string(),
                }
            }
            _ => Error::Shape(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
