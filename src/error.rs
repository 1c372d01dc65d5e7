use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("engine error while {context}: {message}")]
    Engine {
        context: &'static str,
        message: String,
    },
    #[error("invalid word graph: {message}")]
    InvalidWordGraph { message: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl TranslationError {
    pub fn engine(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Engine {
            context,
            message: err.to_string(),
        }
    }

    pub fn invalid_word_graph(message: impl Into<String>) -> Self {
        Self::InvalidWordGraph {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
