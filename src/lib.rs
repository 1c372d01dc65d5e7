pub mod decoder;
pub mod ecm;
pub mod engine;
pub mod error;
pub mod graph;
pub mod matrix;
pub mod session;
pub mod suggest;
pub mod tokenization;
pub mod types;

pub use ecm::ErrorCorrectionModel;
pub use engine::{InteractiveTranslationEngine, TranslationEngine};
pub use error::TranslationError;
pub use graph::{WordGraph, WordGraphArc, INITIAL_STATE, LOG_ZERO};
pub use matrix::WordAlignmentMatrix;
pub use session::{InteractiveTranslator, InteractiveTranslatorFactory};
pub use suggest::{PhraseTranslationSuggester, TranslationSuggester};
pub use tokenization::{
    Detokenizer, RangeTokenizer, WhitespaceDetokenizer, WhitespaceTokenizer,
};
pub use types::{
    Phrase, Range, TranslationResult, TranslationSources, TranslationSuggestion,
    MAX_SEGMENT_LENGTH,
};
