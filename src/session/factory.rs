use std::sync::Arc;

use tracing::debug;

use crate::ecm::ErrorCorrectionModel;
use crate::engine::InteractiveTranslationEngine;
use crate::error::TranslationError;
use crate::tokenization::{
    Detokenizer, RangeTokenizer, WhitespaceDetokenizer, WhitespaceTokenizer,
};

use super::translator::InteractiveTranslator;

/// Builds interactive translators for an engine, sharing one error-correction
/// model and tokenizer configuration across sessions.
pub struct InteractiveTranslatorFactory {
    engine: Arc<dyn InteractiveTranslationEngine>,
    error_correction_model: Arc<ErrorCorrectionModel>,
    source_tokenizer: Arc<dyn RangeTokenizer>,
    target_tokenizer: Arc<dyn RangeTokenizer>,
    target_detokenizer: Arc<dyn Detokenizer>,
}

impl InteractiveTranslatorFactory {
    pub fn new(engine: Arc<dyn InteractiveTranslationEngine>) -> Self {
        Self {
            engine,
            error_correction_model: Arc::new(ErrorCorrectionModel::new()),
            source_tokenizer: Arc::new(WhitespaceTokenizer),
            target_tokenizer: Arc::new(WhitespaceTokenizer),
            target_detokenizer: Arc::new(WhitespaceDetokenizer),
        }
    }

    pub fn with_tokenizers(
        engine: Arc<dyn InteractiveTranslationEngine>,
        source_tokenizer: Arc<dyn RangeTokenizer>,
        target_tokenizer: Arc<dyn RangeTokenizer>,
        target_detokenizer: Arc<dyn Detokenizer>,
    ) -> Self {
        Self {
            engine,
            error_correction_model: Arc::new(ErrorCorrectionModel::new()),
            source_tokenizer,
            target_tokenizer,
            target_detokenizer,
        }
    }

    /// Start a session for a source segment. Fetches the word graph from the
    /// engine and seeds the processor with an empty prefix.
    pub async fn create(
        &self,
        segment: &str,
        sentence_start: bool,
    ) -> Result<InteractiveTranslator, TranslationError> {
        let source_tokens = self.source_tokenizer.tokenize(segment);
        debug!(token_count = source_tokens.len(), "starting session");
        let word_graph = self.engine.get_word_graph(&source_tokens).await?;
        Ok(InteractiveTranslator::new(
            Arc::clone(&self.error_correction_model),
            Arc::clone(&self.engine),
            Arc::clone(&self.target_tokenizer),
            Arc::clone(&self.target_detokenizer),
            Arc::new(word_graph),
            sentence_start,
        ))
    }
}
