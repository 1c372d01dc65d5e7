use async_trait::async_trait;

use crate::error::TranslationError;
use crate::graph::WordGraph;
use crate::types::TranslationResult;

/// A translation backend that maps tokenized source segments to target
/// hypotheses.
#[async_trait]
pub trait TranslationEngine: Send + Sync {
    async fn translate(&self, segment: &[String]) -> Result<TranslationResult, TranslationError>;

    async fn translate_n_best(
        &self,
        n: usize,
        segment: &[String],
    ) -> Result<Vec<TranslationResult>, TranslationError>;
}

/// A backend that additionally exposes its hypothesis lattice and accepts
/// online training pairs, which is what interactive sessions need.
#[async_trait]
pub trait InteractiveTranslationEngine: TranslationEngine {
    async fn get_word_graph(&self, segment: &[String]) -> Result<WordGraph, TranslationError>;

    async fn train_segment(
        &self,
        source_tokens: &[String],
        target_tokens: &[String],
        sentence_start: bool,
    ) -> Result<(), TranslationError>;
}
