use std::sync::Arc;

use tracing::debug;

use crate::decoder::{ErrorCorrectionWordGraphProcessor, Results};
use crate::ecm::ErrorCorrectionModel;
use crate::engine::InteractiveTranslationEngine;
use crate::error::TranslationError;
use crate::graph::WordGraph;
use crate::tokenization::{Detokenizer, RangeTokenizer};
use crate::types::{Range, MAX_SEGMENT_LENGTH};

/// One interactive translation session over a single source segment. The
/// translator tracks the user's prefix as raw text, re-tokenizes it on every
/// edit, and keeps the word-graph processor in sync so current results are
/// always corrected against the latest prefix.
pub struct InteractiveTranslator {
    engine: Arc<dyn InteractiveTranslationEngine>,
    target_tokenizer: Arc<dyn RangeTokenizer>,
    word_graph: Arc<WordGraph>,
    processor: ErrorCorrectionWordGraphProcessor,
    prefix: String,
    prefix_word_ranges: Vec<Range>,
    sentence_start: bool,
}

impl InteractiveTranslator {
    pub(crate) fn new(
        ecm: Arc<ErrorCorrectionModel>,
        engine: Arc<dyn InteractiveTranslationEngine>,
        target_tokenizer: Arc<dyn RangeTokenizer>,
        target_detokenizer: Arc<dyn Detokenizer>,
        word_graph: Arc<WordGraph>,
        sentence_start: bool,
    ) -> Self {
        let processor = ErrorCorrectionWordGraphProcessor::new(
            ecm,
            target_detokenizer,
            Arc::clone(&word_graph),
        );
        let mut translator = Self {
            engine,
            target_tokenizer,
            word_graph,
            processor,
            prefix: String::new(),
            prefix_word_ranges: Vec::new(),
            sentence_start,
        };
        translator.correct();
        translator
    }

    pub fn source_tokens(&self) -> &[String] {
        self.word_graph.source_tokens()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn prefix_word_ranges(&self) -> &[Range] {
        &self.prefix_word_ranges
    }

    /// The last prefix word is complete when the prefix text continues past
    /// it, e.g. with a trailing space.
    pub fn is_last_word_complete(&self) -> bool {
        match self.prefix_word_ranges.last() {
            None => true,
            Some(range) => range.end < self.prefix.len(),
        }
    }

    pub fn is_source_segment_valid(&self) -> bool {
        self.source_tokens().len() <= MAX_SEGMENT_LENGTH
    }

    pub fn set_prefix(&mut self, prefix: &str) {
        if self.prefix != prefix {
            self.prefix = prefix.to_string();
            self.correct();
        }
    }

    /// Append raw text to the prefix. An empty addition is only meaningful
    /// while the last word is incomplete, since it cannot complete anything.
    pub fn append_to_prefix(&mut self, addition: &str) {
        assert!(
            !(addition.is_empty() && self.is_last_word_complete()),
            "an empty addition cannot complete the last word of the prefix"
        );
        self.prefix.push_str(addition);
        self.correct();
    }

    /// Append complete words. A partially typed last word is replaced by the
    /// first appended word.
    pub fn append_words_to_prefix(&mut self, words: &[&str]) {
        for word in words {
            if !self.is_last_word_complete() {
                let start = self.prefix_word_ranges[self.prefix_word_ranges.len() - 1].start;
                self.prefix.truncate(start);
            }
            self.prefix.push_str(word);
            self.prefix.push(' ');
            self.update_prefix_word_ranges();
        }
        self.correct();
    }

    /// Token-level prefix update bypassing the tokenizer, for callers that
    /// manage their own tokens or need to force the last word complete.
    pub fn set_prefix_tokens(&mut self, tokens: Vec<String>, is_last_word_complete: bool) {
        self.prefix = tokens.join(" ");
        if is_last_word_complete && !self.prefix.is_empty() {
            self.prefix.push(' ');
        }
        self.update_prefix_word_ranges();
        self.processor.correct(&tokens, is_last_word_complete);
    }

    /// Corrected translations for the current prefix, best first.
    pub fn current_results(&self) -> Results<'_> {
        self.processor.results()
    }

    /// Send the approved prefix to the engine as a training pair. Oversized
    /// segments are skipped. With `aligned_only`, only the source words
    /// phrase-aligned to the prefix are used.
    pub async fn approve(&self, aligned_only: bool) -> Result<(), TranslationError> {
        if !self.is_source_segment_valid() || self.prefix_word_ranges.len() > MAX_SEGMENT_LENGTH {
            debug!("segment too long, skipping training");
            return Ok(());
        }

        let prefix_tokens = self.prefix_tokens();
        let source_tokens: Vec<String> = if aligned_only {
            match self.current_results().next() {
                Some(result) => result
                    .aligned_source_segment(self.prefix_word_ranges.len())
                    .to_vec(),
                None => return Ok(()),
            }
        } else {
            self.source_tokens().to_vec()
        };

        if !source_tokens.is_empty() {
            self.engine
                .train_segment(&source_tokens, &prefix_tokens, self.sentence_start)
                .await?;
        }
        Ok(())
    }

    fn prefix_tokens(&self) -> Vec<String> {
        self.prefix_word_ranges
            .iter()
            .map(|r| self.prefix[r.start..r.end].to_string())
            .collect()
    }

    fn update_prefix_word_ranges(&mut self) {
        self.prefix_word_ranges = self
            .target_tokenizer
            .tokenize_as_ranges(&self.prefix, Range::new(0, self.prefix.len()));
    }

    fn correct(&mut self) {
        self.update_prefix_word_ranges();
        let tokens = self.prefix_tokens();
        let is_last_word_complete = self.is_last_word_complete();
        self.processor.correct(&tokens, is_last_word_complete);
    }
}
