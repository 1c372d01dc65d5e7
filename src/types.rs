use std::ops::{BitOr, BitOrAssign};

use crate::matrix::WordAlignmentMatrix;

/// Longest source segment (in tokens) the interactive decoder will handle.
pub const MAX_SEGMENT_LENGTH: usize = 200;

/// Half-open token range [start, end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "range start must not exceed end");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Provenance bit flags for a target token: produced by the engine (SMT),
/// typed by the translator (PREFIX), both, or neither (untranslated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TranslationSources(u8);

impl TranslationSources {
    pub const NONE: Self = Self(0);
    pub const SMT: Self = Self(1);
    pub const PREFIX: Self = Self(2);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for TranslationSources {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TranslationSources {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A contiguous run of target tokens attributed to a contiguous run of source
/// tokens. `target_segment_cut` is the exclusive end index into the target
/// token sequence covered by this and all earlier phrases.
#[derive(Debug, Clone, PartialEq)]
pub struct Phrase {
    pub source_segment_range: Range,
    pub target_segment_cut: usize,
    /// Minimum confidence over the tokens contained in the phrase.
    pub confidence: f64,
}

/// An immutable, phrase-aligned translation of one source segment.
#[derive(Debug, Clone)]
pub struct TranslationResult {
    /// Detokenized rendering of `target_tokens`.
    pub translation: String,
    pub source_tokens: Vec<String>,
    pub target_tokens: Vec<String>,
    /// One confidence per target token, in [0, 1], or -1.0 when unscored.
    pub confidences: Vec<f64>,
    pub sources: Vec<TranslationSources>,
    pub alignment: WordAlignmentMatrix,
    pub phrases: Vec<Phrase>,
}

impl TranslationResult {
    pub fn new(
        translation: String,
        source_tokens: Vec<String>,
        target_tokens: Vec<String>,
        confidences: Vec<f64>,
        sources: Vec<TranslationSources>,
        alignment: WordAlignmentMatrix,
        phrases: Vec<Phrase>,
    ) -> Self {
        assert_eq!(
            confidences.len(),
            target_tokens.len(),
            "confidences must be the same length as the target tokens"
        );
        assert_eq!(
            sources.len(),
            target_tokens.len(),
            "sources must be the same length as the target tokens"
        );
        assert_eq!(
            alignment.row_count(),
            source_tokens.len(),
            "alignment row count must match the source token count"
        );
        assert_eq!(
            alignment.column_count(),
            target_tokens.len(),
            "alignment column count must match the target token count"
        );
        Self {
            translation,
            source_tokens,
            target_tokens,
            confidences,
            sources,
            alignment,
            phrases,
        }
    }

    /// Longest source prefix fully covered by phrases whose target cut does
    /// not exceed `prefix_count`.
    pub fn aligned_source_segment(&self, prefix_count: usize) -> &[String] {
        let mut source_length = 0;
        for phrase in &self.phrases {
            if phrase.target_segment_cut > prefix_count {
                break;
            }
            if phrase.source_segment_range.end > source_length {
                source_length = phrase.source_segment_range.end;
            }
        }
        &self.source_tokens[..source_length]
    }
}

/// A span of target words extracted from a [`TranslationResult`] to show to
/// the translator.
#[derive(Debug, Clone)]
pub struct TranslationSuggestion {
    pub result: TranslationResult,
    pub target_word_indices: Vec<usize>,
    pub confidence: f64,
}

impl TranslationSuggestion {
    pub fn target_words(&self) -> Vec<&str> {
        self.target_word_indices
            .iter()
            .map(|&i| self.result.target_tokens[i].as_str())
            .collect()
    }
}
