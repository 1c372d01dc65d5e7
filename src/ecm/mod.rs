//! Incremental error-correction model. Scores how far a user-typed prefix
//! has diverged from a hypothesis token sequence, one word at a time, and
//! turns the resulting edit operations into in-place corrections.

mod edit_distance;
mod score_info;
mod segment;
mod word;

pub use edit_distance::EditOperation;
pub use score_info::EcmScoreInfo;
pub use segment::{SegmentEditDistance, SegmentPrefixResult};
pub use word::WordEditDistance;

use crate::decoder::TranslationResultBuilder;
use crate::types::TranslationSources;

/// Probabilistic edit-distance model over target tokens. Costs are negative
/// log probabilities derived from a hit probability and relative
/// insertion/substitution/deletion rates over an assumed vocabulary size.
#[derive(Debug, Clone)]
pub struct ErrorCorrectionModel {
    segment_edit_distance: SegmentEditDistance,
}

impl Default for ErrorCorrectionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorCorrectionModel {
    pub fn new() -> Self {
        let mut ecm = Self {
            segment_edit_distance: SegmentEditDistance::new(),
        };
        ecm.set_error_model_parameters(128, 0.8, 0.1, 0.1, 0.1);
        ecm
    }

    /// Derive edit costs from an error model. `vocabulary_size` of zero means
    /// the factors are used as raw probabilities.
    pub fn set_error_model_parameters(
        &mut self,
        vocabulary_size: usize,
        hit_probability: f64,
        insertion_factor: f64,
        substitution_factor: f64,
        deletion_factor: f64,
    ) {
        let voc_size = vocabulary_size as f64;
        let e = if vocabulary_size == 0 {
            (1.0 - hit_probability)
                / (insertion_factor + substitution_factor + deletion_factor)
        } else {
            (1.0 - hit_probability)
                / (insertion_factor * voc_size
                    + substitution_factor * (voc_size - 1.0)
                    + deletion_factor)
        };

        self.segment_edit_distance.set_hit_cost(-hit_probability.ln());
        self.segment_edit_distance
            .set_insertion_cost(-(insertion_factor * e).ln());
        self.segment_edit_distance
            .set_substitution_cost(-(substitution_factor * e).ln());
        self.segment_edit_distance
            .set_deletion_cost(-(deletion_factor * e).ln());
    }

    pub fn setup_initial_esi(&self, esi: &mut EcmScoreInfo) {
        esi.scores.clear();
        esi.scores.push(0.0);
        esi.operations.clear();
    }

    pub fn setup_esi(&self, esi: &mut EcmScoreInfo, prev_esi: &EcmScoreInfo, word: &str) {
        let score = self
            .segment_edit_distance
            .compute(&[word.to_string()], &[]);
        esi.scores.clear();
        esi.scores.push(prev_esi.scores[0] + score);
        esi.operations.clear();
        esi.operations.push(EditOperation::None);
    }

    pub fn extend_initial_esi(&self, esi: &mut EcmScoreInfo, prefix_diff: &[String]) {
        self.segment_edit_distance
            .incr_compute_prefix_first_row(&mut esi.scores, prefix_diff);
    }

    pub fn extend_esi(
        &self,
        esi: &mut EcmScoreInfo,
        prev_esi: &EcmScoreInfo,
        word: &str,
        prefix_diff: &[String],
        is_last_word_complete: bool,
    ) {
        let ops = self.segment_edit_distance.incr_compute_prefix(
            &mut esi.scores,
            &prev_esi.scores,
            word,
            prefix_diff,
            is_last_word_complete,
        );
        esi.operations.extend(ops);
    }

    /// Rewrite the leading `uncorrected_prefix_len` tokens of the builder so
    /// they spell out `prefix`. Returns the number of alignment columns the
    /// corrected prefix now occupies.
    pub fn correct_prefix(
        &self,
        builder: &mut TranslationResultBuilder<'_>,
        uncorrected_prefix_len: usize,
        prefix: &[String],
        is_last_word_complete: bool,
    ) -> usize {
        if uncorrected_prefix_len == 0 {
            for word in prefix {
                builder.append_token(word.clone(), TranslationSources::PREFIX, -1.0);
            }
            return prefix.len();
        }

        let result = self.segment_edit_distance.compute_prefix(
            &builder.words()[..uncorrected_prefix_len],
            prefix,
            is_last_word_complete,
            false,
        );
        builder.correct_prefix(&result.word_ops, &result.char_ops, prefix, is_last_word_complete)
    }
}
