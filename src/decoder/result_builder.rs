use crate::ecm::EditOperation;
use crate::matrix::WordAlignmentMatrix;
use crate::tokenization::Detokenizer;
use crate::types::{Phrase, Range, TranslationResult, TranslationSources};

#[derive(Debug, Clone)]
struct PhraseInfo {
    source_segment_range: Range,
    /// Exclusive end index into the target tokens covered so far.
    target_cut: usize,
    alignment: WordAlignmentMatrix,
}

/// Accumulates target tokens and phrase boundaries while a hypothesis is
/// replayed, then applies word-level edit operations so the leading tokens
/// match the user's prefix exactly.
pub struct TranslationResultBuilder<'a> {
    source_tokens: &'a [String],
    detokenizer: &'a dyn Detokenizer,
    words: Vec<String>,
    confidences: Vec<f64>,
    sources: Vec<TranslationSources>,
    phrases: Vec<PhraseInfo>,
}

impl<'a> TranslationResultBuilder<'a> {
    pub fn new(source_tokens: &'a [String], detokenizer: &'a dyn Detokenizer) -> Self {
        Self {
            source_tokens,
            detokenizer,
            words: Vec::new(),
            confidences: Vec::new(),
            sources: Vec::new(),
            phrases: Vec::new(),
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn append_token(&mut self, word: String, source: TranslationSources, confidence: f64) {
        self.words.push(word);
        self.sources.push(source);
        self.confidences.push(confidence);
    }

    /// Close the current phrase at the present token count.
    pub fn mark_phrase(&mut self, source_segment_range: Range, alignment: WordAlignmentMatrix) {
        self.phrases.push(PhraseInfo {
            source_segment_range,
            target_cut: self.words.len(),
            alignment,
        });
    }

    pub fn set_confidence(&mut self, index: usize, confidence: f64) {
        self.confidences[index] = confidence;
    }

    /// Apply edit operations so the leading tokens spell out `prefix`,
    /// rewriting phrase cuts and alignment columns as tokens shift. Returns
    /// the number of alignment columns carried past the last phrase boundary,
    /// which the next appended phrase must absorb.
    pub fn correct_prefix(
        &mut self,
        word_ops: &[EditOperation],
        char_ops: &[EditOperation],
        prefix: &[String],
        is_last_word_complete: bool,
    ) -> usize {
        let mut alignment_cols_to_copy: Vec<isize> = Vec::new();
        let mut i = 0isize;
        let mut j = 0usize;
        let mut k = 0usize;
        for &word_op in word_ops {
            match word_op {
                EditOperation::Insert => {
                    self.words.insert(j, prefix[j].clone());
                    self.sources.insert(j, TranslationSources::PREFIX);
                    self.confidences.insert(j, -1.0);
                    alignment_cols_to_copy.push(-1);
                    for phrase in &mut self.phrases[k..] {
                        phrase.target_cut += 1;
                    }
                    j += 1;
                }

                EditOperation::Delete => {
                    self.words.remove(j);
                    self.sources.remove(j);
                    self.confidences.remove(j);
                    i += 1;
                    if k < self.phrases.len() {
                        for phrase in &mut self.phrases[k..] {
                            // a zero-length phrase has no cut left to move
                            phrase.target_cut = phrase.target_cut.saturating_sub(1);
                        }

                        let cut = self.phrases[k].target_cut;
                        if cut == 0 || (k > 0 && cut == self.phrases[k - 1].target_cut) {
                            self.phrases.remove(k);
                            alignment_cols_to_copy.clear();
                            i = 0;
                        } else if j >= cut {
                            self.resize_alignment(k, &alignment_cols_to_copy);
                            alignment_cols_to_copy.clear();
                            i = 0;
                            k += 1;
                        }
                    }
                }

                EditOperation::Hit | EditOperation::Substitute => {
                    if word_op == EditOperation::Substitute
                        || j < prefix.len() - 1
                        || is_last_word_complete
                    {
                        self.words[j] = prefix[j].clone();
                    } else {
                        self.words[j] = correct_word(char_ops, &self.words[j], &prefix[j]);
                    }

                    if word_op == EditOperation::Substitute {
                        self.confidences[j] = -1.0;
                        self.sources[j] = TranslationSources::PREFIX;
                    } else {
                        self.sources[j] |= TranslationSources::PREFIX;
                    }

                    alignment_cols_to_copy.push(i);

                    i += 1;
                    j += 1;
                    if k < self.phrases.len() && j >= self.phrases[k].target_cut {
                        self.resize_alignment(k, &alignment_cols_to_copy);
                        alignment_cols_to_copy.clear();
                        i = 0;
                        k += 1;
                    }
                }

                EditOperation::None | EditOperation::PrefixDelete => {}
            }
        }

        while j < self.words.len() {
            alignment_cols_to_copy.push(i);

            i += 1;
            j += 1;
            if k < self.phrases.len() && j >= self.phrases[k].target_cut {
                self.resize_alignment(k, &alignment_cols_to_copy);
                alignment_cols_to_copy.clear();
                break;
            }
        }

        alignment_cols_to_copy.len()
    }

    pub fn to_result(&self) -> TranslationResult {
        let confidences = self.confidences.clone();
        let mut sources = self.sources.clone();
        let mut alignment = WordAlignmentMatrix::new(self.source_tokens.len(), self.words.len());
        let mut phrases = Vec::with_capacity(self.phrases.len());
        let mut trg_phrase_start = 0;
        for phrase_info in &self.phrases {
            let mut confidence = f64::MAX;
            let range = phrase_info.source_segment_range;
            for j in trg_phrase_start..phrase_info.target_cut {
                for i in range.start..range.end {
                    if phrase_info
                        .alignment
                        .get(i - range.start, j - trg_phrase_start)
                    {
                        alignment.set(i, j, true);
                    }
                }

                sources[j] = self.sources[j];
                confidence = confidence.min(self.confidences[j]);
            }

            phrases.push(Phrase {
                source_segment_range: range,
                target_segment_cut: phrase_info.target_cut,
                confidence,
            });
            trg_phrase_start = phrase_info.target_cut;
        }

        TranslationResult::new(
            self.detokenizer.detokenize(&self.words),
            self.source_tokens.to_vec(),
            self.words.clone(),
            confidences,
            sources,
            alignment,
            phrases,
        )
    }

    fn resize_alignment(&mut self, phrase_index: usize, cols_to_copy: &[isize]) {
        let cur_alignment = &self.phrases[phrase_index].alignment;
        if cols_to_copy.len() == cur_alignment.column_count() {
            return;
        }

        let mut new_alignment =
            WordAlignmentMatrix::new(cur_alignment.row_count(), cols_to_copy.len());
        for (j, &col) in cols_to_copy.iter().enumerate() {
            if col != -1 {
                for i in 0..new_alignment.row_count() {
                    new_alignment.set(i, j, cur_alignment.get(i, col as usize));
                }
            }
        }

        self.phrases[phrase_index].alignment = new_alignment;
    }
}

/// Rewrite a partially typed word using character-level operations, keeping
/// the hypothesis word's remaining characters as the completion.
fn correct_word(char_ops: &[EditOperation], word: &str, prefix: &str) -> String {
    let word_chars: Vec<char> = word.chars().collect();
    let prefix_chars: Vec<char> = prefix.chars().collect();
    let mut corrected = String::new();
    let mut i = 0;
    let mut j = 0;
    for &char_op in char_ops {
        match char_op {
            EditOperation::Hit => {
                corrected.push(word_chars[i]);
                i += 1;
                j += 1;
            }
            EditOperation::Insert => {
                corrected.push(prefix_chars[j]);
                j += 1;
            }
            EditOperation::Delete => {
                i += 1;
            }
            EditOperation::Substitute => {
                corrected.push(prefix_chars[j]);
                i += 1;
                j += 1;
            }
            EditOperation::None | EditOperation::PrefixDelete => {}
        }
    }

    corrected.extend(word_chars[i..].iter());
    corrected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenization::WhitespaceDetokenizer;

    fn to_tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn diagonal(n: usize) -> WordAlignmentMatrix {
        let pairs: Vec<(usize, usize)> = (0..n).map(|i| (i, i)).collect();
        WordAlignmentMatrix::from_pairs(n, n, &pairs)
    }

    fn builder_with_phrases<'a>(
        source_tokens: &'a [String],
        detokenizer: &'a WhitespaceDetokenizer,
    ) -> TranslationResultBuilder<'a> {
        let mut builder = TranslationResultBuilder::new(source_tokens, detokenizer);
        builder.append_token("this".to_string(), TranslationSources::SMT, 0.9);
        builder.append_token("is".to_string(), TranslationSources::SMT, 0.8);
        builder.mark_phrase(Range::new(0, 2), diagonal(2));
        builder.append_token("a".to_string(), TranslationSources::SMT, 0.7);
        builder.append_token("test".to_string(), TranslationSources::SMT, 0.6);
        builder.mark_phrase(Range::new(2, 4), diagonal(2));
        builder
    }

    #[test]
    fn to_result_assembles_phrase_alignments() {
        let source = to_tokens(&["esto", "es", "una", "prueba"]);
        let detok = WhitespaceDetokenizer;
        let builder = builder_with_phrases(&source, &detok);
        let result = builder.to_result();

        assert_eq!(result.translation, "this is a test");
        assert!(result.alignment.get(0, 0));
        assert!(result.alignment.get(1, 1));
        assert!(result.alignment.get(2, 2));
        assert!(result.alignment.get(3, 3));
        assert!(!result.alignment.get(0, 2));
        assert_eq!(result.phrases.len(), 2);
        assert_eq!(result.phrases[0].target_segment_cut, 2);
        assert!((result.phrases[0].confidence - 0.8).abs() < 1e-9);
        assert!((result.phrases[1].confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn substitute_marks_word_as_prefix_sourced() {
        let source = to_tokens(&["esto", "es", "una", "prueba"]);
        let detok = WhitespaceDetokenizer;
        let mut builder = builder_with_phrases(&source, &detok);

        let prefix = to_tokens(&["that", "is"]);
        let ops = vec![EditOperation::Substitute, EditOperation::Hit];
        builder.correct_prefix(&ops, &[], &prefix, true);

        let result = builder.to_result();
        assert_eq!(result.translation, "that is a test");
        assert_eq!(result.sources[0], TranslationSources::PREFIX);
        assert_eq!(result.confidences[0], -1.0);
        assert_eq!(
            result.sources[1],
            TranslationSources::SMT | TranslationSources::PREFIX
        );
    }

    #[test]
    fn insert_shifts_phrase_cuts_and_blanks_alignment_column() {
        let source = to_tokens(&["esto", "es", "una", "prueba"]);
        let detok = WhitespaceDetokenizer;
        let mut builder = builder_with_phrases(&source, &detok);

        let prefix = to_tokens(&["well", "this", "is"]);
        let ops = vec![
            EditOperation::Insert,
            EditOperation::Hit,
            EditOperation::Hit,
        ];
        builder.correct_prefix(&ops, &[], &prefix, true);

        let result = builder.to_result();
        assert_eq!(result.translation, "well this is a test");
        assert_eq!(result.phrases[0].target_segment_cut, 3);
        assert_eq!(result.phrases[1].target_segment_cut, 5);
        // the inserted word aligns to nothing
        assert!(!result.alignment.get(0, 0));
        assert!(result.alignment.get(0, 1));
        assert!(result.alignment.get(1, 2));
    }

    #[test]
    fn incomplete_last_word_is_completed_in_place() {
        let source = to_tokens(&["esto", "es", "una", "prueba"]);
        let detok = WhitespaceDetokenizer;
        let mut builder = builder_with_phrases(&source, &detok);

        let prefix = to_tokens(&["this", "i"]);
        let word_ops = vec![EditOperation::Hit, EditOperation::Hit];
        let char_ops = vec![EditOperation::Hit];
        builder.correct_prefix(&word_ops, &char_ops, &prefix, false);

        assert_eq!(builder.words()[1], "is");
    }

    #[test]
    fn delete_leaves_zero_length_phrase_cuts_at_zero() {
        let source = to_tokens(&["esto"]);
        let detok = WhitespaceDetokenizer;
        let mut builder = TranslationResultBuilder::new(&source, &detok);
        builder.mark_phrase(Range::new(0, 0), WordAlignmentMatrix::new(0, 0));
        builder.append_token("a".to_string(), TranslationSources::SMT, 0.9);
        builder.mark_phrase(Range::new(0, 1), diagonal(1));

        builder.correct_prefix(&[EditOperation::Delete], &[], &[], true);

        let result = builder.to_result();
        assert!(result.target_tokens.is_empty());
        assert!(result.phrases.iter().all(|p| p.target_segment_cut == 0));
    }

    #[test]
    fn correct_word_splices_characters() {
        let ops = vec![
            EditOperation::Hit,
            EditOperation::Substitute,
            EditOperation::Insert,
        ];
        assert_eq!(correct_word(&ops, "tast", "tes"), "tesst");
    }
}
