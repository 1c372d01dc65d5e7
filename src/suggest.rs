use std::sync::OnceLock;

use regex::Regex;

use crate::types::{TranslationResult, TranslationSources, TranslationSuggestion};

fn all_punct_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^\p{P}*$").unwrap())
}

/// Extracts spans of target words worth offering to the translator from a
/// stream of translation results.
pub trait TranslationSuggester: Send + Sync {
    fn get_suggestions(
        &self,
        n: usize,
        prefix_count: usize,
        is_last_word_complete: bool,
        results: &mut dyn Iterator<Item = TranslationResult>,
    ) -> Vec<TranslationSuggestion>;
}

/// Suggests whole aligned phrases following the prefix, stopping at
/// low-confidence phrases, untranslated words, and optionally punctuation.
pub struct PhraseTranslationSuggester {
    pub confidence_threshold: f64,
    pub break_on_punctuation: bool,
}

impl Default for PhraseTranslationSuggester {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl PhraseTranslationSuggester {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold,
            break_on_punctuation: true,
        }
    }
}

impl TranslationSuggester for PhraseTranslationSuggester {
    fn get_suggestions(
        &self,
        n: usize,
        prefix_count: usize,
        is_last_word_complete: bool,
        results: &mut dyn Iterator<Item = TranslationResult>,
    ) -> Vec<TranslationSuggestion> {
        let mut suggestions: Vec<TranslationSuggestion> = Vec::new();
        let mut suggestion_strs: Vec<String> = Vec::new();
        for result in results {
            let mut starting_j = prefix_count;
            // an incomplete last word can only exist when there is a prefix
            if !is_last_word_complete && starting_j > 0 {
                // a partially typed word only yields suggestions once the
                // engine has completed it
                if result.sources[starting_j - 1].contains(TranslationSources::SMT) {
                    starting_j -= 1;
                } else {
                    break;
                }
            }

            let mut k = 0;
            while k < result.phrases.len() && result.phrases[k].target_segment_cut <= starting_j {
                k += 1;
            }

            let mut min_confidence = -1.0f64;
            let mut indices: Vec<usize> = Vec::new();
            let mut word_count = 0;
            let mut hit_punctuation = false;
            while k < result.phrases.len() {
                let phrase = &result.phrases[k];
                if phrase.confidence < self.confidence_threshold {
                    break;
                }

                let mut is_unknown = false;
                for j in starting_j..phrase.target_segment_cut {
                    if result.sources[j] == TranslationSources::NONE {
                        is_unknown = true;
                        break;
                    }
                    if all_punct_regex().is_match(&result.target_tokens[j]) {
                        hit_punctuation = true;
                    }
                    if !self.break_on_punctuation || !hit_punctuation {
                        indices.push(j);
                        let word_confidence = result.confidences[j];
                        if min_confidence < 0.0 || word_confidence < min_confidence {
                            min_confidence = word_confidence;
                        }
                    }
                    word_count += 1;
                }
                if is_unknown {
                    break;
                }

                starting_j = phrase.target_segment_cut;
                k += 1;
            }

            if indices.is_empty() {
                if word_count > 0 {
                    // the span starts with punctuation, later results may
                    // still produce usable spans
                    continue;
                }
                break;
            }

            let suggestion = TranslationSuggestion {
                result,
                target_word_indices: indices,
                confidence: min_confidence.max(0.0),
            };
            let suggestion_str = suggestion.target_words().join("\u{1}");
            let is_duplicate = suggestion_strs
                .iter()
                .any(|s| s.len() >= suggestion_str.len() && s.contains(&suggestion_str));
            if !is_duplicate {
                suggestion_strs.push(suggestion_str);
                suggestions.push(suggestion);
                if suggestions.len() == n {
                    break;
                }
            }
        }

        suggestions
    }
}
