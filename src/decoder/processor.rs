use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};
use std::sync::Arc;

use tracing::debug;

use crate::ecm::{EcmScoreInfo, ErrorCorrectionModel};
use crate::graph::{WordGraph, WordGraphArc, INITIAL_STATE, LOG_ZERO};
use crate::matrix::WordAlignmentMatrix;
use crate::tokenization::Detokenizer;
use crate::types::TranslationResult;

use super::result_builder::TranslationResultBuilder;

/// Sentinel for "reached without traversing an arc".
const NO_PREV_ARC: usize = usize::MAX;

/// Incrementally scores every word-graph state against the user's prefix and
/// enumerates corrected translations best-first.
///
/// The processor keeps one incremental edit-distance row per state and per
/// token position inside each arc, so extending or shrinking the prefix only
/// touches the columns that changed.
pub struct ErrorCorrectionWordGraphProcessor {
    pub confidence_threshold: f64,
    /// Weight on edit-distance scores. Change before the first `correct` call.
    pub ecm_weight: f64,
    /// Weight on lattice scores. Change before the first `correct` call.
    pub word_graph_weight: f64,
    ecm: Arc<ErrorCorrectionModel>,
    target_detokenizer: Arc<dyn Detokenizer>,
    word_graph: Arc<WordGraph>,
    rest_scores: Vec<f64>,
    state_ecm_score_infos: Vec<EcmScoreInfo>,
    arc_ecm_score_infos: Vec<Vec<EcmScoreInfo>>,
    state_best_scores: Vec<Vec<f64>>,
    state_word_graph_scores: Vec<f64>,
    state_best_prev_arcs: Vec<Vec<usize>>,
    states_involved_in_arcs: BTreeSet<usize>,
    prev_prefix: Vec<String>,
    prev_is_last_word_complete: bool,
}

impl ErrorCorrectionWordGraphProcessor {
    pub fn new(
        ecm: Arc<ErrorCorrectionModel>,
        target_detokenizer: Arc<dyn Detokenizer>,
        word_graph: Arc<WordGraph>,
    ) -> Self {
        let rest_scores = word_graph.compute_rest_scores();
        let state_count = word_graph.state_count();
        let mut processor = Self {
            confidence_threshold: 0.0,
            ecm_weight: 1.0,
            word_graph_weight: 1.0,
            ecm,
            target_detokenizer,
            word_graph,
            rest_scores,
            state_ecm_score_infos: vec![EcmScoreInfo::new(); state_count],
            arc_ecm_score_infos: Vec::new(),
            state_best_scores: vec![Vec::new(); state_count],
            state_word_graph_scores: vec![LOG_ZERO; state_count],
            state_best_prev_arcs: vec![Vec::new(); state_count],
            states_involved_in_arcs: BTreeSet::new(),
            prev_prefix: Vec::new(),
            prev_is_last_word_complete: false,
        };
        processor.init_states();
        processor.init_arcs();
        processor
    }

    /// Re-score the word graph against a new prefix. Only the columns beyond
    /// the longest common prefix with the previously processed prefix are
    /// recomputed.
    pub fn correct(&mut self, prefix: &[String], is_last_word_complete: bool) {
        let mut valid_proc_prefix_count = 0;
        for (i, prev_word) in self.prev_prefix.iter().enumerate() {
            if i >= prefix.len() {
                break;
            }
            let words_match = if i == self.prev_prefix.len() - 1 && i == prefix.len() - 1 {
                *prev_word == prefix[i]
                    && self.prev_is_last_word_complete == is_last_word_complete
            } else {
                *prev_word == prefix[i]
            };
            if !words_match {
                break;
            }
            valid_proc_prefix_count += 1;
        }

        let diff_size = self.prev_prefix.len() - valid_proc_prefix_count;
        if diff_size > 0 {
            for esis in &mut self.arc_ecm_score_infos {
                for esi in esis {
                    for _ in 0..diff_size {
                        esi.remove_last();
                    }
                }
            }

            for &state in &self.states_involved_in_arcs {
                for _ in 0..diff_size {
                    self.state_ecm_score_infos[state].remove_last();
                    self.state_best_scores[state].pop();
                    self.state_best_prev_arcs[state].pop();
                }
            }
        }

        let prefix_diff = prefix[valid_proc_prefix_count..].to_vec();
        debug!(
            prefix_len = prefix.len(),
            reused = valid_proc_prefix_count,
            recomputed = prefix_diff.len(),
            "correcting word graph"
        );
        self.process_word_graph_for_prefix_diff(&prefix_diff, is_last_word_complete);

        self.prev_prefix = prefix.to_vec();
        self.prev_is_last_word_complete = is_last_word_complete;
    }

    /// Lazily enumerate corrected translations in descending score order.
    pub fn results(&self) -> Results<'_> {
        if self.word_graph.is_empty() {
            Results {
                processor: self,
                heap: BinaryHeap::new(),
                prefix_only_pending: true,
            }
        } else {
            Results {
                processor: self,
                heap: self.hypotheses_heap(),
                prefix_only_pending: false,
            }
        }
    }

    fn init_states(&mut self) {
        if !self.word_graph.is_empty() {
            let ecm = Arc::clone(&self.ecm);
            ecm.setup_initial_esi(&mut self.state_ecm_score_infos[INITIAL_STATE]);
            self.update_initial_state_best_scores();
        }
    }

    fn init_arcs(&mut self) {
        let graph = Arc::clone(&self.word_graph);
        for (arc_index, arc) in graph.arcs().iter().enumerate() {
            let mut esis: Vec<EcmScoreInfo> = Vec::with_capacity(arc.target_tokens.len());
            for word in &arc.target_tokens {
                let prev_esi = esis
                    .last()
                    .unwrap_or(&self.state_ecm_score_infos[arc.prev_state]);
                let mut esi = EcmScoreInfo::new();
                self.ecm.setup_esi(&mut esi, prev_esi, word);
                esis.push(esi);
            }
            self.arc_ecm_score_infos.push(esis);

            self.update_state_best_scores(arc_index, 0);

            self.states_involved_in_arcs.insert(arc.prev_state);
            self.states_involved_in_arcs.insert(arc.next_state);
        }
    }

    fn update_initial_state_best_scores(&mut self) {
        let esi = &self.state_ecm_score_infos[INITIAL_STATE];
        let initial_score = self.word_graph.initial_state_score();

        self.state_word_graph_scores[INITIAL_STATE] = initial_score;

        let best_scores = &mut self.state_best_scores[INITIAL_STATE];
        let best_prev_arcs = &mut self.state_best_prev_arcs[INITIAL_STATE];
        best_scores.clear();
        best_prev_arcs.clear();
        for &score in &esi.scores {
            best_scores.push(self.ecm_weight * -score + self.word_graph_weight * initial_score);
            best_prev_arcs.push(NO_PREV_ARC);
        }
    }

    fn update_state_best_scores(&mut self, arc_index: usize, prefix_diff_size: usize) {
        let graph = Arc::clone(&self.word_graph);
        let arc = &graph.arcs()[arc_index];
        // no self-loops, so taking the next state's info leaves the
        // predecessor info untouched
        let mut next_esi = std::mem::take(&mut self.state_ecm_score_infos[arc.next_state]);

        let arc_esis = &self.arc_ecm_score_infos[arc_index];
        let prev_esi = arc_esis
            .last()
            .unwrap_or(&self.state_ecm_score_infos[arc.prev_state]);

        let word_graph_score = self.state_word_graph_scores[arc.prev_state] + arc.score;

        let next_best_scores = &mut self.state_best_scores[arc.next_state];
        let next_best_prev_arcs = &mut self.state_best_prev_arcs[arc.next_state];

        let mut positions = Vec::new();
        let start_pos = if prefix_diff_size == 0 {
            0
        } else {
            prev_esi.scores.len() - prefix_diff_size
        };
        for i in start_pos..prev_esi.scores.len() {
            let new_score =
                self.ecm_weight * -prev_esi.scores[i] + self.word_graph_weight * word_graph_score;
            if i == next_best_scores.len() || next_best_scores[i] < new_score {
                add_or_replace(next_best_scores, i, new_score);
                positions.push(i);
                add_or_replace(next_best_prev_arcs, i, arc_index);
            }
        }

        next_esi.update_positions(prev_esi, &positions);
        self.state_ecm_score_infos[arc.next_state] = next_esi;

        if word_graph_score > self.state_word_graph_scores[arc.next_state] {
            self.state_word_graph_scores[arc.next_state] = word_graph_score;
        }
    }

    fn process_word_graph_for_prefix_diff(
        &mut self,
        prefix_diff: &[String],
        is_last_word_complete: bool,
    ) {
        if prefix_diff.is_empty() {
            return;
        }

        if !self.word_graph.is_empty() {
            let ecm = Arc::clone(&self.ecm);
            ecm.extend_initial_esi(&mut self.state_ecm_score_infos[INITIAL_STATE], prefix_diff);
            self.update_initial_state_best_scores();
        }

        let graph = Arc::clone(&self.word_graph);
        for (arc_index, arc) in graph.arcs().iter().enumerate() {
            let mut esis = std::mem::take(&mut self.arc_ecm_score_infos[arc_index]);
            while esis.len() < arc.target_tokens.len() {
                esis.push(EcmScoreInfo::new());
            }
            for i in 0..arc.target_tokens.len() {
                let word = if arc.is_unknown() {
                    ""
                } else {
                    arc.target_tokens[i].as_str()
                };
                let (before, rest) = esis.split_at_mut(i);
                let prev_esi = before
                    .last()
                    .unwrap_or(&self.state_ecm_score_infos[arc.prev_state]);
                self.ecm
                    .extend_esi(&mut rest[0], prev_esi, word, prefix_diff, is_last_word_complete);
            }
            self.arc_ecm_score_infos[arc_index] = esis;

            self.update_state_best_scores(arc_index, prefix_diff.len());
        }
    }

    fn hypotheses_heap(&self) -> BinaryHeap<Hypothesis> {
        let mut heap = BinaryHeap::new();

        // hypotheses starting before each token of each arc
        for (arc_index, arc) in self.word_graph.arcs().iter().enumerate() {
            if self.is_arc_pruned(arc) {
                continue;
            }
            let word_graph_score = self.state_word_graph_scores[arc.prev_state] + arc.score;
            let positions = std::iter::once(None)
                .chain((0..arc.target_tokens.len().saturating_sub(1)).map(Some));
            for word_index in positions {
                let esi = match word_index {
                    None => &self.state_ecm_score_infos[arc.prev_state],
                    Some(i) => &self.arc_ecm_score_infos[arc_index][i],
                };
                let score = self.word_graph_weight * word_graph_score
                    + self.ecm_weight * -esi.scores[esi.scores.len() - 1]
                    + self.word_graph_weight * self.rest_scores[arc.next_state];
                heap.push(Hypothesis {
                    score,
                    start_state: arc.next_state,
                    start: HypothesisStart::Arc {
                        arc_index,
                        word_index,
                    },
                    arcs: Vec::new(),
                });
            }
        }

        // hypotheses starting at each final state
        for state in self.word_graph.final_states() {
            if let Some(&best) = self.state_best_scores[state].last() {
                heap.push(Hypothesis {
                    score: best + self.word_graph_weight * self.rest_scores[state],
                    start_state: state,
                    start: HypothesisStart::State(state),
                    arcs: Vec::new(),
                });
            }
        }

        heap
    }

    fn is_arc_pruned(&self, arc: &WordGraphArc) -> bool {
        !arc.is_unknown()
            && arc
                .confidences
                .iter()
                .any(|&c| c < self.confidence_threshold)
    }

    /// Best-first expansion. Pops the top hypothesis; final-state hypotheses
    /// are complete, everything else is either finished greedily along the
    /// best remaining path (when nothing is pruned) or re-enqueued once per
    /// surviving outgoing arc.
    fn search_next(&self, heap: &mut BinaryHeap<Hypothesis>) -> Option<Hypothesis> {
        while let Some(mut hypothesis) = heap.pop() {
            let last_state = match hypothesis.arcs.last() {
                Some(&arc_index) => self.word_graph.arcs()[arc_index].next_state,
                None => hypothesis.start_state,
            };

            if self.word_graph.is_final_state(last_state) {
                return Some(hypothesis);
            }

            if self.confidence_threshold <= 0.0 {
                hypothesis
                    .arcs
                    .extend(self.word_graph.best_path_from_state_to_final_state(last_state));
                return Some(hypothesis);
            }

            let base_score =
                hypothesis.score - self.word_graph_weight * self.rest_scores[last_state];
            let candidates: Vec<usize> = self
                .word_graph
                .arc_indices_from(last_state)
                .iter()
                .copied()
                .filter(|&i| !self.is_arc_pruned(&self.word_graph.arcs()[i]))
                .collect();

            if candidates.is_empty() {
                let started_in_arc = matches!(hypothesis.start, HypothesisStart::Arc { .. });
                if started_in_arc || !hypothesis.arcs.is_empty() {
                    hypothesis
                        .arcs
                        .extend(self.word_graph.best_path_from_state_to_final_state(last_state));
                    return Some(hypothesis);
                }
                continue;
            }

            let last = candidates.len() - 1;
            for (i, arc_index) in candidates.iter().copied().enumerate() {
                let arc = &self.word_graph.arcs()[arc_index];
                let mut new_hypothesis = if i < last {
                    hypothesis.clone()
                } else {
                    std::mem::replace(
                        &mut hypothesis,
                        Hypothesis {
                            score: 0.0,
                            start_state: 0,
                            start: HypothesisStart::State(0),
                            arcs: Vec::new(),
                        },
                    )
                };
                new_hypothesis.score = base_score
                    + self.word_graph_weight * (arc.score + self.rest_scores[arc.next_state]);
                new_hypothesis.arcs.push(arc_index);
                heap.push(new_hypothesis);
            }
        }
        None
    }

    fn build_correction_from_hypothesis(
        &self,
        builder: &mut TranslationResultBuilder<'_>,
        prefix: &[String],
        is_last_word_complete: bool,
        hypothesis: &Hypothesis,
    ) {
        let uncorrected_prefix_len = match hypothesis.start {
            HypothesisStart::State(state) => {
                self.add_best_uncorrected_prefix_state(builder, prefix.len(), state);
                builder.word_count()
            }
            HypothesisStart::Arc {
                arc_index,
                word_index,
            } => {
                self.add_best_uncorrected_prefix_sub_state(
                    builder,
                    prefix.len(),
                    arc_index,
                    word_index,
                );
                let first_arc = &self.word_graph.arcs()[arc_index];
                let consumed = word_index.map_or(0, |w| w + 1);
                builder.word_count() - (first_arc.target_tokens.len() - consumed)
            }
        };

        let mut alignment_cols_to_add =
            self.ecm
                .correct_prefix(builder, uncorrected_prefix_len, prefix, is_last_word_complete);

        for &arc_index in &hypothesis.arcs {
            let arc = &self.word_graph.arcs()[arc_index];
            update_correction_from_arc(builder, arc, alignment_cols_to_add);
            alignment_cols_to_add = 0;
        }
    }

    /// Replay the best path into `state`, tracking how many prefix words each
    /// arc consumed so the walk stays on the per-position best predecessors.
    fn add_best_uncorrected_prefix_state(
        &self,
        builder: &mut TranslationResultBuilder<'_>,
        proc_prefix_pos: usize,
        state: usize,
    ) {
        let mut arcs = Vec::new();

        let mut cur_state = state;
        let mut cur_proc_prefix_pos = proc_prefix_pos;
        while cur_state != INITIAL_STATE {
            let arc_index = self.state_best_prev_arcs[cur_state][cur_proc_prefix_pos];
            let arc = &self.word_graph.arcs()[arc_index];

            for i in (0..arc.target_tokens.len()).rev() {
                let pred_prefix_words =
                    self.arc_ecm_score_infos[arc_index][i].last_ins_prefix_word_positions();
                cur_proc_prefix_pos = pred_prefix_words[cur_proc_prefix_pos];
            }

            arcs.push(arc_index);
            cur_state = arc.prev_state;
        }

        for &arc_index in arcs.iter().rev() {
            update_correction_from_arc(builder, &self.word_graph.arcs()[arc_index], 0);
        }
    }

    fn add_best_uncorrected_prefix_sub_state(
        &self,
        builder: &mut TranslationResultBuilder<'_>,
        proc_prefix_pos: usize,
        arc_index: usize,
        word_index: Option<usize>,
    ) {
        let arc = &self.word_graph.arcs()[arc_index];

        let mut cur_proc_prefix_pos = proc_prefix_pos;
        if let Some(word_index) = word_index {
            for i in (0..=word_index).rev() {
                let pred_prefix_words =
                    self.arc_ecm_score_infos[arc_index][i].last_ins_prefix_word_positions();
                cur_proc_prefix_pos = pred_prefix_words[cur_proc_prefix_pos];
            }
        }

        self.add_best_uncorrected_prefix_state(builder, cur_proc_prefix_pos, arc.prev_state);

        update_correction_from_arc(builder, arc, 0);
    }
}

fn add_or_replace<T>(list: &mut Vec<T>, index: usize, item: T) {
    assert!(index <= list.len(), "index is out of range");
    if index == list.len() {
        list.push(item);
    } else {
        list[index] = item;
    }
}

fn update_correction_from_arc(
    builder: &mut TranslationResultBuilder<'_>,
    arc: &WordGraphArc,
    alignment_cols_to_add: usize,
) {
    for i in 0..arc.target_tokens.len() {
        builder.append_token(arc.target_tokens[i].clone(), arc.sources[i], arc.confidences[i]);
    }

    if alignment_cols_to_add > 0 {
        // corrected prefix tokens were folded into this phrase, shift the
        // alignment right to make room for them
        let alignment = &arc.alignment;
        let mut new_alignment = WordAlignmentMatrix::new(
            alignment.row_count(),
            alignment.column_count() + alignment_cols_to_add,
        );
        for j in 0..alignment.column_count() {
            for i in 0..alignment.row_count() {
                new_alignment.set(i, alignment_cols_to_add + j, alignment.get(i, j));
            }
        }
        builder.mark_phrase(arc.source_segment_range, new_alignment);
    } else {
        builder.mark_phrase(arc.source_segment_range, arc.alignment.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HypothesisStart {
    /// Starts at a state on the best processed-prefix path.
    State(usize),
    /// Starts inside an arc, before the token after `word_index` (`None`
    /// means before the arc's first token).
    Arc {
        arc_index: usize,
        word_index: Option<usize>,
    },
}

#[derive(Debug, Clone)]
struct Hypothesis {
    score: f64,
    start_state: usize,
    start: HypothesisStart,
    arcs: Vec<usize>,
}

impl PartialEq for Hypothesis {
    fn eq(&self, other: &Self) -> bool {
        self.score.total_cmp(&other.score) == Ordering::Equal
    }
}

impl Eq for Hypothesis {}

impl PartialOrd for Hypothesis {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Hypothesis {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.total_cmp(&other.score)
    }
}

/// Lazy iterator over corrected translations, best score first.
pub struct Results<'a> {
    processor: &'a ErrorCorrectionWordGraphProcessor,
    heap: BinaryHeap<Hypothesis>,
    prefix_only_pending: bool,
}

impl Iterator for Results<'_> {
    type Item = TranslationResult;

    fn next(&mut self) -> Option<TranslationResult> {
        let processor = self.processor;
        if self.prefix_only_pending {
            // an empty word graph still yields the corrected prefix itself
            self.prefix_only_pending = false;
            let mut builder = TranslationResultBuilder::new(
                processor.word_graph.source_tokens(),
                &*processor.target_detokenizer,
            );
            processor.ecm.correct_prefix(
                &mut builder,
                0,
                &processor.prev_prefix,
                processor.prev_is_last_word_complete,
            );
            return Some(builder.to_result());
        }

        let hypothesis = processor.search_next(&mut self.heap)?;
        let mut builder = TranslationResultBuilder::new(
            processor.word_graph.source_tokens(),
            &*processor.target_detokenizer,
        );
        processor.build_correction_from_hypothesis(
            &mut builder,
            &processor.prev_prefix,
            processor.prev_is_last_word_complete,
            &hypothesis,
        );
        Some(builder.to_result())
    }
}
