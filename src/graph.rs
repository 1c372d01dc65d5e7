use std::collections::BTreeSet;

use crate::matrix::WordAlignmentMatrix;
use crate::types::{Range, TranslationSources};

/// Stable stand-in for log(0); large negative rather than -inf so score
/// arithmetic stays finite.
pub const LOG_ZERO: f64 = -999_999_999.0;

/// The unique entry state of every word graph.
pub const INITIAL_STATE: usize = 0;

/// An edge of the word graph carrying one or more target tokens, a
/// log-probability weight, a source-token range, and per-token
/// confidence/provenance tags.
#[derive(Debug, Clone)]
pub struct WordGraphArc {
    pub prev_state: usize,
    pub next_state: usize,
    pub score: f64,
    pub target_tokens: Vec<String>,
    /// Local alignment, sized source_segment_range.len() x target_tokens.len().
    pub alignment: WordAlignmentMatrix,
    pub source_segment_range: Range,
    pub sources: Vec<TranslationSources>,
    /// One confidence per token, in [0, 1], or -1.0 when unscored.
    pub confidences: Vec<f64>,
}

impl WordGraphArc {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        prev_state: usize,
        next_state: usize,
        score: f64,
        target_tokens: Vec<String>,
        alignment: WordAlignmentMatrix,
        source_segment_range: Range,
        sources: Vec<TranslationSources>,
        confidences: Vec<f64>,
    ) -> Self {
        debug_assert_ne!(next_state, prev_state, "self-loop arc");
        debug_assert_eq!(sources.len(), target_tokens.len());
        debug_assert_eq!(confidences.len(), target_tokens.len());
        Self {
            prev_state,
            next_state,
            score,
            target_tokens,
            alignment,
            source_segment_range,
            sources,
            confidences,
        }
    }

    /// True iff the arc is an untranslated/OOV run: no token has a source.
    pub fn is_unknown(&self) -> bool {
        self.sources.iter().all(|s| s.is_none())
    }
}

/// An immutable, weighted DAG of candidate target-token sequences produced by
/// a translation engine for one source segment. State numbers carry no order;
/// the arc list itself is topologically sorted (every arc into a state
/// precedes every arc out of it), which makes a single forward or reverse
/// pass over the arcs a valid relaxation.
#[derive(Debug, Clone)]
pub struct WordGraph {
    source_tokens: Vec<String>,
    arcs: Vec<WordGraphArc>,
    final_states: BTreeSet<usize>,
    initial_state_score: f64,
    state_count: usize,
    arcs_by_prev_state: Vec<Vec<usize>>,
}

impl WordGraph {
    pub fn new(
        source_tokens: Vec<String>,
        arcs: Vec<WordGraphArc>,
        final_states: impl IntoIterator<Item = usize>,
        initial_state_score: f64,
    ) -> Self {
        let mut max_state = None::<usize>;
        for arc in &arcs {
            max_state = Some(max_state.map_or(arc.next_state, |m| m.max(arc.next_state)));
            max_state = Some(max_state.map_or(arc.prev_state, |m| m.max(arc.prev_state)));
        }
        let state_count = max_state.map_or(0, |m| m + 1);

        let mut arcs_by_prev_state = vec![Vec::new(); state_count];
        for (arc_index, arc) in arcs.iter().enumerate() {
            arcs_by_prev_state[arc.prev_state].push(arc_index);
        }

        Self {
            source_tokens,
            arcs,
            final_states: final_states.into_iter().collect(),
            initial_state_score,
            state_count,
            arcs_by_prev_state,
        }
    }

    pub fn empty(source_tokens: Vec<String>) -> Self {
        Self::new(source_tokens, Vec::new(), std::iter::empty(), 0.0)
    }

    pub fn source_tokens(&self) -> &[String] {
        &self.source_tokens
    }

    pub fn arcs(&self) -> &[WordGraphArc] {
        &self.arcs
    }

    pub fn final_states(&self) -> impl Iterator<Item = usize> + '_ {
        self.final_states.iter().copied()
    }

    pub fn is_final_state(&self, state: usize) -> bool {
        self.final_states.contains(&state)
    }

    pub fn initial_state_score(&self) -> f64 {
        self.initial_state_score
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Outgoing arc indices of `state`, in original arc order. Arc order is
    /// the tie-break order for search expansion.
    pub fn arc_indices_from(&self, state: usize) -> &[usize] {
        &self.arcs_by_prev_state[state]
    }

    /// For every state, the maximum achievable score summed along any path
    /// from that state to any final state. Unreachable states stay at
    /// [`LOG_ZERO`].
    pub fn compute_rest_scores(&self) -> Vec<f64> {
        let mut rest_scores = vec![LOG_ZERO; self.state_count];
        for &state in &self.final_states {
            rest_scores[state] = self.initial_state_score;
        }

        // The arc list is topologically sorted, so one reverse sweep relaxes
        // every state.
        for arc in self.arcs.iter().rev() {
            let score = arc.score + rest_scores[arc.next_state];
            if score > rest_scores[arc.prev_state] {
                rest_scores[arc.prev_state] = score;
            }
        }
        rest_scores
    }

    /// Arc indices of the best-scoring path from `state` to a final state,
    /// in forward order. Empty when `state` is final or no final state is
    /// reachable.
    pub fn best_path_from_state_to_final_state(&self, state: usize) -> Vec<usize> {
        let (prev_scores, state_best_prev_arcs) = self.compute_prev_scores(state);
        if prev_scores.is_empty() {
            return Vec::new();
        }

        let mut best_final_state = INITIAL_STATE;
        let mut best_final_state_score = LOG_ZERO;
        for &final_state in &self.final_states {
            if best_final_state_score < prev_scores[final_state] {
                best_final_state = final_state;
                best_final_state_score = prev_scores[final_state];
            }
        }
        if best_final_state_score == LOG_ZERO {
            return Vec::new();
        }

        let mut arcs = Vec::new();
        let mut cur_state = best_final_state;
        while cur_state != state {
            let arc_index = state_best_prev_arcs[cur_state];
            arcs.push(arc_index);
            cur_state = self.arcs[arc_index].prev_state;
        }
        arcs.reverse();
        arcs
    }

    /// Forward pass from `state`: best score to reach every accessible state,
    /// with the arc index achieving it.
    fn compute_prev_scores(&self, state: usize) -> (Vec<f64>, Vec<usize>) {
        if self.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let mut prev_scores = vec![LOG_ZERO; self.state_count];
        let mut state_best_prev_arcs = vec![0usize; self.state_count];
        prev_scores[state] = if state == INITIAL_STATE {
            self.initial_state_score
        } else {
            0.0
        };

        let mut accessible = BTreeSet::new();
        accessible.insert(state);
        for (arc_index, arc) in self.arcs.iter().enumerate() {
            if accessible.contains(&arc.prev_state) {
                let score = arc.score + prev_scores[arc.prev_state];
                if score > prev_scores[arc.next_state] {
                    prev_scores[arc.next_state] = score;
                    state_best_prev_arcs[arc.next_state] = arc_index;
                }
                accessible.insert(arc.next_state);
            } else if !accessible.contains(&arc.next_state) {
                prev_scores[arc.next_state] = LOG_ZERO;
            }
        }

        (prev_scores, state_best_prev_arcs)
    }
}
