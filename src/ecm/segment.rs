use super::edit_distance::{
    backtrace_operations, compute_dist_matrix, process_matrix_cell, EditDistanceScorer,
    EditOperation,
};
use super::word::WordEditDistance;

/// Result of a prefix comparison: total cost, word-level operations, and the
/// character-level operations for a trailing incomplete word.
#[derive(Debug, Clone, Default)]
pub struct SegmentPrefixResult {
    pub cost: f64,
    pub word_ops: Vec<EditOperation>,
    pub char_ops: Vec<EditOperation>,
}

/// Word-level edit distance over token sequences, with per-character costs
/// delegated to an inner [`WordEditDistance`] at a tenth of the word-level
/// cost.
#[derive(Debug, Clone, Default)]
pub struct SegmentEditDistance {
    hit_cost: f64,
    insertion_cost: f64,
    deletion_cost: f64,
    substitution_cost: f64,
    word_edit_distance: WordEditDistance,
}

impl EditDistanceScorer for SegmentEditDistance {
    type Item = str;

    fn hit_cost(&self, _x: &str, y: &str, _is_complete: bool) -> f64 {
        self.hit_cost * y.chars().count() as f64
    }

    fn substitution_cost(&self, x: &str, y: &str, is_complete: bool) -> f64 {
        if x.is_empty() {
            // an untranslated placeholder is repaired character by character,
            // so it costs at the inner scorer's scale
            return (self.word_edit_distance.substitution_cost * 0.99
                + self.word_edit_distance.insertion_cost * 0.01)
                * y.chars().count() as f64;
        }
        if is_complete {
            self.word_edit_distance.compute(x, y).0
        } else {
            self.word_edit_distance.compute_prefix(x, y, true, true).0
        }
    }

    fn deletion_cost(&self, x: &str) -> f64 {
        if x.is_empty() {
            self.deletion_cost
        } else {
            self.deletion_cost * x.chars().count() as f64
        }
    }

    fn insertion_cost(&self, y: &str) -> f64 {
        self.insertion_cost * y.chars().count() as f64
    }

    fn is_hit(&self, x: &str, y: &str, is_complete: bool) -> bool {
        x == y || (!is_complete && x.starts_with(y))
    }
}

impl SegmentEditDistance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_hit_cost(&mut self, cost: f64) {
        self.hit_cost = cost;
        self.word_edit_distance.hit_cost = cost / 10.0;
    }

    pub fn set_insertion_cost(&mut self, cost: f64) {
        self.insertion_cost = cost;
        self.word_edit_distance.insertion_cost = cost / 10.0;
    }

    pub fn set_deletion_cost(&mut self, cost: f64) {
        self.deletion_cost = cost;
        self.word_edit_distance.deletion_cost = cost / 10.0;
    }

    pub fn set_substitution_cost(&mut self, cost: f64) {
        self.substitution_cost = cost;
        self.word_edit_distance.substitution_cost = cost / 10.0;
    }

    pub fn compute(&self, x: &[String], y: &[String]) -> f64 {
        let (cost, _) = compute_dist_matrix(self, x, y, true, false);
        cost
    }

    pub fn compute_prefix(
        &self,
        x: &[String],
        y: &[String],
        is_last_item_complete: bool,
        use_prefix_del_op: bool,
    ) -> SegmentPrefixResult {
        let (cost, dist_matrix) =
            compute_dist_matrix(self, x, y, is_last_item_complete, use_prefix_del_op);

        let mut char_ops = Vec::new();
        let word_ops = backtrace_operations(
            self,
            x,
            y,
            &dist_matrix,
            is_last_item_complete,
            use_prefix_del_op,
            |i, j, op| {
                // A trailing incomplete prefix word needs character-level
                // operations to complete it in place.
                if j == y.len()
                    && !is_last_item_complete
                    && matches!(op, EditOperation::Hit | EditOperation::Substitute)
                {
                    let (_, ops) =
                        self.word_edit_distance
                            .compute_prefix(&x[i - 1], &y[j - 1], true, true);
                    char_ops = ops;
                }
            },
        );

        SegmentPrefixResult {
            cost,
            word_ops,
            char_ops,
        }
    }

    /// Extend the first row of the incremental matrix in place for newly
    /// appended prefix words.
    pub fn incr_compute_prefix_first_row(&self, scores: &mut Vec<f64>, y_incr: &[String]) {
        for word in y_incr {
            let prev = scores.last().copied().unwrap_or(0.0);
            scores.push(prev + self.insertion_cost(word));
        }
    }

    /// Advance the incremental matrix by one hypothesis word, updating only
    /// the columns covered by the new prefix words.
    pub fn incr_compute_prefix(
        &self,
        scores: &mut Vec<f64>,
        prev_scores: &[f64],
        x_word: &str,
        y_incr: &[String],
        is_last_item_complete: bool,
    ) -> Vec<EditOperation> {
        let x = [x_word.to_string()];
        let mut y = vec![String::new(); prev_scores.len() - 1];
        let start_pos = y.len() - y_incr.len();
        for (offset, word) in y_incr.iter().enumerate() {
            y[start_pos + offset] = word.clone();
        }

        let mut dist_matrix = vec![vec![0.0; y.len() + 1]; 2];
        dist_matrix[0][..prev_scores.len()].copy_from_slice(prev_scores);
        while scores.len() < prev_scores.len() {
            scores.push(0.0);
        }
        dist_matrix[1][..scores.len()].copy_from_slice(scores);

        let mut ops = Vec::new();
        for j in (start_pos + 1)..prev_scores.len() {
            let is_complete = j != y.len() || is_last_item_complete;
            let cell = process_matrix_cell(
                self,
                x.as_slice(),
                &y,
                &dist_matrix,
                false,
                is_complete,
                1,
                j,
            );
            scores[j] = cell.dist;
            dist_matrix[1][j] = cell.dist;
            ops.push(cell.op);
        }
        ops
    }
}
