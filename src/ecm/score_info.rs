use super::edit_distance::EditOperation;

/// Incremental edit-distance state attached to one word-graph state or to a
/// position inside an arc. `scores[j]` is the cheapest cost of correcting the
/// first `j` prefix tokens against the token sequence leading here;
/// `operations[j]` is the final operation on that path.
#[derive(Debug, Clone, Default)]
pub struct EcmScoreInfo {
    pub scores: Vec<f64>,
    pub operations: Vec<EditOperation>,
}

impl EcmScoreInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the given prefix positions from `prev_esi`, padding this info out
    /// to the predecessor's length first.
    pub fn update_positions(&mut self, prev_esi: &EcmScoreInfo, positions: &[usize]) {
        while self.scores.len() < prev_esi.scores.len() {
            self.scores.push(0.0);
        }
        while self.operations.len() < prev_esi.operations.len() {
            self.operations.push(EditOperation::None);
        }
        for &pos in positions {
            self.scores[pos] = prev_esi.scores[pos];
            if !prev_esi.operations.is_empty() {
                self.operations[pos] = prev_esi.operations[pos];
            }
        }
    }

    /// Drop the last prefix position. The initial position is never removed.
    pub fn remove_last(&mut self) {
        if self.scores.len() > 1 {
            self.scores.pop();
        }
        if self.operations.len() > 1 {
            self.operations.pop();
        }
    }

    /// For every prefix length `j`, the prefix word position at which the
    /// last insertion run before `j` starts. Used to split an arc's tokens
    /// between corrected prefix and completion.
    pub fn last_ins_prefix_word_positions(&self) -> Vec<usize> {
        let mut results = vec![0; self.scores.len()];
        for j in (0..self.operations.len()).rev() {
            results[j] = match self.operations[j] {
                EditOperation::Hit => j.saturating_sub(1),
                EditOperation::Insert => {
                    let mut tj = j as isize;
                    while tj >= 0 && self.operations[tj as usize] == EditOperation::Insert {
                        tj -= 1;
                    }
                    if tj >= 0
                        && matches!(
                            self.operations[tj as usize],
                            EditOperation::Hit | EditOperation::Substitute
                        )
                    {
                        tj -= 1;
                    }
                    tj.max(0) as usize
                }
                EditOperation::Delete => j,
                EditOperation::Substitute => j.saturating_sub(1),
                EditOperation::None | EditOperation::PrefixDelete => 0,
            };
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_positions_pads_and_copies() {
        let prev = EcmScoreInfo {
            scores: vec![0.0, 1.0, 2.0],
            operations: vec![EditOperation::None, EditOperation::Hit, EditOperation::Insert],
        };
        let mut esi = EcmScoreInfo {
            scores: vec![9.0],
            operations: vec![EditOperation::None],
        };
        esi.update_positions(&prev, &[1, 2]);
        assert_eq!(esi.scores, vec![9.0, 1.0, 2.0]);
        assert_eq!(
            esi.operations,
            vec![EditOperation::None, EditOperation::Hit, EditOperation::Insert]
        );
    }

    #[test]
    fn remove_last_keeps_initial_position() {
        let mut esi = EcmScoreInfo {
            scores: vec![0.0, 1.0],
            operations: vec![EditOperation::None, EditOperation::Hit],
        };
        esi.remove_last();
        esi.remove_last();
        assert_eq!(esi.scores.len(), 1);
        assert_eq!(esi.operations.len(), 1);
    }

    #[test]
    fn insert_runs_collapse_to_their_anchor() {
        let esi = EcmScoreInfo {
            scores: vec![0.0; 4],
            operations: vec![
                EditOperation::None,
                EditOperation::Hit,
                EditOperation::Insert,
                EditOperation::Insert,
            ],
        };
        let positions = esi.last_ins_prefix_word_positions();
        assert_eq!(positions, vec![0, 0, 0, 0]);
    }

    #[test]
    fn hits_point_to_previous_word() {
        let esi = EcmScoreInfo {
            scores: vec![0.0; 3],
            operations: vec![EditOperation::None, EditOperation::Hit, EditOperation::Hit],
        };
        assert_eq!(esi.last_ins_prefix_word_positions(), vec![0, 0, 1]);
    }
}
