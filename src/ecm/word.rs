use super::edit_distance::{
    backtrace_operations, compute_dist_matrix, EditDistanceScorer, EditOperation,
};

/// Character-level edit distance over a single word pair.
#[derive(Debug, Clone, Default)]
pub struct WordEditDistance {
    pub hit_cost: f64,
    pub insertion_cost: f64,
    pub deletion_cost: f64,
    pub substitution_cost: f64,
}

impl EditDistanceScorer for WordEditDistance {
    type Item = char;

    fn hit_cost(&self, _x: &char, _y: &char, _is_complete: bool) -> f64 {
        self.hit_cost
    }

    fn substitution_cost(&self, _x: &char, _y: &char, _is_complete: bool) -> f64 {
        self.substitution_cost
    }

    fn deletion_cost(&self, _x: &char) -> f64 {
        self.deletion_cost
    }

    fn insertion_cost(&self, _y: &char) -> f64 {
        self.insertion_cost
    }

    fn is_hit(&self, x: &char, y: &char, _is_complete: bool) -> bool {
        x == y
    }
}

impl WordEditDistance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compute(&self, x: &str, y: &str) -> (f64, Vec<EditOperation>) {
        self.compute_ops(x, y, true, false)
    }

    pub fn compute_prefix(
        &self,
        x: &str,
        y: &str,
        is_last_item_complete: bool,
        use_prefix_del_op: bool,
    ) -> (f64, Vec<EditOperation>) {
        self.compute_ops(x, y, is_last_item_complete, use_prefix_del_op)
    }

    fn compute_ops(
        &self,
        x: &str,
        y: &str,
        is_last_item_complete: bool,
        use_prefix_del_op: bool,
    ) -> (f64, Vec<EditOperation>) {
        let x_chars: Vec<char> = x.chars().collect();
        let y_chars: Vec<char> = y.chars().collect();
        let (cost, dist_matrix) = compute_dist_matrix(
            self,
            &x_chars,
            &y_chars,
            is_last_item_complete,
            use_prefix_del_op,
        );
        let ops = backtrace_operations(
            self,
            &x_chars,
            &y_chars,
            &dist_matrix,
            is_last_item_complete,
            use_prefix_del_op,
            |_, _, _| {},
        );
        (cost, ops)
    }
}
