/// Atomic edit operation in a distance computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOperation {
    None,
    Hit,
    Insert,
    Delete,
    /// Free deletion of trailing items in the hypothesis when scoring
    /// against a prefix.
    PrefixDelete,
    Substitute,
}

/// Cost model plumbed into the shared dynamic program. `x` is the hypothesis
/// sequence, `y` the observed (prefix) sequence.
pub trait EditDistanceScorer {
    type Item: ?Sized;

    fn hit_cost(&self, x: &Self::Item, y: &Self::Item, is_complete: bool) -> f64;
    fn substitution_cost(&self, x: &Self::Item, y: &Self::Item, is_complete: bool) -> f64;
    fn deletion_cost(&self, x: &Self::Item) -> f64;
    fn insertion_cost(&self, y: &Self::Item) -> f64;
    fn is_hit(&self, x: &Self::Item, y: &Self::Item, is_complete: bool) -> bool;
}

pub struct CellResult {
    pub dist: f64,
    pub i_pred: usize,
    pub j_pred: usize,
    pub op: EditOperation,
}

/// Fill one cell of the distance matrix, choosing the cheapest of the
/// substitution/hit, deletion, and insertion predecessors. Ties favor the
/// diagonal move.
pub fn process_matrix_cell<S, X, Y>(
    scorer: &S,
    x: &[X],
    y: &[Y],
    dist_matrix: &[Vec<f64>],
    use_prefix_del_op: bool,
    is_complete: bool,
    i: usize,
    j: usize,
) -> CellResult
where
    S: EditDistanceScorer + ?Sized,
    X: std::borrow::Borrow<S::Item>,
    Y: std::borrow::Borrow<S::Item>,
{
    if i != 0 && j != 0 {
        let x_item = x[i - 1].borrow();
        let y_item = y[j - 1].borrow();
        let (subst_cost, mut op) = if scorer.is_hit(x_item, y_item, is_complete) {
            (scorer.hit_cost(x_item, y_item, is_complete), EditOperation::Hit)
        } else {
            (
                scorer.substitution_cost(x_item, y_item, is_complete),
                EditOperation::Substitute,
            )
        };

        let mut dist = dist_matrix[i - 1][j - 1] + subst_cost;
        let mut i_pred = i - 1;
        let mut j_pred = j - 1;

        let is_prefix_del = use_prefix_del_op && j == y.len();
        let del_cost = if is_prefix_del {
            0.0
        } else {
            scorer.deletion_cost(x_item)
        };
        let del_dist = dist_matrix[i - 1][j] + del_cost;
        if del_dist < dist {
            dist = del_dist;
            i_pred = i - 1;
            j_pred = j;
            op = if is_prefix_del {
                EditOperation::PrefixDelete
            } else {
                EditOperation::Delete
            };
        }

        let ins_dist = dist_matrix[i][j - 1] + scorer.insertion_cost(y_item);
        if ins_dist < dist {
            dist = ins_dist;
            i_pred = i;
            j_pred = j - 1;
            op = EditOperation::Insert;
        }

        CellResult { dist, i_pred, j_pred, op }
    } else if i == 0 && j == 0 {
        CellResult {
            dist: 0.0,
            i_pred: 0,
            j_pred: 0,
            op: EditOperation::None,
        }
    } else if i == 0 {
        CellResult {
            dist: dist_matrix[0][j - 1] + scorer.insertion_cost(y[j - 1].borrow()),
            i_pred: 0,
            j_pred: j - 1,
            op: EditOperation::Insert,
        }
    } else {
        CellResult {
            dist: dist_matrix[i - 1][0] + scorer.deletion_cost(x[i - 1].borrow()),
            i_pred: i - 1,
            j_pred: 0,
            op: EditOperation::Delete,
        }
    }
}

/// Compute the full (|x|+1) x (|y|+1) distance matrix and return it with the
/// final cost.
pub fn compute_dist_matrix<S, X, Y>(
    scorer: &S,
    x: &[X],
    y: &[Y],
    is_last_item_complete: bool,
    use_prefix_del_op: bool,
) -> (f64, Vec<Vec<f64>>)
where
    S: EditDistanceScorer + ?Sized,
    X: std::borrow::Borrow<S::Item>,
    Y: std::borrow::Borrow<S::Item>,
{
    let mut dist_matrix = vec![vec![0.0; y.len() + 1]; x.len() + 1];
    for i in 0..=x.len() {
        for j in 0..=y.len() {
            let is_complete = j != y.len() || is_last_item_complete;
            let cell = process_matrix_cell(
                scorer,
                x,
                y,
                &dist_matrix,
                use_prefix_del_op,
                is_complete,
                i,
                j,
            );
            dist_matrix[i][j] = cell.dist;
        }
    }
    let cost = dist_matrix[x.len()][y.len()];
    (cost, dist_matrix)
}

/// Backtrace the matrix into a forward-ordered operation list, skipping
/// prefix deletions.
#[allow(clippy::too_many_arguments)]
pub fn backtrace_operations<S, X, Y>(
    scorer: &S,
    x: &[X],
    y: &[Y],
    dist_matrix: &[Vec<f64>],
    is_last_item_complete: bool,
    use_prefix_del_op: bool,
    mut visit: impl FnMut(usize, usize, EditOperation),
) -> Vec<EditOperation>
where
    S: EditDistanceScorer + ?Sized,
    X: std::borrow::Borrow<S::Item>,
    Y: std::borrow::Borrow<S::Item>,
{
    let mut ops = Vec::new();
    let mut i = x.len();
    let mut j = y.len();
    while i > 0 || j > 0 {
        let is_complete = j != y.len() || is_last_item_complete;
        let cell = process_matrix_cell(
            scorer,
            x,
            y,
            dist_matrix,
            use_prefix_del_op,
            is_complete,
            i,
            j,
        );
        if cell.op != EditOperation::PrefixDelete {
            ops.insert(0, cell.op);
        }
        visit(i, j, cell.op);
        i = cell.i_pred;
        j = cell.j_pred;
    }
    ops
}
