/// Dense boolean alignment matrix between source-token rows and target-token
/// columns. Dimensions are fixed at construction; callers that need a
/// different shape build a new matrix and copy the columns that survive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordAlignmentMatrix {
    row_count: usize,
    column_count: usize,
    cells: Vec<bool>,
}

impl WordAlignmentMatrix {
    pub fn new(row_count: usize, column_count: usize) -> Self {
        Self {
            row_count,
            column_count,
            cells: vec![false; row_count * column_count],
        }
    }

    pub fn from_pairs(row_count: usize, column_count: usize, pairs: &[(usize, usize)]) -> Self {
        let mut matrix = Self::new(row_count, column_count);
        for &(i, j) in pairs {
            matrix.set(i, j, true);
        }
        matrix
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn get(&self, i: usize, j: usize) -> bool {
        assert!(i < self.row_count, "row index {i} is out of range");
        assert!(j < self.column_count, "column index {j} is out of range");
        self.cells[i * self.column_count + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: bool) {
        assert!(i < self.row_count, "row index {i} is out of range");
        assert!(j < self.column_count, "column index {j} is out of range");
        self.cells[i * self.column_count + j] = value;
    }

    /// Column indices aligned to source row `i`, in ascending order.
    pub fn row_aligned_indices(&self, i: usize) -> Vec<usize> {
        (0..self.column_count).filter(|&j| self.get(i, j)).collect()
    }

    /// Row indices aligned to target column `j`, in ascending order.
    pub fn column_aligned_indices(&self, j: usize) -> Vec<usize> {
        (0..self.row_count).filter(|&i| self.get(i, j)).collect()
    }
}
