use crate::matrix::Dim;
use crate::matrix::error::CscError;

/// Compressed Sparse Column pattern
/// - column pointers are the indices of the start and end of each column
/// - row indices are the indices of the rows of the non zero entries
///
/// Ordering only looks at the nonzero pattern, so no numerical values are
/// stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CscMatrix {
    pub dim: Dim,
    /// Column pointers, len = ncols + 1
    pub column_pointers: Vec<usize>,
    /// Row indices, len = nnz
    pub row_indices: Vec<usize>,
}

impl CscMatrix {
    /// number of non zero entries
    pub fn nnz(&self) -> usize {
        self.row_indices.len()
    }

    pub fn is_square(&self) -> bool {
        self.dim.nrows == self.dim.ncols
    }

    pub fn col_start(&self, j: usize) -> usize {
        self.column_pointers[j]
    }

    pub fn col_end(&self, j: usize) -> usize {
        self.column_pointers[j + 1]
    }

    pub fn row_index(&self, p: usize) -> usize {
        self.row_indices[p]
    }

    /// Row indices of column j
    pub fn col(&self, j: usize) -> &[usize] {
        &self.row_indices[self.column_pointers[j]..self.column_pointers[j + 1]]
    }

    /// Loose validity check: column pointers start at 0 and are nondecreasing,
    /// every row index is in range. Duplicate or unsorted rows within a column
    /// are tolerated here; the ordering routines accept such patterns.
    pub fn is_pattern_valid(&self) -> bool {
        let n = self.dim.ncols;
        if self.column_pointers.len() != n + 1 {
            return false;
        }
        if self.column_pointers[0] != 0 || self.column_pointers[n] != self.nnz() {
            return false;
        }
        for j in 0..n {
            let p1 = self.column_pointers[j];
            let p2 = self.column_pointers[j + 1];
            if p1 > p2 {
                return false;
            }
            for p in p1..p2 {
                if self.row_indices[p] >= self.dim.nrows {
                    return false;
                }
            }
        }
        true
    }

    /// Strict canonical-form check: everything `is_pattern_valid` checks, plus
    /// strictly increasing rows within each column (so no duplicates).
    pub fn check_invariants(&self) -> Result<(), CscError> {
        if self.column_pointers.len() != self.dim.ncols + 1 {
            return Err(CscError::InvalidColumnPointersLength {
                expected: self.dim.ncols + 1,
                actual: self.column_pointers.len(),
            });
        }
        if *self.column_pointers.first().unwrap_or(&1) != 0 {
            return Err(CscError::InvalidColumnPointers {
                index: 0,
                expected: 0,
                actual: *self.column_pointers.first().unwrap_or(&1),
            });
        }
        if *self.column_pointers.last().unwrap() != self.nnz() {
            return Err(CscError::InvalidColumnPointers {
                index: self.dim.ncols,
                expected: self.nnz(),
                actual: *self.column_pointers.last().unwrap(),
            });
        }
        // per-column sorted & in-range
        for j in 0..self.dim.ncols {
            let (start, end) = (self.column_pointers[j], self.column_pointers[j + 1]);
            if start > end || end > self.nnz() {
                return Err(CscError::InvalidColumnPointers {
                    index: j,
                    expected: start,
                    actual: end,
                });
            }
            let mut prev = None;
            for &r in &self.row_indices[start..end] {
                if r >= self.dim.nrows {
                    return Err(CscError::OutOfBoundsIndex {
                        index: r,
                        max: self.dim.nrows,
                    });
                }
                if let Some(p) = prev
                    && r <= p
                {
                    return Err(CscError::RowsNotStrictlyIncreasing {
                        index: j,
                        previous: p,
                        actual: r,
                    });
                }
                prev = Some(r);
            }
        }
        Ok(())
    }

    /// Apply a column permutation: returns A(:, q) where q maps new_j -> old_j
    pub fn permute_columns(&self, q: &[usize]) -> CscMatrix {
        assert_eq!(q.len(), self.dim.ncols);
        let mut column_pointers = Vec::with_capacity(self.dim.ncols + 1);
        column_pointers.push(0);
        let mut row_indices = Vec::with_capacity(self.nnz());

        for &old_j in q {
            let rows = self.col(old_j);
            column_pointers.push(column_pointers.last().unwrap() + rows.len());
            row_indices.extend_from_slice(rows);
        }
        CscMatrix {
            dim: self.dim,
            column_pointers,
            row_indices,
        }
    }
}
