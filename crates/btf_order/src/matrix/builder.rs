use crate::matrix::Dim;
use crate::matrix::csc::CscMatrix;
use crate::matrix::error::CscError;

/// Builder from coordinate entries (COO -> canonical CSC pattern).
///
/// Usage:
///   let mut b = MatrixBuilder::new(nrows, ncols);
///   b.reserve(nnz_guess);
///   b.push(column, row); ...
///   let a = b.build_csc();  // sorted rows per column, duplicates combined
#[derive(Debug)]
pub struct MatrixBuilder {
    dim: Dim,
    /// COO (column, row) entries in insertion order.
    entries: Vec<(usize, usize)>,
}

impl MatrixBuilder {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            dim: Dim { nrows, ncols },
            entries: Vec::new(),
        }
    }

    pub fn reserve(&mut self, nnz: usize) {
        self.entries.reserve(nnz);
    }

    /// push a COO (column, row) pair
    pub fn push(&mut self, column: usize, row: usize) -> Result<usize, CscError> {
        if column >= self.dim.ncols {
            return Err(CscError::OutOfBoundsIndex {
                index: column,
                max: self.dim.ncols,
            });
        }
        if row >= self.dim.nrows {
            return Err(CscError::OutOfBoundsIndex {
                index: row,
                max: self.dim.nrows,
            });
        }

        let entry_index = self.entries.len();
        self.entries.push((column, row));
        Ok(entry_index)
    }

    pub fn build_csc(mut self) -> Result<CscMatrix, CscError> {
        let n = self.dim.ncols;

        self.entries.sort_unstable();
        self.entries.dedup();

        // counting pass then placement pass
        let mut column_pointers = vec![0usize; n + 1];
        for &(c, _r) in &self.entries {
            column_pointers[c + 1] += 1;
        }
        for j in 0..n {
            column_pointers[j + 1] += column_pointers[j];
        }

        let nnz = self.entries.len();
        let mut row_indices = vec![0usize; nnz];
        let mut next = column_pointers.clone();
        for (c, r) in self.entries {
            let p = next[c];
            row_indices[p] = r;
            next[c] += 1;
        }

        let a = CscMatrix {
            dim: self.dim,
            column_pointers,
            row_indices,
        };
        debug_assert!(a.check_invariants().is_ok());
        Ok(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_push_is_rejected() {
        let mut b = MatrixBuilder::new(2, 2);
        assert!(b.push(2, 0).is_err());
        assert!(b.push(0, 2).is_err());
        assert!(b.push(1, 1).is_ok());
    }

    #[test]
    fn empty_columns_are_preserved() {
        let mut b = MatrixBuilder::new(3, 3);
        b.push(0, 1).unwrap();
        b.push(2, 2).unwrap();
        let a = b.build_csc().unwrap();
        assert_eq!(a.column_pointers, vec![0, 1, 1, 2]);
        assert_eq!(a.col(1), &[] as &[usize]);
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let mut b1 = MatrixBuilder::new(3, 3);
        b1.push(1, 2).unwrap();
        b1.push(1, 0).unwrap();
        b1.push(0, 1).unwrap();
        let mut b2 = MatrixBuilder::new(3, 3);
        b2.push(0, 1).unwrap();
        b2.push(1, 0).unwrap();
        b2.push(1, 2).unwrap();
        assert_eq!(b1.build_csc().unwrap(), b2.build_csc().unwrap());
    }
}
