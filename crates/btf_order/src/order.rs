use crate::matrix::csc::CscMatrix;
use crate::max_transversal::max_transversal;
use crate::scc::strongly_connected_components;
use crate::utils::{EMPTY, flip};

/// Permute the square matrix `a` to upper block triangular form P*A*Q.
///
/// All output arrays are caller-allocated and borrowed for the call:
/// `row_permutations` and `column_permutations` of length n,
/// `boundary_array` of length n+1 (only `[0..=nblocks]` is meaningful on
/// return). `maxwork` and `work` are the matching work limit and its report,
/// as in [`max_transversal`].
///
/// Returns `(number_of_matches, number_of_scc_blocks)`. Entries of
/// `column_permutations` are flip-encoded: `q[k] >= 0` means the diagonal of
/// column k of P*A*Q is structurally nonzero, a flipped value marks a
/// structurally zero diagonal introduced to complete a deficient matching.
pub fn order(
    a: &CscMatrix,
    maxwork: f64,
    work: &mut f64,
    row_permutations: &mut [isize],
    column_permutations: &mut [isize],
    boundary_array: &mut [usize],
) -> (usize, usize) {
    let n = a.dim.ncols;
    let number_of_matches = max_transversal(a, maxwork, work, column_permutations);

    // complete the permutation if the matrix is structurally singular: pair
    // every unmatched row with some unmatched column and mark the pair as a
    // structural zero, so that unflip(column_permutations[0..n-1]) is a
    // permutation and A*Q has as many nonzeros on its diagonal as possible
    if number_of_matches < n {
        let mut flag = vec![0u8; n];

        // flag matched columns
        for col in 0..n {
            let j = column_permutations[col];
            if j != EMPTY {
                flag[j as usize] = 1;
            }
        }

        // list the unmatched columns
        let mut unmatched = vec![0; n];
        let mut nbadcol = 0;
        for j in (0..n).rev() {
            if flag[j] == 0 {
                unmatched[nbadcol] = j;
                nbadcol += 1;
            }
        }
        assert!(nbadcol + number_of_matches == n);

        // pair each unmatched row with the next unmatched column
        for col in 0..n {
            if column_permutations[col] == EMPTY && nbadcol > 0 {
                nbadcol -= 1;
                let j = unmatched[nbadcol];
                column_permutations[col] = flip(j as isize);
            }
        }
    }

    let number_of_scc_blocks = strongly_connected_components(
        a,
        Some(column_permutations),
        row_permutations,
        boundary_array,
    );

    log::debug!(
        "btf order: n={n} nnz={nnz} nmatch={number_of_matches} nblocks={number_of_scc_blocks}",
        nnz = a.nnz()
    );

    (number_of_matches, number_of_scc_blocks)
}

/// The block triangular ordering of a square sparse matrix, as produced by
/// [`run_order`].
///
/// Row i of A sits at position k of P*A*Q when `row_permutations[k] == i`;
/// column j of A sits at position k when `unflip(column_permutations[k]) == j`,
/// and that diagonal entry is structurally zero iff `column_permutations[k]`
/// is flipped. Block b spans positions
/// `block_boundaries[b]..block_boundaries[b + 1]`.
#[derive(Debug, Clone)]
pub struct BtfOrdering {
    /// P, size n
    pub row_permutations: Vec<isize>,
    /// Q, size n, flip-encoded
    pub column_permutations: Vec<isize>,
    /// R, size nblocks + 1
    pub block_boundaries: Vec<usize>,
    /// structural rank found by the matching (may undershoot when the work
    /// limit was hit)
    pub number_of_matches: usize,
    /// matching work consumed, or -1.0 if the work limit was reached
    pub work: f64,
}

impl BtfOrdering {
    pub fn number_of_blocks(&self) -> usize {
        self.block_boundaries.len() - 1
    }

    /// true when every diagonal entry of P*A*Q is structurally nonzero
    pub fn has_full_structural_rank(&self) -> bool {
        self.number_of_matches == self.row_permutations.len()
    }
}

/// Allocating convenience wrapper around [`order`].
pub fn run_order(a: &CscMatrix, maxwork: f64) -> BtfOrdering {
    assert!(a.is_square(), "btf ordering only supports square matrices");
    debug_assert!(a.is_pattern_valid());

    let n = a.dim.ncols;
    let mut row_permutations: Vec<isize> = vec![EMPTY; n];
    let mut column_permutations: Vec<isize> = vec![EMPTY; n];
    let mut boundary_array: Vec<usize> = vec![0; n + 1];
    let mut work = 0.0;

    let (number_of_matches, number_of_scc_blocks) = order(
        a,
        maxwork,
        &mut work,
        &mut row_permutations,
        &mut column_permutations,
        &mut boundary_array,
    );

    boundary_array.truncate(number_of_scc_blocks + 1);

    BtfOrdering {
        row_permutations,
        column_permutations,
        block_boundaries: boundary_array,
        number_of_matches,
        work,
    }
}
