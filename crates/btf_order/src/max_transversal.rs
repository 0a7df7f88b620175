// SPDX-License-Identifier: LGPL-2.1-or-later
//
// This file is based on the SuiteSparse BTF (MAXTRANS) implementation by
// Timothy A. Davis.
//
// BTF, Copyright (c) 2004-2024, University of Florida.  All Rights Reserved.
// Author: Timothy A. Davis.

//! Block Triangular Form (BTF), Maximum Transversal (MAXTRANS)
//!
//! the algorithm is described in the paper:
//! On Algorithms for Obtaining a Maximum Transversal by I. S. Duff
//! but honestly the paper is hard to follow. the SuiteSparse implementation
//! of Timothy A. Davis is much easier to read:
//! https://github.com/DrTimothyAldenDavis/SuiteSparse/blob/stable/BTF/Include/btf.h
//! the code there is well documented.
//!
//! one thing worth writing down: the "cheap" match and the depth first
//! search are not two separate passes over the matrix. every column first
//! tries the cheap scan (each column remembers where its scan stopped, so
//! all the cheap work together is O(nnz)), and only when that comes up
//! empty do we start walking the already matched columns looking for an
//! augmenting path. the search is iterative with explicit stacks, so the
//! depth is bounded by n and not by the call stack.

use crate::matrix::csc::CscMatrix;
use crate::utils::EMPTY;

/// Outcome of one augmenting-path search.
enum Augment {
    /// An unmatched row was reached; the path has been flipped into the
    /// matching.
    Matched,
    /// Every reachable row is already matched; the matching is unchanged.
    Unmatched,
    /// The work budget ran out mid-search; the matching is unchanged and
    /// still valid.
    WorkCapReached,
}

/// For the given column, try to grow the matching by one:
/// 1. the "cheap test": greedily take the first row of the column that is
///    still unmatched (each column remembers where its cheap scan stopped, so
///    all cheap scans together are O(nnz))
/// 2. otherwise a depth-first search over the columns currently matched to
///    this column's rows, looking for an augmenting path; when one is found
///    the matches along the path are rewritten from the far end back to
///    `current_column`.
fn try_augmenting_path(
    m: &CscMatrix,
    current_column: usize,
    column_permutations: &mut [isize],
    cheap: &mut [usize], // for each column, the next nonzero to try in its cheap scan
    visited: &mut [usize], // stamped with current_column to avoid revisits within one search
    row_stack: &mut [usize],
    column_stack: &mut [usize],
    position_stack: &mut [usize],
    work: &mut f64,
    work_cap: f64, // <= 0 means unlimited
) -> Augment {
    let quick = work_cap > 0.0;
    let mut found = false;
    let mut head: i64 = 0;
    column_stack[head as usize] = current_column;
    debug_assert!(visited[current_column] != current_column);

    while head >= 0 {
        let col = column_stack[head as usize];
        let end_of_column = m.col_end(col);

        if visited[col] != current_column {
            visited[col] = current_column;

            // start from the first nonzero that has not already been tried
            // for a cheap match
            let mut current_row_ptr = cheap[col];
            let mut row = 0;
            while current_row_ptr < end_of_column && !found {
                row = m.row_index(current_row_ptr);
                found = column_permutations[row] == EMPTY;
                current_row_ptr += 1;
            }
            cheap[col] = current_row_ptr;

            if found {
                // remember the free row so the rewind below can claim it
                row_stack[head as usize] = row;
                break;
            }
            // no cheap option left in this column; fall through to the
            // depth-first part, starting from the top of the column
            position_stack[head as usize] = m.col_start(col);
        }

        // depth-first scan of the rows of col, resuming where we left off
        let mut row_ptr = position_stack[head as usize];
        while row_ptr < end_of_column {
            *work += 1.0;
            if quick && *work > work_cap {
                return Augment::WorkCapReached;
            }
            let row = m.row_index(row_ptr);
            // every row of this column is matched (the cheap scan above would
            // have claimed a free one), so descend into its matched column
            let col_of_row = column_permutations[row];
            debug_assert!(col_of_row >= 0);
            if visited[col_of_row as usize] != current_column {
                position_stack[head as usize] = row_ptr + 1;
                row_stack[head as usize] = row;
                head += 1;
                column_stack[head as usize] = col_of_row as usize;
                break;
            }
            row_ptr += 1;
        }

        if row_ptr == end_of_column {
            // every row of col leads to a visited column; backtrack
            head -= 1;
        }
    }

    if found {
        // rewind the path, rewriting the matching along the way
        while head >= 0 {
            let col = column_stack[head as usize];
            let row = row_stack[head as usize];
            column_permutations[row] = col as isize;
            head -= 1;
        }
        return Augment::Matched;
    }
    Augment::Unmatched
}

/// Compute a maximum matching of rows to columns over the nonzero pattern of
/// `m`.
///
/// On return `column_permutations[i]` is the column matched to row i, or
/// [`EMPTY`] if row i is unmatched; the return value is the number of matched
/// rows (the structural rank when `m` is square and the search ran to
/// completion).
///
/// If `maxwork > 0`, the augmenting-path search is limited to
/// `maxwork * nnz(m)` work units (one unit per adjacency-list step; the cheap
/// scans are free). When the limit is hit, the search stops, `work` is set to
/// -1.0, and the matching computed so far is returned; it is valid but not
/// guaranteed maximum. Otherwise `work` reports the units consumed.
pub fn max_transversal(
    m: &CscMatrix,
    maxwork: f64,
    work: &mut f64,
    // Match in davis's code: row -> matched column
    column_permutations: &mut [isize],
) -> usize {
    let n = m.dim.ncols;
    let out_of_bounds = n + 1;
    column_permutations.fill(EMPTY);

    let mut cheap: Vec<usize> = vec![0; n];
    // Flag in davis's code
    let mut visited: Vec<usize> = vec![out_of_bounds; n];

    // Istack
    let mut row_stack: Vec<usize> = vec![out_of_bounds; m.dim.nrows];
    // Jstack
    let mut column_stack: Vec<usize> = vec![out_of_bounds; n];
    // Pstack
    let mut position_stack: Vec<usize> = vec![out_of_bounds; n];

    for (col, c) in cheap.iter_mut().enumerate() {
        *c = m.col_start(col);
    }

    let work_cap = if maxwork > 0.0 {
        maxwork * m.nnz() as f64
    } else {
        0.0
    };
    *work = 0.0;

    let mut number_of_matches = 0;
    for col in 0..n {
        match try_augmenting_path(
            m,
            col,
            column_permutations,
            &mut cheap,
            &mut visited,
            &mut row_stack,
            &mut column_stack,
            &mut position_stack,
            work,
            work_cap,
        ) {
            Augment::Matched => number_of_matches += 1,
            Augment::Unmatched => {}
            Augment::WorkCapReached => {
                log::debug!(
                    "max transversal stopped at column {col}: work limit {work_cap} reached"
                );
                *work = -1.0;
                break;
            }
        }
    }

    number_of_matches
}

/// Allocating convenience wrapper around [`max_transversal`].
pub fn run_max_transversal(m: &CscMatrix, maxwork: f64) -> (usize, f64, Vec<isize>) {
    let nrows = m.dim.nrows;
    let mut column_permutations: Vec<isize> = vec![EMPTY; nrows];
    let mut work = 0.0;
    let number_of_matches = max_transversal(m, maxwork, &mut work, &mut column_permutations);
    (number_of_matches, work, column_permutations)
}

/// Structural rank of `m`: the size of a maximum matching on its nonzero
/// pattern, i.e. the largest number of nonzeros that any row/column
/// permutation can place on the diagonal.
pub fn structural_rank(m: &CscMatrix) -> usize {
    let (number_of_matches, _, _) = run_max_transversal(m, 0.0);
    number_of_matches
}
