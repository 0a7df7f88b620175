// SPDX-License-Identifier: LGPL-2.1-or-later
//
// This file is based on the SuiteSparse BTF (STRONGCOMP) implementation by
// Timothy A. Davis.
//
// BTF, Copyright (c) 2004-2024, University of Florida.  All Rights Reserved.
// Author: Timothy A. Davis.

//! Block Triangular Form (BTF), Strongly Connected Components (SCC)
//!
//! the algorithm is described in the paper:
//! "An implementation of Tarjan's algorithm for the Block Triangularization
//! of a Matrix" by I. S. Duff and J. K. Reid
//! but the paper is not very helpful. the SuiteSparse implementation of
//! Timothy A. Davis is extensively documented and much easier to follow:
//! https://github.com/DrTimothyAldenDavis/SuiteSparse/blob/stable/BTF/Include/btf.h
//!
//! how the graph wording maps onto the matrix confused me at first, so i am
//! writing it down here. the vertices are the columns, and the adjacency
//! list of vertex j (its outgoing edges) is the list of nonzero rows in
//! column j. when the column permutation from the max transversal is
//! supplied, vertex j stands for column unflip(Q[j]) of A, so the graph we
//! actually walk is A*Q and its diagonal is the matching. tarjan only
//! closes a component once everything reachable from it is already emitted,
//! which is exactly why the permuted matrix comes out upper block
//! triangular.
//!
//! the textbook recursion is replaced with an explicit node stack plus a
//! scan position stack, so the search never needs more than O(n) space no
//! matter how deep the graph is.

use std::cmp::min;

use crate::matrix::csc::CscMatrix;
use crate::utils::{EMPTY, unflip};

// visited[j] = UNVISITED means node j has not been visited yet;
// UNASSIGNED means node j has been visited but not assigned to a component
// yet (it is still on the component stack); any other value is the index of
// the component node j belongs to.
const UNVISITED: usize = usize::MAX;
const UNASSIGNED: usize = usize::MAX - 1;

fn dfs(
    m: &CscMatrix,
    // column permutation from the maximum transversal, flip-encoded entries
    // allowed; None runs on the columns of A as-is
    column_permutations: Option<&[isize]>,
    // the node the search starts from
    start_column: usize,

    // monotonic discovery timestamp
    node_graph_index: &mut usize,
    // number of components found so far
    number_of_scc_blocks: &mut usize,

    visited: &mut [usize],
    // graph_indices[j] is the discovery time of node j
    graph_indices: &mut [isize],
    // low[j] is the lowest discovery time reachable from node j
    low: &mut [isize],

    // stacks
    component_stack: &mut [usize],
    column_stack: &mut [usize],
    position_stack: &mut [usize],
) {
    let mut component_head = 0;
    let mut column_head: i64 = 0;
    column_stack[column_head as usize] = start_column;
    debug_assert!(visited[start_column] == UNVISITED);

    while column_head >= 0 {
        let col = column_stack[column_head as usize];
        // resolve which column of A this node scans
        let column_after_permutation = match column_permutations {
            Some(q) => unflip(q[col]) as usize,
            None => col,
        };
        let end_of_column = m.col_end(column_after_permutation);

        if visited[col] == UNVISITED {
            // first arrival: stamp the discovery time and join the
            // component-in-progress stack
            component_head += 1;
            component_stack[component_head] = col;
            *node_graph_index += 1;
            graph_indices[col] = *node_graph_index as isize;
            low[col] = *node_graph_index as isize;
            visited[col] = UNASSIGNED;

            position_stack[column_head as usize] = m.col_start(column_after_permutation);
        }

        let mut row_ptr = position_stack[column_head as usize];
        while row_ptr < end_of_column {
            // examine the edge from node "col" to node "row"
            let row = m.row_index(row_ptr);
            if visited[row] == UNVISITED {
                // descend; resume this column one past the current edge
                position_stack[column_head as usize] = row_ptr + 1;
                column_head += 1;
                column_stack[column_head as usize] = row;
                debug_assert!(graph_indices[row] == EMPTY);
                debug_assert!(low[row] == EMPTY);
                break;
            } else if visited[row] == UNASSIGNED {
                // back/cross edge to a node still on the component stack:
                // lowlink update with its discovery time. A self-loop lands
                // here too and is a no-op since low[col] <= graph_indices[col]
                // already.
                debug_assert!(graph_indices[row] > 0);
                debug_assert!(low[row] > 0);
                low[col] = min(low[col], graph_indices[row]);
            }
            // edges into already-closed components are ignored

            row_ptr += 1;
        }

        if row_ptr == end_of_column {
            // all edges from node "col" have been examined
            column_head -= 1;

            if low[col] == graph_indices[col] {
                // col is the head of a component: everything above it on the
                // component stack belongs to the same block
                loop {
                    debug_assert!(component_head > 0);
                    let i = component_stack[component_head];
                    component_head -= 1;
                    debug_assert!(visited[i] == UNASSIGNED);
                    visited[i] = *number_of_scc_blocks;
                    if i == col {
                        break;
                    }
                }
                *number_of_scc_blocks += 1;
            }

            // propagate the lowlink to the parent
            if column_head >= 0 {
                let parent = column_stack[column_head as usize];
                low[parent] = min(low[parent], low[col]);
            }
        }
    }
}

/// Find the strongly connected components of the column intersection graph of
/// `m` (of `m * Q` when `column_permutations` is supplied) and build the
/// symmetric permutation that collects each component into a contiguous
/// diagonal block.
///
/// On return `row_permutations` holds the permutation P (node at position k is
/// `row_permutations[k]`, ascending within each block), `boundary_array[b]` is
/// the first position of block b (`boundary_array[nblocks] = n`), and, when a
/// column permutation was supplied, it has been composed with P so that the
/// overall ordering is P*A*Q; flip marks in it are preserved. Returns the
/// number of blocks.
///
/// During the search `row_permutations` doubles as the lowlink workspace and
/// `boundary_array` as the component stack; both are rebuilt by the
/// construction passes before returning.
pub fn strongly_connected_components(
    m: &CscMatrix,
    column_permutations: Option<&mut [isize]>,
    row_permutations: &mut [isize],
    // n+1 size
    boundary_array: &mut [usize],
) -> usize {
    let n = m.dim.ncols;
    let out_of_bounds = n + 1;

    let mut graph_indices: Vec<isize> = vec![EMPTY; n];
    // reuse the row permutation as the low array
    let low = row_permutations;
    low.fill(EMPTY);
    // Flag in davis's code
    let mut visited: Vec<usize> = vec![UNVISITED; n];

    // reuse the boundary array as the component stack (n + 1 entries)
    let component_stack = &mut *boundary_array;
    component_stack.fill(out_of_bounds);

    let mut column_stack: Vec<usize> = vec![out_of_bounds; n];
    let mut position_stack: Vec<usize> = vec![out_of_bounds; n];

    let mut node_graph_index = 0;
    let mut number_of_scc_blocks = 0;

    for col in 0..n {
        debug_assert!(visited[col] == UNVISITED || visited[col] < number_of_scc_blocks);
        if visited[col] == UNVISITED {
            dfs(
                m,
                column_permutations.as_deref(),
                col,
                &mut node_graph_index,
                &mut number_of_scc_blocks,
                &mut visited,
                &mut graph_indices,
                low,
                component_stack,
                &mut column_stack,
                &mut position_stack,
            );
        }
    }

    debug_assert!(node_graph_index == n);

    // the component of node j is visited[j]; turn that labeling into the
    // boundary array and the block-collecting permutation

    // count the nodes of each block
    for b in 0..number_of_scc_blocks {
        boundary_array[b] = 0;
    }
    for col in 0..n {
        debug_assert!(graph_indices[col] > 0 && graph_indices[col] <= n as isize);
        debug_assert!(low[col] > 0 && low[col] <= n as isize);
        debug_assert!(visited[col] < number_of_scc_blocks);
        boundary_array[visited[col]] += 1;
    }

    // exclusive prefix sum, with graph_indices as the scratch cursor; its
    // discovery times are no longer needed
    if number_of_scc_blocks > 0 {
        graph_indices[0] = 0;
    }
    for b in 1..number_of_scc_blocks {
        graph_indices[b] = graph_indices[b - 1] + boundary_array[b - 1] as isize;
    }
    for b in 0..number_of_scc_blocks {
        boundary_array[b] = graph_indices[b] as usize;
    }
    boundary_array[number_of_scc_blocks] = n;

    // construct the permutation; scanning the nodes in ascending order keeps
    // each block internally in natural order
    let row_permutations = low;
    for col in 0..n {
        let block = visited[col];
        row_permutations[graph_indices[block] as usize] = col as isize;
        graph_indices[block] += 1;
    }

    for col in 0..n {
        debug_assert!(row_permutations[col] >= 0);
    }

    // the symmetric permutation P was found on A*Q, so the composed column
    // permutation Q*P^T is returned in place of Q; the overall ordering is
    // then P*A*Q. The composition is by index, so flipped entries pass
    // through untouched.
    if let Some(q) = column_permutations {
        for k in 0..n {
            graph_indices[k] = q[row_permutations[k] as usize];
        }
        for col in 0..n {
            q[col] = graph_indices[col];
        }
    }

    number_of_scc_blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::builder::MatrixBuilder;
    use crate::utils::flip;

    fn build(n: usize, triplets: &[(usize, usize)]) -> CscMatrix {
        let mut b = MatrixBuilder::new(n, n);
        for &(c, r) in triplets {
            b.push(c, r).unwrap();
        }
        b.build_csc().unwrap()
    }

    #[test]
    fn diagonal_matrix_is_all_singletons() {
        let a = build(4, &[(0, 0), (1, 1), (2, 2), (3, 3)]);
        let mut p = vec![EMPTY; 4];
        let mut r = vec![0usize; 5];
        let nblocks = strongly_connected_components(&a, None, &mut p, &mut r);
        assert_eq!(nblocks, 4);
        assert_eq!(p, vec![0, 1, 2, 3]);
        assert_eq!(r, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn fully_coupled_matrix_is_one_block() {
        let a = build(
            3,
            &[
                (0, 0),
                (0, 1),
                (1, 1),
                (1, 2),
                (2, 2),
                (2, 0),
            ],
        );
        let mut p = vec![EMPTY; 3];
        let mut r = vec![0usize; 4];
        let nblocks = strongly_connected_components(&a, None, &mut p, &mut r);
        assert_eq!(nblocks, 1);
        assert_eq!(p, vec![0, 1, 2]);
        // only r[0..=nblocks] is meaningful
        assert_eq!(&r[..=nblocks], &[0, 3]);
    }

    #[test]
    fn sink_component_is_emitted_first() {
        // 0 and 1 form a cycle that also points at the singleton 2; the
        // singleton has no out-edges, so it is the sink and becomes block 0
        let a = build(3, &[(0, 1), (1, 0), (0, 2), (2, 2)]);
        let mut p = vec![EMPTY; 3];
        let mut r = vec![0usize; 4];
        let nblocks = strongly_connected_components(&a, None, &mut p, &mut r);
        assert_eq!(nblocks, 2);
        assert_eq!(&r[..=nblocks], &[0, 1, 3]);
        // block 0 is the sink {2}, block 1 the cycle {0, 1} in natural order
        assert_eq!(p, vec![2, 0, 1]);
    }

    #[test]
    fn empty_columns_form_singletons() {
        let a = build(3, &[(0, 0)]);
        let mut p = vec![EMPTY; 3];
        let mut r = vec![0usize; 4];
        let nblocks = strongly_connected_components(&a, None, &mut p, &mut r);
        assert_eq!(nblocks, 3);
        assert_eq!(p, vec![0, 1, 2]);
        assert_eq!(r, vec![0, 1, 2, 3]);
    }

    #[test]
    fn supplied_column_permutation_drives_the_graph() {
        // A has its perfect matching on the antidiagonal; with Q applied the
        // graph is the identity, so every node is a singleton
        let a = build(2, &[(0, 1), (1, 0)]);
        let mut q = vec![1isize, 0];
        let mut p = vec![EMPTY; 2];
        let mut r = vec![0usize; 3];
        let nblocks = strongly_connected_components(&a, Some(&mut q), &mut p, &mut r);
        assert_eq!(nblocks, 2);
        assert_eq!(p, vec![0, 1]);
        // Q composed with the (identity) symmetric permutation
        assert_eq!(q, vec![1, 0]);
        assert_eq!(r, vec![0, 1, 2]);
    }

    #[test]
    fn flipped_entries_survive_the_composition() {
        // column 1 is empty; the completed matching marks it as structurally
        // zero on the diagonal of node 1
        let a = build(2, &[(0, 0)]);
        let mut q = vec![0isize, flip(1)];
        let mut p = vec![EMPTY; 2];
        let mut r = vec![0usize; 3];
        let nblocks = strongly_connected_components(&a, Some(&mut q), &mut p, &mut r);
        assert_eq!(nblocks, 2);
        assert_eq!(p, vec![0, 1]);
        assert_eq!(q, vec![0, flip(1)]);
        assert_eq!(r, vec![0, 1, 2]);
    }

    #[test]
    fn zero_order_matrix() {
        let a = build(0, &[]);
        let mut p: Vec<isize> = vec![];
        let mut r = vec![7usize];
        let nblocks = strongly_connected_components(&a, None, &mut p, &mut r);
        assert_eq!(nblocks, 0);
        assert_eq!(r, vec![0]);
    }
}
