//! Structural sparsity detection and graph coloring for sparse Jacobian and
//! Hessian recovery.

use std::collections::HashSet;

use crate::opcode::{OpCode, UNUSED};

/// Symmetric sparsity pattern in COO format (lower triangle + diagonal).
///
/// Entries are sorted by (row, col) and represent positions where the Hessian
/// may have non-zero values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SparsityPattern {
    /// Dimension of the (square) Hessian matrix.
    pub dim: usize,
    /// Row indices (0-based).
    pub rows: Vec<u32>,
    /// Column indices (0-based), where `cols[k] <= rows[k]` (lower triangle).
    pub cols: Vec<u32>,
}

impl SparsityPattern {
    /// Number of non-zero entries in the pattern.
    pub fn nnz(&self) -> usize {
        self.rows.len()
    }

    /// Whether the pattern is empty (all zeros).
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check if position (i, j) is in the pattern (checks both (i,j) and (j,i)).
    pub fn contains(&self, i: usize, j: usize) -> bool {
        let (r, c) = if i >= j { (i, j) } else { (j, i) };
        self.rows
            .iter()
            .zip(self.cols.iter())
            .any(|(&row, &col)| row as usize == r && col as usize == c)
    }
}

/// Rectangular sparsity pattern of a Jacobian in COO format.
///
/// Entries are sorted by (row, col).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JacobianSparsityPattern {
    /// Number of rows (outputs).
    pub num_rows: usize,
    /// Number of columns (inputs).
    pub num_cols: usize,
    /// Row indices (0-based).
    pub rows: Vec<u32>,
    /// Column indices (0-based).
    pub cols: Vec<u32>,
}

impl JacobianSparsityPattern {
    /// Number of structurally non-zero entries.
    pub fn nnz(&self) -> usize {
        self.rows.len()
    }

    /// Whether position (row, col) is in the pattern.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.rows
            .iter()
            .zip(self.cols.iter())
            .any(|(&r, &c)| r as usize == row && c as usize == col)
    }
}

/// Walk the tape forward, building the input-dependency bitset of every entry.
fn dependency_sets(
    opcodes: &[OpCode],
    arg_indices: &[[u32; 2]],
    num_inputs: usize,
    num_vars: usize,
    mut on_nonlinear: impl FnMut(OpCode, &[u64], &[u64], &[u64]),
) -> Vec<Vec<u64>> {
    let num_words = num_inputs.div_ceil(64);

    // deps[node] = set of input variables this node depends on
    let mut deps: Vec<Vec<u64>> = vec![vec![0u64; num_words]; num_vars];
    let empty = vec![0u64; num_words];

    let mut input_idx = 0usize;
    for i in 0..opcodes.len() {
        match opcodes[i] {
            OpCode::Input => {
                deps[i][input_idx / 64] |= 1u64 << (input_idx % 64);
                input_idx += 1;
            }
            OpCode::Const => {}
            op => {
                let [a_idx, b_idx] = arg_indices[i];
                let a = a_idx as usize;
                let b = (op.is_binary() && b_idx != UNUSED).then_some(b_idx as usize);

                union_into(&mut deps, i, a);
                if let Some(b) = b {
                    union_into(&mut deps, i, b);
                }

                if !matches!(classify_op(op), OpClass::Linear) {
                    let deps_b = b.map_or(&empty, |b| &deps[b]);
                    on_nonlinear(op, &deps[i][..], &deps[a][..], &deps_b[..]);
                }
            }
        }
    }
    deps
}

/// Hessian sparsity detection over the whole tape.
///
/// At nonlinear operations, marks the input pairs whose mixed second
/// derivative may be non-zero.
pub(crate) fn detect_sparsity_impl(
    opcodes: &[OpCode],
    arg_indices: &[[u32; 2]],
    num_inputs: usize,
    num_vars: usize,
) -> SparsityPattern {
    // Interaction pairs with row >= col
    let mut interactions: HashSet<(u32, u32)> = HashSet::new();

    dependency_sets(
        opcodes,
        arg_indices,
        num_inputs,
        num_vars,
        |op, deps_r, deps_a, deps_b| match classify_op(op) {
            OpClass::UnaryNonlinear => {
                mark_all_pairs(deps_r, num_inputs, &mut interactions);
            }
            OpClass::Product => {
                mark_cross_pairs(deps_a, deps_b, num_inputs, &mut interactions);
            }
            OpClass::Quotient => {
                // a/b is nonlinear in b alone as well as across a and b.
                mark_cross_pairs(deps_a, deps_b, num_inputs, &mut interactions);
                mark_all_pairs(deps_b, num_inputs, &mut interactions);
            }
            OpClass::Linear => {}
        },
    );

    let mut entries: Vec<(u32, u32)> = interactions.into_iter().collect();
    entries.sort_unstable();

    SparsityPattern {
        dim: num_inputs,
        rows: entries.iter().map(|&(r, _)| r).collect(),
        cols: entries.iter().map(|&(_, c)| c).collect(),
    }
}

/// Jacobian sparsity detection for the given output entries.
///
/// Row `k` of the pattern is the first-order dependency set of `out_indices[k]`.
pub(crate) fn detect_jacobian_sparsity_impl(
    opcodes: &[OpCode],
    arg_indices: &[[u32; 2]],
    num_inputs: usize,
    num_vars: usize,
    out_indices: &[u32],
) -> JacobianSparsityPattern {
    let deps = dependency_sets(opcodes, arg_indices, num_inputs, num_vars, |_, _, _, _| {});

    let mut rows = Vec::new();
    let mut cols = Vec::new();
    for (row, &out) in out_indices.iter().enumerate() {
        for col in extract_bits(&deps[out as usize], num_inputs) {
            rows.push(row as u32);
            cols.push(col);
        }
    }

    JacobianSparsityPattern {
        num_rows: out_indices.len(),
        num_cols: num_inputs,
        rows,
        cols,
    }
}

#[derive(Debug, Clone, Copy)]
enum OpClass {
    Linear,
    UnaryNonlinear,
    Product,
    Quotient,
}

fn classify_op(op: OpCode) -> OpClass {
    match op {
        OpCode::Add | OpCode::Sub | OpCode::Neg => OpClass::Linear,
        OpCode::Powi
        | OpCode::Sin
        | OpCode::Cos
        | OpCode::Tan => OpClass::UnaryNonlinear,
        OpCode::Mul => OpClass::Product,
        OpCode::Div => OpClass::Quotient,
        OpCode::Input | OpCode::Const => unreachable!(),
    }
}

/// Union deps[src] into deps[dst].
fn union_into(deps: &mut [Vec<u64>], dst: usize, src: usize) {
    if dst == src {
        return;
    }
    let (dst_set, src_set) = if dst < src {
        let (lo, hi) = deps.split_at_mut(src);
        (&mut lo[dst], &hi[0])
    } else {
        let (lo, hi) = deps.split_at_mut(dst);
        (&mut hi[0], &lo[src])
    };
    for (d, s) in dst_set.iter_mut().zip(src_set) {
        *d |= *s;
    }
}

/// Mark all pairs (i, j) where both i and j are in the dependency set.
fn mark_all_pairs(dep_set: &[u64], num_inputs: usize, interactions: &mut HashSet<(u32, u32)>) {
    let bits = extract_bits(dep_set, num_inputs);
    for i in 0..bits.len() {
        for j in 0..=i {
            // bits are ascending, so bits[i] >= bits[j]
            interactions.insert((bits[i], bits[j]));
        }
    }
}

/// Mark cross-pairs between two dependency sets.
fn mark_cross_pairs(
    deps_a: &[u64],
    deps_b: &[u64],
    num_inputs: usize,
    interactions: &mut HashSet<(u32, u32)>,
) {
    let bits_a = extract_bits(deps_a, num_inputs);
    let bits_b = extract_bits(deps_b, num_inputs);
    for &a in &bits_a {
        for &b in &bits_b {
            let (r, c) = if a >= b { (a, b) } else { (b, a) };
            interactions.insert((r, c));
        }
    }
}

/// Extract set bit positions from a bitset, in ascending order.
fn extract_bits(bitset: &[u64], max_bits: usize) -> Vec<u32> {
    let mut result = Vec::new();
    for (word_idx, &word) in bitset.iter().enumerate() {
        let mut w = word;
        while w != 0 {
            let bit = w.trailing_zeros();
            let pos = word_idx * 64 + bit as usize;
            if pos < max_bits {
                result.push(pos as u32);
            }
            w &= w - 1; // Clear lowest set bit
        }
    }
    result
}

/// Column coloring for forward-mode Jacobian compression.
///
/// Two columns conflict when some row has a structural non-zero in both.
/// Columns sharing a color can be seeded in a single forward sweep.
///
/// Returns `(colors, num_colors)` where `colors[j]` is the color of column `j`.
pub fn column_coloring(pattern: &JacobianSparsityPattern) -> (Vec<u32>, u32) {
    let n = pattern.num_cols;
    if n == 0 {
        return (Vec::new(), 0);
    }

    // Columns per row
    let mut row_cols: Vec<Vec<u32>> = vec![Vec::new(); pattern.num_rows];
    for (&r, &c) in pattern.rows.iter().zip(pattern.cols.iter()) {
        row_cols[r as usize].push(c);
    }

    let mut conflicts: Vec<HashSet<u32>> = vec![HashSet::new(); n];
    for cols in &row_cols {
        for &a in cols {
            for &b in cols {
                if a != b {
                    conflicts[a as usize].insert(b);
                }
            }
        }
    }

    greedy_color_order(&conflicts)
}

/// Greedy graph coloring for symmetric sparse Hessian recovery.
///
/// Colors the squared graph G^2 (vertices within distance 2 in the
/// interaction graph are adjacent) so that for each row of the Hessian,
/// at most one column in each color group has a non-zero entry. This
/// enables direct recovery of Hessian entries from compressed HVPs.
///
/// Returns `(colors, num_colors)` where `colors[i]` is the color assigned to input `i`.
pub fn greedy_coloring(pattern: &SparsityPattern) -> (Vec<u32>, u32) {
    let n = pattern.dim;
    if n == 0 {
        return (Vec::new(), 0);
    }

    let mut adj: Vec<Vec<u32>> = vec![Vec::new(); n];
    for (&r, &c) in pattern.rows.iter().zip(pattern.cols.iter()) {
        let r = r as usize;
        let c = c as usize;
        if r != c {
            adj[r].push(c as u32);
            adj[c].push(r as u32);
        }
    }

    // G^2: two vertices are adjacent if they share a common neighbor or are
    // directly adjacent.
    let mut adj2: Vec<HashSet<u32>> = vec![HashSet::new(); n];
    for v in 0..n {
        for &u in &adj[v] {
            adj2[v].insert(u);
            for &w in &adj[u as usize] {
                if w as usize != v {
                    adj2[v].insert(w);
                }
            }
        }
    }

    greedy_color_order(&adj2)
}

/// Greedy coloring of a conflict graph, visiting vertices in decreasing-degree
/// order (ties broken by index so the result is deterministic).
fn greedy_color_order(conflicts: &[HashSet<u32>]) -> (Vec<u32>, u32) {
    let n = conflicts.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| conflicts[b].len().cmp(&conflicts[a].len()).then(a.cmp(&b)));

    let mut colors = vec![u32::MAX; n];
    let mut num_colors = 0u32;

    for &v in &order {
        let used: HashSet<u32> = conflicts[v]
            .iter()
            .map(|&u| colors[u as usize])
            .filter(|&c| c != u32::MAX)
            .collect();

        let mut color = 0u32;
        while used.contains(&color) {
            color += 1;
        }
        colors[v] = color;
        num_colors = num_colors.max(color + 1);
    }

    (colors, num_colors)
}
