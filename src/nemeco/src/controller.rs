//! Parameterizations that map a Nelder-Mead parameter vector onto the
//! covariance matrix `C`: direct entries (treeless), branch lengths of a
//! user-supplied tree, or branch-length/admixture-proportion variables fed
//! through an admixture-graph expression table.

use std::collections::HashMap;

use matrix::Matrix;
use tree::Node;

use crate::likelihood::Likelihood;

/// Maps a flat Nelder-Mead parameter vector onto the lower triangle
/// (including the diagonal) of the `(K-1) x (K-1)` covariance matrix.
pub trait Parameterization {
    fn rk(&self) -> usize;

    /// The parameter vector corresponding to this parameterization's current
    /// state (the covariance matrix it was built from, for treeless; the
    /// branch lengths of the input tree; or `0.5` for every admixture-graph
    /// variable).
    fn init_parameters(&self) -> Vec<f64>;

    /// Decodes `params`, writing both triangles of `c`. Returns `false` to
    /// reject parameters that cannot be decoded (the caller still must check
    /// the resulting matrix's positivity separately).
    fn decode_lower(&mut self, c: &mut Matrix, params: &[f64]) -> bool;
}

/// Direct parameterization: `C`'s lower triangle entries are the Nelder-Mead
/// parameters themselves, in row-major order.
pub struct TreelessParameterization {
    rk: usize,
    initial_c: Matrix,
}

impl TreelessParameterization {
    pub fn new(initial_c: Matrix) -> Self {
        let rk = initial_c.height();
        Self { rk, initial_c }
    }
}

impl Parameterization for TreelessParameterization {
    fn rk(&self) -> usize {
        self.rk
    }

    fn init_parameters(&self) -> Vec<f64> {
        let mut params = Vec::with_capacity(self.rk + (self.rk * self.rk - self.rk) / 2);
        for i in 0..self.rk {
            for j in i..self.rk {
                params.push(self.initial_c.get(i, j));
            }
        }
        params
    }

    fn decode_lower(&mut self, c: &mut Matrix, params: &[f64]) -> bool {
        let mut idx = 0;
        for i in 0..self.rk {
            for j in i..self.rk {
                let value = params[idx];
                c.set(i, j, value);
                c.set(j, i, value);
                idx += 1;
            }
        }
        true
    }
}

fn copy_tree_to_params(node: &Node, params: &mut Vec<f64>) {
    for child in &node.children {
        params.push(child.length.unwrap_or(0.0));
        copy_tree_to_params(child, params);
    }
}

fn copy_params_to_tree<'a>(node: &mut Node, iter: &mut impl Iterator<Item = &'a f64>) {
    for child in &mut node.children {
        child.length = Some(*iter.next().expect("parameter count matches tree topology"));
        copy_params_to_tree(child, iter);
    }
}

/// Tree parameterization: the Nelder-Mead parameters are every branch length
/// of a user-supplied Newick tree (in a stable preorder-over-children walk),
/// and `C` is derived from the tree via least-common-ancestor path overlaps.
pub struct TreeParameterization {
    rk: usize,
    tree: Node,
}

impl TreeParameterization {
    pub fn new(tree: Node, rk: usize) -> Self {
        Self { rk, tree }
    }

    /// The tree with its branch lengths set to the most recently decoded
    /// parameters; used to emit the optimized tree after the run.
    pub fn tree(&self) -> &Node {
        &self.tree
    }
}

impl Parameterization for TreeParameterization {
    fn rk(&self) -> usize {
        self.rk
    }

    fn init_parameters(&self) -> Vec<f64> {
        let mut params = Vec::new();
        copy_tree_to_params(&self.tree, &mut params);
        params
    }

    fn decode_lower(&mut self, c: &mut Matrix, params: &[f64]) -> bool {
        let mut iter = params.iter();
        copy_params_to_tree(&mut self.tree, &mut iter);
        match tree::tree_to_c(&self.tree, self.rk + 1) {
            Ok(result) => {
                *c = result;
                true
            }
            Err(_) => false,
        }
    }
}

/// Admixture-graph parameterization: the Nelder-Mead parameters are the
/// declared admixture proportions (first) and branch lengths (second), and
/// each cell of `C`'s lower triangle is computed by evaluating the
/// corresponding shunting-yard expression over those variables.
pub struct AgiParameterization {
    rk: usize,
    agi: expr::AgiInput,
}

impl AgiParameterization {
    pub fn new(agi: expr::AgiInput) -> Self {
        let rk = agi.k - 1;
        Self { rk, agi }
    }

    pub fn args(&self) -> &HashMap<String, f64> {
        &self.agi.args
    }

    pub fn branch_names(&self) -> &[String] {
        &self.agi.branch_names
    }

    pub fn proportion_names(&self) -> &[String] {
        &self.agi.proportion_names
    }
}

impl Parameterization for AgiParameterization {
    fn rk(&self) -> usize {
        self.rk
    }

    fn init_parameters(&self) -> Vec<f64> {
        vec![0.5; self.agi.proportion_names.len() + self.agi.branch_names.len()]
    }

    fn decode_lower(&mut self, c: &mut Matrix, params: &[f64]) -> bool {
        if params.iter().any(|&v| v <= 0.0) {
            return false;
        }

        let n_prop = self.agi.proportion_names.len();
        if params[..n_prop].iter().any(|&v| v >= 1.0) {
            return false;
        }

        for i in 0..n_prop {
            let name = self.agi.proportion_names[i].clone();
            self.agi.args.insert(name, params[i]);
        }
        for (offset, name) in self.agi.branch_names.clone().into_iter().enumerate() {
            self.agi.args.insert(name, params[n_prop + offset]);
        }

        let mut idx = 0;
        for row in 0..self.rk {
            for col in 0..=row {
                let value = match self.agi.entries[idx].evaluate(&self.agi.args) {
                    Ok(v) => v,
                    Err(_) => return false,
                };
                c.set(row, col, value);
                c.set(col, row, value);
                idx += 1;
            }
        }
        true
    }
}

/// Wraps a [`Parameterization`] with the cached likelihood functor, computing
/// the Nelder-Mead objective value (the negated log-likelihood) for a
/// candidate parameter vector.
pub struct Controller<P: Parameterization> {
    c: Matrix,
    likelihood: Likelihood,
    parameterization: P,
}

impl<P: Parameterization> Controller<P> {
    pub fn new(parameterization: P, rf: Matrix, mu: &[f64]) -> Self {
        let rk = parameterization.rk();
        Self { c: Matrix::new(rk, rk), likelihood: Likelihood::new(rf, mu), parameterization }
    }

    pub fn init_parameters(&self) -> Vec<f64> {
        self.parameterization.init_parameters()
    }

    pub fn c(&self) -> &Matrix {
        &self.c
    }

    pub fn parameterization(&self) -> &P {
        &self.parameterization
    }

    pub fn parameterization_mut(&mut self) -> &mut P {
        &mut self.parameterization
    }

    /// Decodes `params` into `C`, rejects non-positive diagonal/sub-diagonal
    /// entries and failed Cholesky factorizations with `f64::MAX`, and
    /// otherwise returns the negated log-likelihood.
    pub fn compute_objfunc(&mut self, params: &[f64]) -> f64 {
        if !self.parameterization.decode_lower(&mut self.c, params) {
            return f64::MAX;
        }

        let rk = self.parameterization.rk();
        for row in 0..rk {
            for col in 0..=row {
                if self.c.get(row, col) <= 0.0 {
                    return f64::MAX;
                }
            }
        }

        let mut c_inv = self.c.clone();
        match c_inv.invert() {
            Ok(Some(log_det)) => -self.likelihood.evaluate(&c_inv, log_det),
            Ok(None) | Err(_) => f64::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn treeless_encode_decode_round_trips_the_lower_triangle() {
        let c = Matrix::from_vec(2, 2, vec![4.0, 1.0, 1.0, 3.0]);
        let mut parameterization = TreelessParameterization::new(c.clone());
        let params = parameterization.init_parameters();
        assert_eq!(params, vec![4.0, 1.0, 3.0]);

        let mut out = Matrix::new(2, 2);
        assert!(parameterization.decode_lower(&mut out, &params));
        assert_eq!(out, c);
    }

    #[test]
    fn agi_rejects_a_proportion_at_or_above_one() {
        let text = "\
a b
p
2
p * a + (1 - p) * b
";
        let agi = expr::AgiInput::parse(text.as_bytes()).unwrap();
        let mut parameterization = AgiParameterization::new(agi);
        let mut c = Matrix::new(1, 1);
        assert!(!parameterization.decode_lower(&mut c, &[1.0, 2.0, 3.0]));
    }
}
