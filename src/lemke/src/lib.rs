//! Lemke's complementary pivoting algorithm for the linear complementarity
//! problem `w - Mz = q, w,z >= 0, w^T z = 0`, used as the legacy inner solver for
//! the ancestry optimizer's `Q`/`F` updates.

use matrix::Matrix;

const EPSILON: f64 = 0.000_001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LemkeState {
    Executing,
    Completed,
    AbortedInitialization,
    AbortedElimination,
    AbortedPivot,
}

/// A single step of Lemke's algorithm operating on an explicit tableau.
///
/// The tableau has `n` rows and `2n+2` columns: the first `n` columns hold the
/// identity for the `w` basic variables, the next `n` hold `-M`, column `2n` holds
/// the `z_0` coefficient, and column `2n+1` holds `q`.
pub struct Lemke {
    tableau: Matrix,
    labels: Vec<usize>,
    pivot_row: Option<usize>,
    pivot_col: Option<usize>,
    state: LemkeState,
}

impl Lemke {
    pub fn new(tableau: Matrix) -> Self {
        let n = tableau.height();
        assert!(n > 0);
        assert_eq!(tableau.width(), 2 * n + 2);

        let z0 = 2 * n;
        let mut lemke = Self {
            tableau,
            labels: (0..n).collect(),
            pivot_row: None,
            pivot_col: Some(z0),
            state: LemkeState::Executing,
        };
        if !lemke.find_initial_pivot_row() {
            lemke.terminate(LemkeState::AbortedInitialization);
        }
        lemke
    }

    /// Builds the tableau from an `M` matrix and `q` vector and runs Lemke's
    /// algorithm to completion. Returns the `z` output vector on success.
    pub fn solve(m: &Matrix, q: &[f64]) -> Option<Vec<f64>> {
        let n = q.len();
        assert_eq!(m.height(), n);
        assert_eq!(m.width(), n);

        let mut t = Matrix::new(n, 2 * n + 2);
        for i in 0..n {
            *t.entry(i, i) = 1.0;
            for j in 0..n {
                *t.entry(i, n + j) = -m.get(i, j);
            }
            *t.entry(i, 2 * n) = -1.0;
            *t.entry(i, 2 * n + 1) = q[i];
        }

        let mut lemke = Self::new(t);
        if lemke.run() {
            Some(lemke.output())
        } else {
            None
        }
    }

    pub fn state(&self) -> LemkeState {
        self.state
    }

    pub fn is_executing(&self) -> bool {
        self.state == LemkeState::Executing
    }

    /// Runs the algorithm to completion or abort. Returns whether it completed.
    pub fn run(&mut self) -> bool {
        while self.state == LemkeState::Executing {
            self.iterate();
        }
        self.state == LemkeState::Completed
    }

    /// Performs one pivot step. Returns whether the algorithm is still executing.
    pub fn iterate(&mut self) -> bool {
        if self.state != LemkeState::Executing {
            return false;
        }
        if !self.eliminate() {
            self.terminate(LemkeState::AbortedElimination);
            return false;
        }
        if !self.relabel() {
            self.terminate(LemkeState::Completed);
            return false;
        }
        if !self.find_pivot_row() {
            self.terminate(LemkeState::AbortedPivot);
            return false;
        }
        true
    }

    /// Reads off the `z` vector from the current tableau and labeling.
    pub fn output(&self) -> Vec<f64> {
        let n = self.tableau.height();
        let z1 = n;
        let q_col = n + n + 1;
        let mut out = vec![0.0; n];
        for i in 0..n {
            let label = self.labels[i];
            if label >= z1 {
                out[label - z1] = self.tableau.get(i, q_col);
            }
        }
        out
    }

    fn eliminate(&mut self) -> bool {
        let (row, col) = match (self.pivot_row, self.pivot_col) {
            (Some(r), Some(c)) => (r, c),
            _ => return false,
        };
        let width = self.tableau.width();
        let n = self.tableau.height();

        let pivot = self.tableau.get(row, col);
        if pivot.abs() < EPSILON {
            return false;
        }

        for j in 0..width {
            if j != col {
                let v = self.tableau.get(row, j) / pivot;
                self.tableau.set(row, j, v);
            }
        }
        self.tableau.set(row, col, 1.0);

        for i in 0..n {
            if i == row {
                continue;
            }
            let factor = self.tableau.get(i, col);
            for j in 0..width {
                if j != col {
                    let v = self.tableau.get(i, j) - factor * self.tableau.get(row, j);
                    self.tableau.set(i, j, v);
                }
            }
            self.tableau.set(i, col, 0.0);
        }
        true
    }

    fn find_initial_pivot_row(&mut self) -> bool {
        let n = self.tableau.height();
        let q_col = n + n + 1;

        self.pivot_row = None;
        let mut pivot_value = 0.0;
        for i in 0..n {
            let t_iq = self.tableau.get(i, q_col);
            if t_iq >= 0.0 {
                continue;
            }
            if self.pivot_row.is_none() || t_iq < pivot_value {
                self.pivot_row = Some(i);
                pivot_value = t_iq;
            }
        }
        self.pivot_row.is_some()
    }

    fn find_pivot_row(&mut self) -> bool {
        let n = self.tableau.height();
        let q_col = n + n + 1;
        let col = self.pivot_col.expect("pivot column must be set before a ratio test");

        self.pivot_row = None;
        let mut ratio = 0.0;
        for i in 0..n {
            let t_ip = self.tableau.get(i, col);
            if t_ip <= 0.0 {
                continue;
            }
            let r_i = self.tableau.get(i, q_col) / t_ip;
            if self.pivot_row.is_none() || r_i < ratio {
                self.pivot_row = Some(i);
                ratio = r_i;
            }
        }
        self.pivot_row.is_some()
    }

    fn relabel(&mut self) -> bool {
        let n = self.tableau.height();
        let z1 = n;
        let z0 = n + n;
        let row = self.pivot_row.expect("pivot row must be set before relabeling");
        let col = self.pivot_col.expect("pivot column must be set before relabeling");

        let old_label = self.labels[row];
        self.labels[row] = col;

        if old_label == z0 {
            return false;
        }

        self.pivot_col = Some(if old_label >= z1 { old_label - n } else { old_label + n });
        true
    }

    fn terminate(&mut self, new_state: LemkeState) {
        self.pivot_row = None;
        self.pivot_col = None;
        self.state = new_state;
    }
}
