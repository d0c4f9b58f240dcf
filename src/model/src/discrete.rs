use matrix::Matrix;

/// A dosage-encoded genotype matrix: each cell is the minor-allele count
/// `0` (major/major), `1` (major/minor), `2` (minor/minor), or missing.
#[derive(Debug, Clone)]
pub struct DiscreteGenotypeMatrix {
    height: usize,
    width: usize,
    /// Dosage per cell, row-major; `None` marks a missing genotype.
    cells: Vec<Option<u8>>,
}

impl DiscreteGenotypeMatrix {
    pub fn from_cells(height: usize, width: usize, cells: Vec<Option<u8>>) -> Self {
        assert_eq!(cells.len(), height * width);
        Self { height, width, cells }
    }

    /// Builds from plain dosage codes, mapping any value outside `{0,1,2}` to missing.
    pub fn from_codes(height: usize, width: usize, codes: Vec<i8>) -> Self {
        let cells = codes.into_iter()
            .map(|c| if (0..=2).contains(&c) { Some(c as u8) } else { None })
            .collect();
        Self::from_cells(height, width, cells)
    }

    pub fn height(&self) -> usize { self.height }
    pub fn width(&self) -> usize { self.width }

    #[inline]
    fn get(&self, i: usize, j: usize) -> Option<u8> {
        self.cells[i * self.width + j]
    }

    pub fn compute_lle(&self, q: &Matrix, fa: &Matrix, fb: &Matrix) -> f64 {
        let k = q.width();
        let mut sum_i = 0.0;
        for i in 0..self.height {
            let mut sum_j = 0.0;
            for j in 0..self.width {
                let g = match self.get(i, j) {
                    Some(g) => g,
                    None => continue,
                };
                let (mut sum_lhs, mut sum_rhs) = (0.0, 0.0);
                for kk in 0..k {
                    sum_lhs += q.get(i, kk) * fa.get(kk, j);
                    sum_rhs += q.get(i, kk) * fb.get(kk, j);
                }
                sum_j += match g {
                    0 => 2.0 * sum_rhs.ln(),
                    1 => (sum_lhs * sum_rhs).ln(),
                    _ => 2.0 * sum_lhs.ln(),
                };
            }
            sum_i += sum_j;
        }
        sum_i
    }

    /// Gradient/Hessian of the per-marker log-likelihood with respect to column `j` of `F`.
    pub fn compute_derivatives_f(
        &self,
        q: &Matrix,
        qfa: &Matrix,
        qfb: &Matrix,
        j: usize,
        d_vec: &mut [f64],
        h_mat: &mut Matrix,
    ) {
        let k = d_vec.len();
        d_vec.iter_mut().for_each(|v| *v = 0.0);
        h_mat.fill(0.0);

        for i in 0..self.height {
            let g = match self.get(i, j) {
                Some(g) => f64::from(g),
                None => continue,
            };
            let qfa_ij = qfa.get(i, j);
            let qfb_ij = qfb.get(i, j);
            let term1 = g / qfa_ij;
            let term2 = (2.0 - g) / qfb_ij;
            let term3 = term1 - term2;
            let term4 = term1 / qfa_ij + term2 / qfb_ij;

            for k1 in 0..k {
                let q_ik1 = q.get(i, k1);
                d_vec[k1] += term3 * q_ik1;
                for k2 in 0..k {
                    let q_ik2 = q.get(i, k2);
                    *h_mat.entry(k1, k2) -= term4 * q_ik1 * q_ik2;
                }
            }
        }
    }

    /// Gradient/Hessian of the per-individual log-likelihood with respect to row `i` of `Q`.
    pub fn compute_derivatives_q(
        &self,
        fa: &Matrix,
        fb: &Matrix,
        qfa: &Matrix,
        qfb: &Matrix,
        i: usize,
        d_vec: &mut [f64],
        h_mat: &mut Matrix,
    ) {
        let k = d_vec.len();
        d_vec.iter_mut().for_each(|v| *v = 0.0);
        h_mat.fill(0.0);

        for j in 0..self.width {
            let g = match self.get(i, j) {
                Some(g) => f64::from(g),
                None => continue,
            };
            let qfa_ij = qfa.get(i, j);
            let qfb_ij = qfb.get(i, j);
            let term1 = g / qfa_ij;
            let term2 = (2.0 - g) / qfb_ij;
            let term3 = term1 / qfa_ij;
            let term4 = term2 / qfb_ij;

            for k1 in 0..k {
                let fa_k1j = fa.get(k1, j);
                let fb_k1j = fb.get(k1, j);
                d_vec[k1] += term1 * fa_k1j + term2 * fb_k1j;
                for k2 in 0..k {
                    let fa_k2j = fa.get(k2, j);
                    let fb_k2j = fb.get(k2, j);
                    *h_mat.entry(k1, k2) -= term3 * fa_k1j * fa_k2j + term4 * fb_k1j * fb_k2j;
                }
            }
        }
    }

    /// Log-likelihood contribution of a single cell, given the already-mixed
    /// `qfa = sum_k q[k]*fa[k]` and `qfb = sum_k q[k]*fb[k]` for that cell.
    /// Returns `0.0` for a missing genotype.
    pub fn cell_lle(&self, i: usize, j: usize, qfa_ij: f64, qfb_ij: f64) -> f64 {
        match self.get(i, j) {
            None => 0.0,
            Some(0) => 2.0 * qfb_ij.ln(),
            Some(1) => (qfa_ij * qfb_ij).ln(),
            Some(_) => 2.0 * qfa_ij.ln(),
        }
    }

    pub fn is_missing(&self, i: usize, j: usize) -> bool {
        self.get(i, j).is_none()
    }

    pub fn create_mu(&self, f_epsilon: f64) -> Vec<f64> {
        let f_min = f_epsilon;
        let f_max = 1.0 - f_epsilon;
        (0..self.width)
            .map(|j| {
                let sum: f64 = (0..self.height)
                    .filter_map(|i| self.get(i, j))
                    .map(|g| 2.0 - f64::from(g))
                    .sum();
                (sum / (2.0 * self.height as f64)).clamp(f_min, f_max)
            })
            .collect()
    }
}
