//! Dense row-major matrix storage with direct BLAS/LAPACK kernel bindings.
//!
//! The kernels named here (`gemm`, `gemv`, `gesv`, `potrf_lower`, `potri_lower`,
//! `invert`) call the underlying Fortran routines with as little indirection as
//! possible. Storage is row-major end to end; LAPACK's routines are
//! column-major, so each kernel adapts at its own boundary rather than leaking
//! the distinction to callers.

mod error;

pub use error::MatrixError;

extern crate blas_src;
extern crate lapack_src;

extern "C" {
    fn openblas_set_num_threads(num_threads: i32);
}

/// Sets the OpenBLAS backend's thread count process-wide. The core itself
/// issues no concurrent kernel calls; this is the one knob that lets a
/// caller's configured `num_threads` option reach the BLAS/LAPACK layer.
pub fn set_num_threads(num_threads: usize) {
    unsafe {
        openblas_set_num_threads(num_threads as i32);
    }
}

/// A dense, row-major matrix of `f64` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    height: usize,
    width: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Creates a new matrix of the given size, filled with zero.
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width, data: vec![0.0; height * width] }
    }

    /// Creates a matrix from row-major data. Panics if `data.len() != height*width`.
    pub fn from_vec(height: usize, width: usize, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), height * width);
        Self { height, width, data }
    }

    pub fn height(&self) -> usize { self.height }
    pub fn width(&self) -> usize { self.width }
    pub fn len(&self) -> usize { self.data.len() }
    pub fn is_empty(&self) -> bool { self.data.is_empty() }
    pub fn data(&self) -> &[f64] { &self.data }
    pub fn data_mut(&mut self) -> &mut [f64] { &mut self.data }

    pub fn is_size(&self, height: usize, width: usize) -> bool {
        self.height == height && self.width == width
    }

    fn assert_size(&self, height: usize, width: usize) -> Result<(), MatrixError> {
        if self.is_size(height, width) {
            Ok(())
        } else {
            Err(MatrixError::SizeMismatch {
                expected_h: height, expected_w: width,
                found_h: self.height, found_w: self.width,
            })
        }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.width + col] = value;
    }

    #[inline]
    pub fn entry(&mut self, row: usize, col: usize) -> &mut f64 {
        &mut self.data[row * self.width + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.width..(row + 1) * self.width]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        &mut self.data[row * self.width..(row + 1) * self.width]
    }

    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|v| *v = value);
    }

    pub fn clamp_range(&mut self, lo: f64, hi: f64) {
        self.data.iter_mut().for_each(|v| *v = v.clamp(lo, hi));
    }

    pub fn row_sum(&self, row: usize) -> f64 {
        self.row(row).iter().sum()
    }

    pub fn col_sum(&self, col: usize) -> f64 {
        (0..self.height).map(|r| self.get(r, col)).sum()
    }

    pub fn row_min(&self, row: usize) -> f64 {
        self.row(row).iter().cloned().fold(f64::INFINITY, f64::min)
    }

    pub fn row_max(&self, row: usize) -> f64 {
        self.row(row).iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn col_min(&self, col: usize) -> f64 {
        (0..self.height).map(|r| self.get(r, col)).fold(f64::INFINITY, f64::min)
    }

    pub fn col_max(&self, col: usize) -> f64 {
        (0..self.height).map(|r| self.get(r, col)).fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn scale_row(&mut self, row: usize, factor: f64) {
        self.row_mut(row).iter_mut().for_each(|v| *v *= factor);
    }

    /// Renormalizes a row so it sums exactly to one.
    pub fn renormalize_row(&mut self, row: usize) {
        let sum = self.row_sum(row);
        if sum != 0.0 {
            self.scale_row(row, 1.0 / sum);
        }
    }

    /// Returns the transpose as a new matrix.
    pub fn transposed(&self) -> Self {
        let mut out = Self::new(self.width, self.height);
        for r in 0..self.height {
            for c in 0..self.width {
                out.set(c, r, self.get(r, c));
            }
        }
        out
    }

    /// Mirrors the lower triangle (including the diagonal) onto the upper triangle.
    /// Requires a square matrix.
    pub fn copy_lower_to_upper(&mut self) -> Result<(), MatrixError> {
        if self.height != self.width {
            return Err(MatrixError::NotSquare { height: self.height, width: self.width });
        }
        for r in 0..self.height {
            for c in 0..r {
                let v = self.get(r, c);
                self.set(c, r, v);
            }
        }
        Ok(())
    }

    /// General matrix-matrix product: `c <- alpha*a*b + beta*c`.
    ///
    /// `a` is `m x k`, `b` is `k x n`, `c` is `m x n`. Row-major data is adapted to
    /// the column-major BLAS convention by swapping operand order: row-major
    /// `C = A*B` has the same bytes as column-major `C^T = B^T * A^T`, and a
    /// row-major buffer is already the column-major image of its transpose, so no
    /// copy is required.
    pub fn gemm(a: &Matrix, b: &Matrix, c: &mut Matrix, alpha: f64, beta: f64) -> Result<(), MatrixError> {
        let (m, k) = (a.height, a.width);
        b.assert_size(k, b.width)?;
        let n = b.width;
        c.assert_size(m, n)?;

        let (m, n, k) = (m as i32, n as i32, k as i32);
        unsafe {
            blas::dgemm(
                b'N', b'N',
                n, m, k,
                alpha,
                &b.data, n,
                &a.data, k,
                beta,
                &mut c.data, n,
            );
        }
        Ok(())
    }

    /// Matrix-vector product: `y <- alpha*a*x + beta*y`. `a` is `m x n`.
    pub fn gemv(a: &Matrix, x: &[f64], y: &mut [f64], alpha: f64, beta: f64) -> Result<(), MatrixError> {
        if x.len() != a.width {
            return Err(MatrixError::SizeMismatch {
                expected_h: a.width, expected_w: 1, found_h: x.len(), found_w: 1,
            });
        }
        if y.len() != a.height {
            return Err(MatrixError::SizeMismatch {
                expected_h: a.height, expected_w: 1, found_h: y.len(), found_w: 1,
            });
        }
        let (m, n) = (a.height as i32, a.width as i32);
        unsafe {
            // a is row-major m x n; its buffer is the column-major image of a^T (n x m).
            // y <- alpha * a^T^T * x + beta * y == alpha * (a^T)^T * x + beta*y, computed
            // by asking BLAS for trans='T' on the n x m column-major buffer.
            blas::dgemv(b'T', n, m, alpha, &a.data, n, x, 1, beta, y, 1);
        }
        Ok(())
    }

    /// Solves `A X = B` in place via LU decomposition with partial pivoting.
    /// `A` is square `n x n`; `B` is `n x nrhs`. On success, `b` holds `X`.
    pub fn gesv(a: &mut Matrix, b: &mut Matrix) -> Result<(), MatrixError> {
        if a.height != a.width {
            return Err(MatrixError::NotSquare { height: a.height, width: a.width });
        }
        let n = a.height;
        b.assert_size(n, b.width)?;
        let nrhs = b.width;

        // LAPACK is column-major; transpose both operands into scratch buffers,
        // solve, then transpose the result back.
        let mut a_col = vec![0.0; n * n];
        for r in 0..n {
            for c in 0..n {
                a_col[r + c * n] = a.get(r, c);
            }
        }
        let mut b_col = vec![0.0; n * nrhs];
        for r in 0..n {
            for c in 0..nrhs {
                b_col[r + c * n] = b.get(r, c);
            }
        }

        let mut ipiv = vec![0i32; n];
        let mut info = 0i32;
        unsafe {
            lapack::dgesv(n as i32, nrhs as i32, &mut a_col, n as i32, &mut ipiv, &mut b_col, n as i32, &mut info);
        }
        if info != 0 {
            return Err(MatrixError::SingularSystem { info });
        }

        for r in 0..n {
            for c in 0..n {
                a.set(r, c, a_col[r + c * n]);
            }
            for c in 0..nrhs {
                b.set(r, c, b_col[r + c * n]);
            }
        }
        Ok(())
    }

    /// Computes the Cholesky factor of a symmetric positive-definite matrix into
    /// its lower triangle. Returns `false` (matrix left partially overwritten) if
    /// the matrix is not positive definite.
    pub fn potrf_lower(&mut self) -> Result<bool, MatrixError> {
        if self.height != self.width {
            return Err(MatrixError::NotSquare { height: self.height, width: self.width });
        }
        let n = self.height as i32;
        let mut info = 0i32;
        unsafe {
            // Our row-major lower triangle is, byte for byte, the upper triangle
            // of the column-major image of this (symmetric) matrix's transpose,
            // which equals itself -- so we ask LAPACK for the upper triangle.
            lapack::dpotrf(b'U', n, &mut self.data, n, &mut info);
        }
        Ok(info == 0)
    }

    /// Computes the inverse of a matrix previously factored by `potrf_lower`,
    /// storing it into the lower triangle. Returns `false` on failure.
    pub fn potri_lower(&mut self) -> Result<bool, MatrixError> {
        if self.height != self.width {
            return Err(MatrixError::NotSquare { height: self.height, width: self.width });
        }
        let n = self.height as i32;
        let mut info = 0i32;
        unsafe {
            lapack::dpotri(b'U', n, &mut self.data, n, &mut info);
        }
        Ok(info == 0)
    }

    /// Composes `potrf_lower` and `potri_lower`: computes the inverse in place
    /// (mirrored into both triangles) and returns `2*sum(log(diag(L)))`. Returns
    /// `None` precisely when the matrix is not positive-definite.
    pub fn invert(&mut self) -> Result<Option<f64>, MatrixError> {
        let n = self.height;
        if !self.potrf_lower()? {
            return Ok(None);
        }
        let mut log_det = 0.0;
        for i in 0..n {
            log_det += 2.0 * self.get(i, i).ln();
        }
        if !self.potri_lower()? {
            return Ok(None);
        }
        self.copy_lower_to_upper()?;
        Ok(Some(log_det))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn gemm_matches_textbook_product() {
        let a = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = Matrix::from_vec(3, 2, vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
        let mut c = Matrix::new(2, 2);
        Matrix::gemm(&a, &b, &mut c, 1.0, 0.0).unwrap();
        assert_eq!(c.data(), &[58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn potrf_and_invert_round_trip() {
        // Scenario 2 from the testable-properties: A = L L^T with diag(L) = (2,1,3).
        let mut a = Matrix::from_vec(3, 3, vec![
            4.0, 12.0, -16.0,
            12.0, 37.0, -43.0,
            -16.0, -43.0, 98.0,
        ]);
        assert!(a.potrf_lower().unwrap());
        assert!((a.get(0, 0) - 2.0).abs() < 1e-9);
        assert!((a.get(1, 1) - 1.0).abs() < 1e-9);
        assert!((a.get(2, 2) - 3.0).abs() < 1e-9);

        let mut b = Matrix::from_vec(3, 3, vec![
            4.0, 12.0, -16.0,
            12.0, 37.0, -43.0,
            -16.0, -43.0, 98.0,
        ]);
        let log_det = b.invert().unwrap().expect("SPD matrix must invert");
        let expected = 2.0 * (2.0f64.ln() + 1.0f64.ln() + 3.0f64.ln());
        assert!((log_det - expected).abs() < 1e-9);

        let a_orig = Matrix::from_vec(3, 3, vec![
            4.0, 12.0, -16.0,
            12.0, 37.0, -43.0,
            -16.0, -43.0, 98.0,
        ]);
        let mut identity = Matrix::new(3, 3);
        Matrix::gemm(&a_orig, &b, &mut identity, 1.0, 0.0).unwrap();
        for r in 0..3 {
            for c in 0..3 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert!((identity.get(r, c) - expected).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn gesv_solves_linear_system() {
        let mut a = Matrix::from_vec(2, 2, vec![2.0, 1.0, 1.0, 3.0]);
        let mut b = Matrix::from_vec(2, 1, vec![5.0, 10.0]);
        Matrix::gesv(&mut a, &mut b).unwrap();
        assert!((b.get(0, 0) - 1.0).abs() < 1e-9);
        assert!((b.get(1, 0) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn renormalize_row_sums_to_one() {
        let mut q = Matrix::from_vec(1, 3, vec![0.2, 0.3, 0.3]);
        q.renormalize_row(0);
        assert!((q.row_sum(0) - 1.0).abs() < 1e-12);
    }
}
