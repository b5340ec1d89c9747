use rand::prelude::*;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;
use std::ops::{Add, Mul};

use crate::error::{Result, SoftmaxError};

/// Dense row-major matrix of `f64`, one `Vec` per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // Both draws on (0, 1] so ln() never sees zero.
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Gaussian samples from N(0, std_dev^2).
    ///
    /// Classifier weights are initialised with a small `std_dev` (1e-3) so the
    /// initial softmax is close to uniform and the loss starts near ln(C).
    pub fn gaussian_with<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        std_dev: f64,
        rng: &mut R,
    ) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = Matrix::sample_standard_normal(rng) * std_dev;
            }
        }
        res
    }

    /// Builds a matrix from rows. Panics on ragged input; use
    /// [`Matrix::try_from_data`] for untrusted data.
    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        match Matrix::try_from_data(data) {
            Ok(m) => m,
            Err(e) => panic!("{e}"),
        }
    }

    /// Builds a matrix from rows, rejecting rows of unequal length.
    /// An empty `data` yields a 0x0 matrix.
    pub fn try_from_data(data: Vec<Vec<f64>>) -> Result<Matrix> {
        let cols = data.first().map_or(0, Vec::len);
        if let Some((row, r)) = data.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(SoftmaxError::RaggedRows { row, expected: cols, found: r.len() });
        }
        Ok(Matrix {
            rows: data.len(),
            cols,
            data
        })
    }

    /// Builds a matrix from a declared `rows` x `cols` header and its data,
    /// as read back from a file. Unlike [`Matrix::try_from_data`] the column
    /// count survives when there are no rows, so a (0, C) matrix stays (0, C).
    pub fn try_from_parts(rows: usize, cols: usize, data: Vec<Vec<f64>>) -> Result<Matrix> {
        if data.len() != rows {
            return Err(SoftmaxError::RowCountMismatch { declared: rows, found: data.len() });
        }
        if let Some((row, r)) = data.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(SoftmaxError::RaggedRows { row, expected: cols, found: r.len() });
        }
        Ok(Matrix { rows, cols, data })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i]
    }

    /// Reads `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i][j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i][j] = value;
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect()
        }
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    /// Largest entry of every row. A row with no columns yields `-inf`.
    pub fn row_max(&self) -> Vec<f64> {
        self.data.iter()
            .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .collect()
    }

    /// Sum of every row.
    pub fn row_sums(&self) -> Vec<f64> {
        self.data.iter().map(|row| row.iter().sum()).collect()
    }

    /// Subtracts `column[i]` from every entry of row `i`, i.e. broadcasts an
    /// (rows, 1) column across all columns.
    pub fn sub_column(&self, column: &[f64]) -> Matrix {
        assert_eq!(column.len(), self.rows, "column length must equal row count");
        self.zip_column(column, |x, c| x - c)
    }

    /// Divides every entry of row `i` by `column[i]`, broadcasting as (rows, 1).
    pub fn div_column(&self, column: &[f64]) -> Matrix {
        assert_eq!(column.len(), self.rows, "column length must equal row count");
        self.zip_column(column, |x, c| x / c)
    }

    fn zip_column<F>(&self, column: &[f64], op: F) -> Matrix
    where
        F: Fn(f64, f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(column)
                .map(|(row, &c)| row.iter().map(|&x| op(x, c)).collect())
                .collect()
        }
    }

    /// Picks entry `(i, indices[i])` from every row.
    pub fn gather(&self, indices: &[usize]) -> Vec<f64> {
        assert_eq!(indices.len(), self.rows, "one index per row required");
        self.data.iter().zip(indices).map(|(row, &j)| row[j]).collect()
    }

    /// Subtracts `value` from entry `(i, indices[i])` of every row in place.
    /// With `value = 1.0` this is `self - one_hot(indices)`.
    pub fn sub_at(&mut self, indices: &[usize], value: f64) {
        assert_eq!(indices.len(), self.rows, "one index per row required");
        for (row, &j) in self.data.iter_mut().zip(indices) {
            row[j] -= value;
        }
    }

    /// Sum of squared entries (squared Frobenius norm).
    pub fn sum_squares(&self) -> f64 {
        self.data.iter().flatten().map(|x| x * x).sum()
    }

    /// Largest absolute entry-wise difference between two same-shape matrices.
    pub fn max_abs_diff(&self, other: &Matrix) -> f64 {
        assert_eq!(self.shape(), other.shape(), "Matrices are of incorrect sizes");
        self.data.iter().flatten()
            .zip(other.data.iter().flatten())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    /// Column index of the largest entry in each row; ties go to the lowest index.
    pub fn argmax_rows(&self) -> Vec<usize> {
        self.data.iter()
            .map(|row| {
                let mut best = 0;
                for (j, &v) in row.iter().enumerate() {
                    if v > row[best] {
                        best = j;
                    }
                }
                best
            })
            .collect()
    }

    /// Subset of rows, in the order given.
    pub fn select_rows(&self, indices: &[usize]) -> Matrix {
        Matrix {
            rows: indices.len(),
            cols: self.cols,
            data: indices.iter().map(|&i| self.data[i].clone()).collect()
        }
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().flatten().all(|x| x.is_finite())
    }
}

impl Add for &Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, self.cols);

        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[i][j] = self.data[i][j] + rhs.data[i][j];
            }
        }

        res
    }
}

/// Matrix product.
impl Mul for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..res.rows {
            for k in 0..self.cols {
                let a = self.data[i][k];
                if a == 0.0 {
                    continue;
                }
                for j in 0..res.cols {
                    res.data[i][j] += a * rhs.data[k][j];
                }
            }
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn try_from_data_rejects_ragged_rows() {
        let err = Matrix::try_from_data(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(err, SoftmaxError::RaggedRows { row: 1, expected: 2, found: 1 });
    }

    #[test]
    fn try_from_parts_checks_header_against_data() {
        assert_eq!(
            Matrix::try_from_parts(2, 1, vec![vec![1.0]]).unwrap_err(),
            SoftmaxError::RowCountMismatch { declared: 2, found: 1 }
        );
        // Rows agree with each other but not with the declared width.
        assert_eq!(
            Matrix::try_from_parts(1, 2, vec![vec![1.0]]).unwrap_err(),
            SoftmaxError::RaggedRows { row: 0, expected: 2, found: 1 }
        );
        let m = Matrix::try_from_parts(2, 2, vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m, Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]));
    }

    #[test]
    fn try_from_parts_keeps_empty_dimensions() {
        assert_eq!(Matrix::try_from_parts(0, 3, vec![]).unwrap(), Matrix::zeros(0, 3));
        assert_eq!(Matrix::try_from_parts(2, 0, vec![vec![], vec![]]).unwrap(), Matrix::zeros(2, 0));
    }

    #[test]
    fn empty_data_is_zero_by_zero() {
        let m = Matrix::try_from_data(vec![]).unwrap();
        assert_eq!(m.shape(), (0, 0));
    }

    #[test]
    fn matmul_and_transpose() {
        let a = Matrix::from_data(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let b = a.transpose();
        assert_eq!(b.shape(), (3, 2));

        let c = &a * &b;
        assert_eq!(c.data, vec![vec![14.0, 32.0], vec![32.0, 77.0]]);
    }

    #[test]
    fn row_reductions() {
        let m = Matrix::from_data(vec![vec![1.0, -3.0, 2.0], vec![-1.0, -2.0, -0.5]]);
        assert_eq!(m.row_max(), vec![2.0, -0.5]);
        assert_eq!(m.row_sums(), vec![0.0, -3.5]);
        assert_eq!(m.argmax_rows(), vec![2, 2]);
    }

    #[test]
    fn argmax_ties_pick_lowest_index() {
        let m = Matrix::from_data(vec![vec![0.5, 0.5, 0.1]]);
        assert_eq!(m.argmax_rows(), vec![0]);
    }

    #[test]
    fn column_broadcasting() {
        let m = Matrix::from_data(vec![vec![2.0, 4.0], vec![9.0, 3.0]]);
        assert_eq!(m.sub_column(&[1.0, 3.0]).data, vec![vec![1.0, 3.0], vec![6.0, 0.0]]);
        assert_eq!(m.div_column(&[2.0, 3.0]).data, vec![vec![1.0, 2.0], vec![3.0, 1.0]]);
    }

    #[test]
    fn gather_and_sub_at_use_one_index_per_row() {
        let mut m = Matrix::from_data(vec![vec![0.2, 0.8], vec![0.6, 0.4]]);
        assert_eq!(m.gather(&[1, 0]), vec![0.8, 0.6]);

        m.sub_at(&[1, 0], 1.0);
        assert_relative_eq!(m.get(0, 1), -0.2, epsilon = 1e-12);
        assert_relative_eq!(m.get(1, 0), -0.4, epsilon = 1e-12);
        assert_eq!(m.get(0, 0), 0.2);
    }

    #[test]
    fn sum_squares_and_max_abs_diff() {
        let a = Matrix::from_data(vec![vec![1.0, -2.0], vec![0.0, 3.0]]);
        let b = Matrix::from_data(vec![vec![1.5, -2.0], vec![0.0, 1.0]]);
        assert_eq!(a.sum_squares(), 14.0);
        assert_eq!(a.max_abs_diff(&b), 2.0);
    }

    #[test]
    fn gaussian_is_reproducible_with_seed() {
        let a = Matrix::gaussian_with(3, 4, 0.1, &mut StdRng::seed_from_u64(7));
        let b = Matrix::gaussian_with(3, 4, 0.1, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(a.is_finite());
    }

    #[test]
    #[should_panic(expected = "incorrect sizes")]
    fn add_panics_on_shape_mismatch() {
        let _ = &Matrix::zeros(2, 2) + &Matrix::zeros(2, 3);
    }
}
