//! Linear model implementations

use super::decision_tree::argmax;
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};

/// Solve the symmetric system `a x = b` by Cholesky decomposition.
///
/// Returns `None` when `a` is not numerically positive definite.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    let max_diag = a.diag().iter().fold(0.0f64, |m, v| m.max(v.abs()));
    let floor = 1e-12 * max_diag.max(f64::MIN_POSITIVE);

    // A = L * L^T
    let mut l = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= floor {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L * y = b
    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // L^T * x = y
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Gauss-Jordan elimination with partial pivoting (fallback)
fn gauss_jordan_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut aug = Array2::zeros((n, n + 1));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        aug[[i, n]] = b[i];
    }

    for col in 0..n {
        let max_row = (col..n)
            .max_by(|&r1, &r2| aug[[r1, col]].abs().total_cmp(&aug[[r2, col]].abs()))
            .unwrap_or(col);
        if max_row != col {
            for j in 0..=n {
                aug.swap([col, j], [max_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        if pivot.abs() < 1e-10 {
            return None;
        }
        for j in 0..=n {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                for j in 0..=n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    Some(aug.column(n).to_owned())
}

/// Solve least squares via normal equations: (X^T X) w = X^T y.
///
/// Rank-deficient systems (constant or collinear columns, which one-hot
/// encoding produces routinely) are retried with a vanishing ridge term.
fn solve_least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Option<Array1<f64>> {
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);

    if let Some(result) = cholesky_solve(&xtx, &xty) {
        return Some(result);
    }

    let n = xtx.nrows();
    let mean_diag = (xtx.diag().iter().map(|v| v.abs()).sum::<f64>() / n.max(1) as f64).max(1.0);
    for ridge in [1e-10, 1e-8, 1e-6] {
        let mut regularized = xtx.clone();
        for k in 0..n {
            regularized[[k, k]] += ridge * mean_diag;
        }
        if let Some(result) = cholesky_solve(&regularized, &xty) {
            return Some(result);
        }
    }

    gauss_jordan_solve(&xtx, &xty)
}

/// Column means and standard deviations, zero deviations replaced by one
fn column_scaling(x: &Array2<f64>) -> (Array1<f64>, Array1<f64>) {
    let mean = x
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(x.ncols()));
    let scale = x
        .std_axis(Axis(0), 0.0)
        .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });
    (mean, scale)
}

fn check_shapes(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(PipelineError::training(format!(
            "x has {} rows but y has {} values",
            x.nrows(),
            y.len()
        )));
    }
    if x.nrows() == 0 {
        return Err(PipelineError::training("cannot fit on zero samples"));
    }
    Ok(())
}

/// Ordinary least squares regression
#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: Option<f64>,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit with an intercept on centered data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_shapes(x, y)?;

        let x_mean = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(x.ncols()));
        let y_mean = y.mean().unwrap_or(0.0);
        let x_centered = x - &x_mean.view().insert_axis(Axis(0));
        let y_centered = y - y_mean;

        let coefficients = solve_least_squares(&x_centered, &y_centered)
            .ok_or_else(|| PipelineError::training("matrix is singular, cannot solve least squares"))?;

        self.intercept = Some(y_mean - coefficients.dot(&x_mean));
        self.coefficients = Some(coefficients);
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (coefficients, intercept) = match (&self.coefficients, self.intercept) {
            (Some(c), Some(i)) => (c, i),
            _ => return Err(PipelineError::training("linear regression is not fitted")),
        };
        if x.ncols() != coefficients.len() {
            return Err(PipelineError::training(format!(
                "expected {} features, got {}",
                coefficients.len(),
                x.ncols()
            )));
        }
        Ok(x.dot(coefficients) + intercept)
    }
}

/// Multinomial logistic regression with L2 penalty.
///
/// Features are standardized internally; targets are class indices.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    /// Weights, one column per class
    pub coefficients: Option<Array2<f64>>,
    pub intercepts: Option<Array1<f64>>,
    /// L2 strength applied to the mean loss; defaults to `1 / n_samples`
    pub alpha: Option<f64>,
    pub max_iter: usize,
    pub tol: f64,
    feature_mean: Array1<f64>,
    feature_scale: Array1<f64>,
    n_classes: usize,
    n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercepts: None,
            alpha: None,
            max_iter: 200,
            tol: 1e-6,
            feature_mean: Array1::zeros(0),
            feature_scale: Array1::zeros(0),
            n_classes: 0,
            n_iter: 0,
        }
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Row-wise softmax, shifted by the row max for stability
    fn softmax(mut z: Array2<f64>) -> Array2<f64> {
        for mut row in z.outer_iter_mut() {
            let max = row.iter().fold(f64::NEG_INFINITY, |m, &v| m.max(v));
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row.mapv_inplace(|v| v / sum);
        }
        z
    }

    fn standardize(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.feature_mean.view().insert_axis(Axis(0)))
            / &self.feature_scale.view().insert_axis(Axis(0))
    }

    /// Fit by full-batch gradient descent on the cross-entropy loss
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_shapes(x, y)?;
        if y.iter().any(|&v| v < 0.0 || v.fract() != 0.0) {
            return Err(PipelineError::training("class labels must be non-negative integers"));
        }

        let n_samples = x.nrows();
        let n_features = x.ncols();
        let n_classes = (y.iter().fold(0.0f64, |a, &b| a.max(b)) as usize + 1).max(2);

        let (mean, scale) = column_scaling(x);
        self.feature_mean = mean;
        self.feature_scale = scale;
        self.n_classes = n_classes;
        let xs = self.standardize(x);

        let mut targets = Array2::<f64>::zeros((n_samples, n_classes));
        for (i, &label) in y.iter().enumerate() {
            targets[[i, label as usize]] = 1.0;
        }

        let alpha = self.alpha.unwrap_or(1.0 / n_samples as f64);
        // Standardized columns bound the loss curvature by roughly n_features / 2
        let lr = 1.0 / (1.0 + 0.5 * n_features as f64 + alpha);

        let mut weights = Array2::<f64>::zeros((n_features, n_classes));
        let mut bias = Array1::<f64>::zeros(n_classes);
        self.n_iter = 0;

        for _ in 0..self.max_iter {
            self.n_iter += 1;
            let proba = Self::softmax(xs.dot(&weights) + &bias);
            let errors = proba - &targets;

            let dw = xs.t().dot(&errors) / n_samples as f64 + alpha * &weights;
            let db = errors.sum_axis(Axis(0)) / n_samples as f64;

            let grad_norm = (dw.mapv(|v| v * v).sum() + db.mapv(|v| v * v).sum()).sqrt();
            if !grad_norm.is_finite() {
                return Err(PipelineError::training("logistic regression diverged"));
            }
            if grad_norm < self.tol {
                break;
            }

            weights = weights - lr * dw;
            bias = bias - lr * db;
        }

        self.coefficients = Some(weights);
        self.intercepts = Some(bias);
        Ok(self)
    }

    /// Class probabilities, one row per sample
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (weights, bias) = match (&self.coefficients, &self.intercepts) {
            (Some(w), Some(b)) => (w, b),
            _ => return Err(PipelineError::training("logistic regression is not fitted")),
        };
        if x.ncols() != weights.nrows() {
            return Err(PipelineError::training(format!(
                "expected {} features, got {}",
                weights.nrows(),
                x.ncols()
            )));
        }
        Ok(Self::softmax(self.standardize(x).dot(weights) + bias))
    }

    /// Predict class indices
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .outer_iter()
            .map(|row| argmax(row.iter().copied()) as f64)
            .collect())
    }

    /// Iterations run by the last fit
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_linear_regression_recovers_line() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![3.0, 5.0, 7.0, 9.0, 11.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients.as_ref().unwrap();
        assert!((coef[0] - 2.0).abs() < 1e-9);
        assert!((model.intercept.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_regression_with_collinear_columns() {
        // Indicator columns that always sum to one
        let x = array![[1.0, 0.0, 1.0], [0.0, 1.0, 2.0], [1.0, 0.0, 3.0], [0.0, 1.0, 4.0]];
        let y = array![2.0, 5.0, 4.0, 7.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        for (p, a) in predictions.iter().zip(y.iter()) {
            assert!((p - a).abs() < 1e-4, "prediction {} vs {}", p, a);
        }
    }

    #[test]
    fn test_linear_regression_constant_column() {
        let x = array![[1.0, 7.0], [2.0, 7.0], [3.0, 7.0]];
        let y = array![1.0, 2.0, 3.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let predictions = model.predict(&array![[4.0, 7.0]]).unwrap();
        assert!((predictions[0] - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_logistic_binary() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [7.0], [8.0], [9.0], [10.0]];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];

        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();

        assert_eq!(model.predict(&x).unwrap(), y);
        let proba = model.predict_proba(&array![[-5.0], [15.0]]).unwrap();
        assert!(proba[[0, 0]] > 0.9);
        assert!(proba[[1, 1]] > 0.9);
    }

    #[test]
    fn test_logistic_multiclass() {
        let x = array![
            [0.0, 0.0], [0.5, 0.2], [0.2, 0.4],
            [5.0, 0.0], [5.5, 0.3], [5.2, 0.1],
            [0.0, 5.0], [0.3, 5.5], [0.1, 5.2],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0];

        let mut model = LogisticRegression::new().with_max_iter(500);
        model.fit(&x, &y).unwrap();

        assert_eq!(model.n_classes(), 3);
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_logistic_iteration_cap() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 1.0, 0.0, 1.0];

        let mut model = LogisticRegression::new().with_max_iter(5);
        model.fit(&x, &y).unwrap();
        assert!(model.n_iter() <= 5);
    }

    #[test]
    fn test_unfitted_models() {
        assert!(LinearRegression::new().predict(&array![[1.0]]).is_err());
        assert!(LogisticRegression::new().predict(&array![[1.0]]).is_err());
    }
}
