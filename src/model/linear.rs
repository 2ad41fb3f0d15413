//! Ordinary least squares via the normal equations, solved by Gaussian
//! elimination with partial pivoting. A tiny ridge term keeps the system
//! solvable when one-hot columns make the design matrix rank-deficient.
//!
//! The trainer standardizes features before handing them here; the fitted
//! coefficients therefore live in standardized space.

const RIDGE: f64 = 1e-8;

#[derive(Debug, Clone)]
pub struct LinearRegression {
    /// Coefficients per feature, plus the intercept last.
    coefficients: Vec<f64>,
}

impl LinearRegression {
    pub fn fit(rows: &[Vec<f64>], targets: &[f64]) -> Self {
        let d = rows.first().map_or(0, Vec::len) + 1; // + intercept

        // Build X'X and X'y over the intercept-augmented design.
        let mut xtx = vec![vec![0.0; d]; d];
        let mut xty = vec![0.0; d];
        let mut aug = vec![0.0; d];
        for (row, &y) in rows.iter().zip(targets) {
            aug[..d - 1].copy_from_slice(row);
            aug[d - 1] = 1.0;
            for j in 0..d {
                xty[j] += aug[j] * y;
                for k in j..d {
                    xtx[j][k] += aug[j] * aug[k];
                }
            }
        }
        for j in 0..d {
            for k in 0..j {
                xtx[j][k] = xtx[k][j];
            }
            xtx[j][j] += RIDGE;
        }

        let coefficients = solve(xtx, xty);
        Self { coefficients }
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let d = self.coefficients.len();
        let mut y = self.coefficients[d - 1];
        for (c, x) in self.coefficients[..d - 1].iter().zip(row) {
            y += c * x;
        }
        y
    }
}

/// In-place Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Vec<f64> {
    let d = b.len();
    for col in 0..d {
        let pivot = (col..d)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        a.swap(col, pivot);
        b.swap(col, pivot);

        let lead = a[col][col];
        if lead.abs() < 1e-12 {
            continue; // ridge term makes this unreachable in practice
        }
        for row in col + 1..d {
            let factor = a[row][col] / lead;
            if factor == 0.0 {
                continue;
            }
            for k in col..d {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; d];
    for col in (0..d).rev() {
        let mut acc = b[col];
        for k in col + 1..d {
            acc -= a[col][k] * x[k];
        }
        x[col] = if a[col][col].abs() < 1e-12 { 0.0 } else { acc / a[col][col] };
    }
    x
}
