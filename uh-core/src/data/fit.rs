//! Polynomial compensation
//!
//! Fits a least-squares correction polynomial through a validated
//! [`CalibrationSet`] and applies it to raw readings.
//!
//! # How It Works
//!
//! 1. **Fit**: builds the normal equations `(XᵀX) c = Xᵀy` for the
//!    Vandermonde matrix of the measured values and solves them with
//!    Gaussian elimination and partial pivoting.
//!
//! 2. **Evaluate**: Horner's method over the coefficients.
//!
//! 3. **Apply**: optionally clamps to the range of true values seen during
//!    calibration, then rounds to the configured precision.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::calibration;
use crate::data::types::CalibrationSet;
use crate::error::{Result, UpsHatError};

/// Correction polynomial, coefficients ordered from the constant term up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Least-squares fit of `true_value` as a function of `measured`
    pub fn fit(set: &CalibrationSet) -> Result<Self> {
        let degree = set.degree();
        let n = usize::from(degree) + 1;

        // Power sums Σxᵏ for k in 0..2n-1 fill the symmetric matrix XᵀX
        let mut power_sums = vec![0.0_f64; 2 * n - 1];
        let mut rhs = vec![0.0_f64; n];
        for point in set.points() {
            let mut x_pow = 1.0;
            for (k, sum) in power_sums.iter_mut().enumerate() {
                *sum += x_pow;
                if k < n {
                    rhs[k] += x_pow * point.true_value;
                }
                x_pow *= point.measured;
            }
        }

        let mut matrix: Vec<Vec<f64>> = (0..n)
            .map(|row| power_sums[row..row + n].to_vec())
            .collect();

        let coefficients = solve(&mut matrix, &mut rhs).ok_or(UpsHatError::SingularFit { degree })?;
        debug!("fitted degree {} polynomial: {:?}", degree, coefficients);
        Ok(Self { coefficients })
    }

    /// Evaluate at `x`
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * x + c)
    }
}

/// Gaussian elimination with partial pivoting, consuming the system in place
fn solve(matrix: &mut [Vec<f64>], rhs: &mut [f64]) -> Option<Vec<f64>> {
    let n = rhs.len();

    for col in 0..n {
        let pivot = (col..n).max_by(|&a, &b| {
            matrix[a][col]
                .abs()
                .partial_cmp(&matrix[b][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;

        let scale = matrix.iter().map(|row| row[col].abs()).fold(0.0, f64::max);
        if !matrix[pivot][col].is_finite()
            || matrix[pivot][col].abs() <= calibration::SINGULAR_EPSILON * scale.max(1.0)
        {
            return None;
        }

        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        let pivot_row = matrix[col].clone();
        let pivot_rhs = rhs[col];
        for row in col + 1..n {
            let factor = matrix[row][col] / pivot_row[col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                matrix[row][k] -= factor * pivot_row[k];
            }
            rhs[row] -= factor * pivot_rhs;
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| matrix[row][k] * solution[k]).sum();
        solution[row] = (rhs[row] - tail) / matrix[row][row];
    }

    solution.iter().all(|c| c.is_finite()).then_some(solution)
}

/// How a fitted polynomial is applied to readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationSettings {
    /// Decimal places kept in the output
    pub precision: u32,
    /// Never go below the smallest calibrated true value
    pub lower_limit: bool,
    /// Never go above the largest calibrated true value
    pub upper_limit: bool,
}

impl Default for CompensationSettings {
    fn default() -> Self {
        Self {
            precision: calibration::DEFAULT_PRECISION,
            lower_limit: false,
            upper_limit: false,
        }
    }
}

/// A fitted polynomial ready to correct raw readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compensation {
    polynomial: Polynomial,
    precision: u32,
    min_output: Option<f64>,
    max_output: Option<f64>,
}

impl Compensation {
    /// Fit the set and record the output limits it implies
    pub fn new(set: &CalibrationSet, settings: CompensationSettings) -> Result<Self> {
        let polynomial = Polynomial::fit(set)?;
        let (lo, hi) = set.true_value_bounds();

        Ok(Self {
            polynomial,
            precision: settings.precision.min(calibration::MAX_PRECISION),
            min_output: settings.lower_limit.then_some(lo),
            max_output: settings.upper_limit.then_some(hi),
        })
    }

    pub fn polynomial(&self) -> &Polynomial {
        &self.polynomial
    }

    /// Correct a raw reading
    pub fn apply(&self, raw: f64) -> f64 {
        let mut value = self.polynomial.evaluate(raw);
        if let Some(min) = self.min_output {
            value = value.max(min);
        }
        if let Some(max) = self.max_output {
            value = value.min(max);
        }
        round_to(value, self.precision)
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
