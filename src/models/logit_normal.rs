use super::{log_sigmoid, logsumexp, sigmoid};
use crate::distributions::LogDensityModel;
use crate::error::{HmcError, Result};
use ndarray::{s, Array1, Array2, ArrayView1};

/// A hierarchical logistic-normal model for a table of multinomial counts.
///
/// Rows `r` are groups, columns `j` are categories. Each row's category probabilities
/// are `softmax(eta_r)`, with `eta_rj ~ N(zeta_j, tau^2)` around shared column effects
/// `zeta_j`. Each `zeta_j` carries the prior `sigmoid(zeta)^a * sigmoid(-zeta)^b`,
/// i.e. a Beta(a, b) prior on `sigmoid(zeta_j)` with its Jacobian.
///
/// The parameter vector is `[zeta (C), eta (R * C, row-major)]`.
///
/// The counts are given in sparse form, `counts[k]` observations in row `i_vec[k]` and
/// column `j_vec[k]`. They are aggregated into a dense table at construction, so the
/// model owns its data.
#[derive(Debug, Clone, PartialEq)]
pub struct LogitNormal {
    table: Array2<f64>,      // n_rows x n_cols
    row_totals: Array1<f64>, // n_rows
    tau: f64,
    a: f64,
    b: f64,
}

/// Rows and columns of the dense table, checked against [`LogitNormal::MAX_DIM`].
fn table_shape(i_vec: ArrayView1<usize>, j_vec: ArrayView1<usize>) -> Result<(usize, usize)> {
    let max_i = i_vec.iter().copied().max().unwrap_or(0);
    let max_j = j_vec.iter().copied().max().unwrap_or(0);
    let dim = max_i
        .checked_add(2)
        .zip(max_j.checked_add(1))
        .and_then(|(rows_plus_one, cols)| rows_plus_one.checked_mul(cols))
        .filter(|&dim| dim <= LogitNormal::MAX_DIM);
    match dim {
        Some(_) => Ok((max_i + 1, max_j + 1)),
        None => Err(HmcError::InvalidData(format!(
            "a {} x {} table exceeds {} parameters",
            max_i as u128 + 1,
            max_j as u128 + 1,
            LogitNormal::MAX_DIM
        ))),
    }
}

impl LogitNormal {
    pub const DEFAULT_SHAPE: (f64, f64) = (4.0, 1.0);
    /// Largest number of parameters, `C * (R + 1)`, a model may have.
    pub const MAX_DIM: usize = 1 << 26;

    /// Builds the model; the table has `max(i_vec) + 1` rows and `max(j_vec) + 1` columns.
    /// Repeated `(i, j)` cells are summed. Tables whose parameter count would exceed
    /// [`LogitNormal::MAX_DIM`] are rejected before anything is allocated.
    pub fn new(
        counts: ArrayView1<u64>,
        i_vec: ArrayView1<usize>,
        j_vec: ArrayView1<usize>,
        tau: f64,
    ) -> Result<Self> {
        if i_vec.len() != counts.len() {
            return Err(HmcError::ShapeMismatch {
                what: "row indices vs counts",
                expected: counts.len(),
                found: i_vec.len(),
            });
        }
        if j_vec.len() != counts.len() {
            return Err(HmcError::ShapeMismatch {
                what: "column indices vs counts",
                expected: counts.len(),
                found: j_vec.len(),
            });
        }
        if counts.is_empty() {
            return Err(HmcError::EmptyParameters);
        }
        if !(tau.is_finite() && tau > 0.0) {
            return Err(HmcError::InvalidData(format!(
                "tau must be finite and positive, got {tau}"
            )));
        }

        let (n_rows, n_cols) = table_shape(i_vec, j_vec)?;
        let mut table = Array2::<f64>::zeros((n_rows, n_cols));
        for ((&c, &i), &j) in counts.iter().zip(i_vec.iter()).zip(j_vec.iter()) {
            table[[i, j]] += c as f64;
        }
        let row_totals = table.sum_axis(ndarray::Axis(1));
        let (a, b) = Self::DEFAULT_SHAPE;

        Ok(Self {
            table,
            row_totals,
            tau,
            a,
            b,
        })
    }

    /// Replaces the Beta(a, b) shape of the column-effect prior.
    pub fn with_shape(mut self, a: f64, b: f64) -> Result<Self> {
        for (name, value) in [("a", a), ("b", b)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(HmcError::InvalidData(format!(
                    "prior shape {name} must be finite and positive, got {value}"
                )));
            }
        }
        self.a = a;
        self.b = b;
        Ok(self)
    }

    pub fn n_rows(&self) -> usize {
        self.table.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.table.ncols()
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    pub fn shape(&self) -> (f64, f64) {
        (self.a, self.b)
    }

    /// The aggregated count table.
    pub fn table(&self) -> &Array2<f64> {
        &self.table
    }

    /// Splits a parameter vector into the column effects and the row-by-column table of
    /// `eta`.
    pub fn split(&self, params: ArrayView1<f64>) -> (Array1<f64>, Array2<f64>) {
        let c = self.n_cols();
        let zeta = params.slice(s![..c]).to_owned();
        let eta = Array2::from_shape_fn((self.n_rows(), c), |(r, j)| params[c + r * c + j]);
        (zeta, eta)
    }

    /// Per-row category probabilities `softmax(eta_r)`.
    pub fn row_probabilities(&self, params: ArrayView1<f64>) -> Array2<f64> {
        let (_, mut eta) = self.split(params);
        for mut row in eta.rows_mut() {
            let lse = logsumexp(row.iter().copied());
            row.mapv_inplace(|e| (e - lse).exp());
        }
        eta
    }
}

impl LogDensityModel for LogitNormal {
    fn dim(&self) -> usize {
        self.n_cols() * (self.n_rows() + 1)
    }

    fn log_density(&self, params: ArrayView1<f64>) -> f64 {
        let c = self.n_cols();
        let inv_tau2 = 1.0 / (self.tau * self.tau);
        let zeta = params.slice(s![..c]);

        let mut lp: f64 = zeta
            .iter()
            .map(|&z| self.a * log_sigmoid(z) + self.b * log_sigmoid(-z))
            .sum();

        for r in 0..self.n_rows() {
            let eta = params.slice(s![c + r * c..c + (r + 1) * c]);
            let lse = logsumexp(eta.iter().copied());
            for j in 0..c {
                let d = eta[j] - zeta[j];
                lp -= 0.5 * d * d * inv_tau2;
                lp += self.table[[r, j]] * eta[j];
            }
            lp -= self.row_totals[r] * lse;
        }
        lp
    }

    fn gradient(&self, params: ArrayView1<f64>) -> Array1<f64> {
        let c = self.n_cols();
        let inv_tau2 = 1.0 / (self.tau * self.tau);
        let zeta = params.slice(s![..c]);
        let mut grad = Array1::<f64>::zeros(params.len());

        for j in 0..c {
            grad[j] = self.a * sigmoid(-zeta[j]) - self.b * sigmoid(zeta[j]);
        }
        for r in 0..self.n_rows() {
            let offset = c + r * c;
            let eta = params.slice(s![offset..offset + c]);
            let lse = logsumexp(eta.iter().copied());
            for j in 0..c {
                let d = (eta[j] - zeta[j]) * inv_tau2;
                grad[j] += d;
                grad[offset + j] =
                    -d + self.table[[r, j]] - self.row_totals[r] * (eta[j] - lse).exp();
            }
        }
        grad
    }
}
