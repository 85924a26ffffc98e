use shelfwatch_sales::SalesEvent;

use crate::result::AiError;

/// Number of regression features per observation.
pub const FEATURE_COUNT: usize = 5;

/// Regression features for one observation:
/// day-of-week, stock, discount, holiday flag, activity flag.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FeatureRow {
    pub day_of_week: f64,
    pub stock: f64,
    pub discount_pct: f64,
    pub holiday: f64,
    pub activity: f64,
}

impl FeatureRow {
    pub fn from_sale(sale: &SalesEvent) -> Self {
        Self {
            day_of_week: sale.day_of_week() as f64,
            stock: sale.stock as f64,
            discount_pct: sale.discount_pct as f64,
            holiday: if sale.holiday { 1.0 } else { 0.0 },
            activity: if sale.activity { 1.0 } else { 0.0 },
        }
    }

    /// Same features on another day of the week (0..=6).
    pub fn on_day(mut self, day_of_week: u32) -> Self {
        self.day_of_week = (day_of_week % 7) as f64;
        self
    }

    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.day_of_week,
            self.stock,
            self.discount_pct,
            self.holiday,
            self.activity,
        ]
    }
}

/// Fitted linear model: `y = intercept + Σ weights[i] * x[i]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LinearModel {
    pub intercept: f64,
    pub weights: [f64; FEATURE_COUNT],
}

impl LinearModel {
    pub fn predict(&self, row: &FeatureRow) -> f64 {
        self.intercept
            + row
                .to_array()
                .iter()
                .zip(self.weights.iter())
                .map(|(x, w)| x * w)
                .sum::<f64>()
    }
}

/// Per-group regression of units sold on [`FeatureRow`]s.
pub trait Regressor: Send + Sync + 'static {
    fn fit(&self, rows: &[FeatureRow], targets: &[f64]) -> Result<LinearModel, AiError>;
}

/// Ridge regression with an unpenalised intercept.
///
/// Features and targets are centred, then `(XᵀX + λI) w = Xᵀy` is solved by
/// Gaussian elimination with partial pivoting.
#[derive(Debug, Copy, Clone)]
pub struct RidgeRegressor {
    lambda: f64,
}

impl RidgeRegressor {
    pub fn new(lambda: f64) -> Self {
        Self { lambda }
    }
}

impl Default for RidgeRegressor {
    fn default() -> Self {
        Self { lambda: 1.0 }
    }
}

impl Regressor for RidgeRegressor {
    fn fit(&self, rows: &[FeatureRow], targets: &[f64]) -> Result<LinearModel, AiError> {
        if rows.is_empty() {
            return Err(AiError::model_fit("no observations"));
        }
        if rows.len() != targets.len() {
            return Err(AiError::model_fit(format!(
                "row/target length mismatch ({} vs {})",
                rows.len(),
                targets.len()
            )));
        }
        if !(self.lambda.is_finite() && self.lambda >= 0.0) {
            return Err(AiError::model_fit("lambda must be finite and non-negative"));
        }

        let xs: Vec<[f64; FEATURE_COUNT]> = rows.iter().map(FeatureRow::to_array).collect();
        if xs.iter().flatten().chain(targets.iter()).any(|v| !v.is_finite()) {
            return Err(AiError::model_fit("non-finite observation"));
        }

        let n = xs.len() as f64;
        let mut x_mean = [0.0; FEATURE_COUNT];
        for x in &xs {
            for (m, v) in x_mean.iter_mut().zip(x) {
                *m += v / n;
            }
        }
        let y_mean = targets.iter().sum::<f64>() / n;

        // Normal equations on centred data.
        let mut a = [[0.0; FEATURE_COUNT]; FEATURE_COUNT];
        let mut b = [0.0; FEATURE_COUNT];
        for (x, y) in xs.iter().zip(targets) {
            let yc = y - y_mean;
            for i in 0..FEATURE_COUNT {
                let xi = x[i] - x_mean[i];
                b[i] += xi * yc;
                for j in 0..FEATURE_COUNT {
                    a[i][j] += xi * (x[j] - x_mean[j]);
                }
            }
        }
        for (i, row) in a.iter_mut().enumerate() {
            row[i] += self.lambda;
        }

        let weights = solve(a, b)?;
        let intercept = y_mean
            - weights
                .iter()
                .zip(x_mean.iter())
                .map(|(w, m)| w * m)
                .sum::<f64>();

        if !intercept.is_finite() {
            return Err(AiError::model_fit("non-finite intercept"));
        }

        Ok(LinearModel { intercept, weights })
    }
}

/// Solve `a · x = b` for a small dense system.
fn solve(
    mut a: [[f64; FEATURE_COUNT]; FEATURE_COUNT],
    mut b: [f64; FEATURE_COUNT],
) -> Result<[f64; FEATURE_COUNT], AiError> {
    const PIVOT_EPSILON: f64 = 1e-12;

    for col in 0..FEATURE_COUNT {
        let pivot = (col..FEATURE_COUNT)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);

        if a[pivot][col].abs() < PIVOT_EPSILON {
            return Err(AiError::model_fit("singular normal equations"));
        }

        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..FEATURE_COUNT {
            let factor = a[row][col] / a[col][col];
            for k in col..FEATURE_COUNT {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; FEATURE_COUNT];
    for row in (0..FEATURE_COUNT).rev() {
        let tail: f64 = ((row + 1)..FEATURE_COUNT).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(AiError::model_fit("non-finite coefficients"));
    }
    Ok(x)
}
