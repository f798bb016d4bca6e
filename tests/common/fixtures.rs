// Test fixtures and data generators for integration tests

use loan_predictor::compute::{GradientBoostingClassifier, RegressionTree};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

/// Index of `income_to_loan_ratio` in the feature vector.
pub const INCOME_TO_LOAN: usize = 1;

/// Index of `emp_length_missing` in the feature vector.
pub const EMP_LENGTH_MISSING: usize = 8;

/// Model predicting `1` exactly when `income_to_loan_ratio <= 3`.
pub fn income_threshold_model() -> GradientBoostingClassifier {
    GradientBoostingClassifier::new(
        [0, 1],
        1.0,
        0.0,
        vec![RegressionTree::stump(INCOME_TO_LOAN, 3.0, 2.0, -2.0)],
    )
}

/// Two-stage model where a missing employment length tips borderline applicants.
pub fn layered_model() -> GradientBoostingClassifier {
    GradientBoostingClassifier::new(
        [0, 1],
        0.5,
        -0.5,
        vec![
            RegressionTree::stump(INCOME_TO_LOAN, 3.0, 1.0, -1.0),
            RegressionTree::stump(EMP_LENGTH_MISSING, 0.5, -0.5, 0.5),
        ],
    )
}

/// A complete, valid request with the given income-to-loan ratio.
pub fn loan_request(annual_income: f64, loan_amount: f64) -> Value {
    json!({
        "loan_amount_requested": loan_amount,
        "existing_debt_or_other_payments": 2000,
        "annual_income": annual_income,
        "monthly_income": annual_income / 12.0,
        "total_outstanding_debt": 1500,
        "recoveries": 0,
        "total_rec_int": 250.5,
        "total_current_balance": 3200,
        "total_credit_limit": 15000,
        "batch_enrolled": 4,
        "emp_length": 3
    })
}

/// Low-risk applicant: income is six times the loan.
pub fn low_risk_request() -> Value {
    loan_request(60000.0, 10000.0)
}

/// High-risk applicant: income is twice the loan.
pub fn high_risk_request() -> Value {
    loan_request(20000.0, 10000.0)
}

/// Deterministic random request generator for reproducible tests
pub struct RequestGenerator {
    rng: StdRng,
}

impl RequestGenerator {
    /// Creates a new generator with a fixed seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generates a valid request with strictly positive denominators.
    pub fn valid_request(&mut self) -> Value {
        let mut request = json!({
            "loan_amount_requested": self.rng.gen_range(500.0..50_000.0),
            "existing_debt_or_other_payments": self.rng.gen_range(0.0..20_000.0),
            "annual_income": self.rng.gen_range(10_000.0..250_000.0),
            "monthly_income": self.rng.gen_range(800.0..20_000.0),
            "total_outstanding_debt": self.rng.gen_range(0.0..80_000.0),
            "recoveries": self.rng.gen_range(0.0..5_000.0),
            "total_rec_int": self.rng.gen_range(0..10_000),
            "total_current_balance": self.rng.gen_range(0..200_000),
            "total_credit_limit": self.rng.gen_range(1_000..300_000),
            "batch_enrolled": self.rng.gen_range(1..50)
        });

        if self.rng.gen_bool(0.5) {
            request["emp_length"] = json!(self.rng.gen_range(0..11));
        }
        request
    }
}

impl Default for RequestGenerator {
    fn default() -> Self {
        Self::new(42)
    }
}
