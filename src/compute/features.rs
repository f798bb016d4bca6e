// Loan Applicant Feature Engineering

use crate::error::{FieldIssue, PredictorError, Result};
use serde::Serialize;
use serde_json::{Map, Value};

/// Number of engineered features fed to the classifier.
pub const FEATURE_COUNT: usize = 9;

/// Feature names in the order the classifier was trained on.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "total_payment",
    "income_to_loan_ratio",
    "dti_revol_util",
    "total_recovery",
    "balance_to_credit_ratio",
    "recoveries_to_balance_ratio",
    "batch_enrolled_to_total_rec_int",
    "loan_amnt_total_rec_int_ratio",
    "emp_length_missing",
];

/// Required numeric request fields, in validation order.
pub const REQUIRED_FIELDS: [&str; 10] = [
    "loan_amount_requested",
    "existing_debt_or_other_payments",
    "annual_income",
    "monthly_income",
    "total_outstanding_debt",
    "recoveries",
    "total_rec_int",
    "total_current_balance",
    "total_credit_limit",
    "batch_enrolled",
];

/// Optional field that only contributes a presence flag.
pub const PRESENCE_FIELD: &str = "emp_length";

/// Validated raw applicant attributes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoanApplication {
    pub loan_amount_requested: f64,
    pub existing_debt_or_other_payments: f64,
    pub annual_income: f64,
    pub monthly_income: f64,
    pub total_outstanding_debt: f64,
    pub recoveries: f64,
    pub total_rec_int: f64,
    pub total_current_balance: f64,
    pub total_credit_limit: f64,
    /// Divided as a number even though the name reads like a cohort code.
    pub batch_enrolled: f64,
    /// Whether `emp_length` was present and non-null
    pub has_emp_length: bool,
}

impl LoanApplication {
    /// Parses a raw request body.
    pub fn from_json_bytes(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| PredictorError::BadRequest(format!("body is not valid JSON: {}", e)))?;

        match value {
            Value::Object(fields) => Self::from_fields(&fields),
            other => Err(PredictorError::BadRequest(format!(
                "body must be a JSON object, got {}",
                describe(&other)
            ))),
        }
    }

    /// Validates every required field before any arithmetic.
    ///
    /// All problems are collected into a single [`PredictorError::InvalidFields`].
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self> {
        let mut values = [0.0f64; REQUIRED_FIELDS.len()];
        let mut issues = Vec::new();

        for (slot, name) in values.iter_mut().zip(REQUIRED_FIELDS) {
            match fields.get(name) {
                None | Some(Value::Null) => issues.push(FieldIssue::Missing(name)),
                Some(Value::Number(n)) => match n.as_f64() {
                    Some(v) => *slot = v,
                    None => issues.push(FieldIssue::NotNumeric {
                        field: name,
                        found: "an unrepresentable number",
                    }),
                },
                Some(other) => issues.push(FieldIssue::NotNumeric {
                    field: name,
                    found: describe(other),
                }),
            }
        }

        if !issues.is_empty() {
            return Err(PredictorError::InvalidFields(issues));
        }

        let has_emp_length = !matches!(fields.get(PRESENCE_FIELD), None | Some(Value::Null));

        Ok(Self {
            loan_amount_requested: values[0],
            existing_debt_or_other_payments: values[1],
            annual_income: values[2],
            monthly_income: values[3],
            total_outstanding_debt: values[4],
            recoveries: values[5],
            total_rec_int: values[6],
            total_current_balance: values[7],
            total_credit_limit: values[8],
            batch_enrolled: values[9],
            has_emp_length,
        })
    }

    /// Derives the classifier input.
    pub fn features(&self) -> Result<FeatureVector> {
        FeatureVector::derive(self)
    }
}

/// Fixed-order engineered features
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Computes the nine features.
    ///
    /// Ratios divide by the raw field except where the trained pipeline
    /// offset the denominator by one. A zero denominator is an error in
    /// both cases; the `+1` offset only protects non-negative inputs.
    pub fn derive(app: &LoanApplication) -> Result<Self> {
        let values = [
            app.loan_amount_requested + app.existing_debt_or_other_payments,
            ratio(
                "income_to_loan_ratio",
                app.annual_income,
                app.loan_amount_requested,
                "loan_amount_requested",
            )?,
            ratio(
                "dti_revol_util",
                app.total_outstanding_debt,
                app.monthly_income,
                "monthly_income",
            )?,
            app.recoveries + app.total_rec_int,
            ratio(
                "balance_to_credit_ratio",
                app.total_current_balance,
                app.total_credit_limit,
                "total_credit_limit",
            )?,
            ratio(
                "recoveries_to_balance_ratio",
                app.recoveries,
                app.total_current_balance + 1.0,
                "total_current_balance + 1",
            )?,
            ratio(
                "batch_enrolled_to_total_rec_int",
                app.batch_enrolled,
                app.total_rec_int + 1.0,
                "total_rec_int + 1",
            )?,
            ratio(
                "loan_amnt_total_rec_int_ratio",
                app.loan_amount_requested,
                app.total_rec_int + 1.0,
                "total_rec_int + 1",
            )?,
            if app.has_emp_length { 0.0 } else { 1.0 },
        ];

        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            return Err(PredictorError::NonFiniteFeature(FEATURE_NAMES[idx]));
        }

        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Looks a feature up by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.0[idx])
    }

    /// Iterates `(name, value)` pairs in model order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

fn ratio(
    feature: &'static str,
    numerator: f64,
    denominator: f64,
    denominator_name: &'static str,
) -> Result<f64> {
    if denominator == 0.0 {
        return Err(PredictorError::DivisionByZero {
            feature,
            denominator: denominator_name,
        });
    }
    Ok(numerator / denominator)
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_request() -> Value {
        json!({
            "loan_amount_requested": 10000,
            "existing_debt_or_other_payments": 2000,
            "annual_income": 60000,
            "monthly_income": 5000,
            "total_outstanding_debt": 1500,
            "recoveries": 500,
            "total_rec_int": 99,
            "total_current_balance": 4999,
            "total_credit_limit": 20000,
            "batch_enrolled": 300,
            "emp_length": "5 years"
        })
    }

    fn features_of(value: Value) -> Result<FeatureVector> {
        let fields = value.as_object().cloned().unwrap_or_default();
        LoanApplication::from_fields(&fields)?.features()
    }

    fn feature(value: Value, name: &str) -> f64 {
        features_of(value).unwrap().get(name).unwrap()
    }

    #[test]
    fn test_total_payment() {
        assert_eq!(feature(base_request(), "total_payment"), 12000.0);
    }

    #[test]
    fn test_income_to_loan_ratio() {
        assert_eq!(feature(base_request(), "income_to_loan_ratio"), 6.0);
    }

    #[test]
    fn test_dti_revol_util() {
        assert_eq!(feature(base_request(), "dti_revol_util"), 0.3);
    }

    #[test]
    fn test_total_recovery() {
        assert_eq!(feature(base_request(), "total_recovery"), 599.0);
    }

    #[test]
    fn test_balance_to_credit_ratio() {
        assert_eq!(feature(base_request(), "balance_to_credit_ratio"), 0.24995);
    }

    #[test]
    fn test_recoveries_to_balance_ratio() {
        assert_eq!(feature(base_request(), "recoveries_to_balance_ratio"), 0.1);
    }

    #[test]
    fn test_recoveries_guard_at_zero_balance() {
        let mut req = base_request();
        req["total_current_balance"] = json!(0);
        assert_eq!(feature(req, "recoveries_to_balance_ratio"), 500.0);
    }

    #[test]
    fn test_batch_enrolled_to_total_rec_int() {
        assert_eq!(feature(base_request(), "batch_enrolled_to_total_rec_int"), 3.0);
    }

    #[test]
    fn test_loan_amnt_total_rec_int_ratio() {
        assert_eq!(feature(base_request(), "loan_amnt_total_rec_int_ratio"), 100.0);
    }

    #[test]
    fn test_emp_length_presence() {
        assert_eq!(feature(base_request(), "emp_length_missing"), 0.0);

        let mut null = base_request();
        null["emp_length"] = Value::Null;
        assert_eq!(feature(null, "emp_length_missing"), 1.0);

        let mut absent = base_request();
        absent.as_object_mut().unwrap().remove("emp_length");
        assert_eq!(feature(absent, "emp_length_missing"), 1.0);

        for value in [json!(0), json!(false), json!(""), json!([]), json!({})] {
            let mut req = base_request();
            req["emp_length"] = value;
            assert_eq!(feature(req, "emp_length_missing"), 0.0);
        }
    }

    #[test]
    fn test_feature_order() {
        let features = features_of(base_request()).unwrap();
        let names: Vec<_> = features.named().map(|(n, _)| n).collect();
        assert_eq!(names, FEATURE_NAMES);
        assert_eq!(features.as_slice().len(), FEATURE_COUNT);
        assert_eq!(features.as_slice()[0], 12000.0);
        assert_eq!(features.as_slice()[8], 0.0);
    }

    #[test]
    fn test_float_inputs() {
        let mut req = base_request();
        req["loan_amount_requested"] = json!(2500.5);
        req["existing_debt_or_other_payments"] = json!(0.25);
        assert_eq!(feature(req, "total_payment"), 2500.75);
    }

    #[test]
    fn test_zero_loan_amount_is_division_error() {
        let mut req = base_request();
        req["loan_amount_requested"] = json!(0);

        match features_of(req) {
            Err(PredictorError::DivisionByZero { feature, denominator }) => {
                assert_eq!(feature, "income_to_loan_ratio");
                assert_eq!(denominator, "loan_amount_requested");
            }
            other => panic!("expected DivisionByZero, got {:?}", other),
        }
    }

    #[test]
    fn test_unguarded_denominators() {
        for (field, expected) in [
            ("monthly_income", "dti_revol_util"),
            ("total_credit_limit", "balance_to_credit_ratio"),
        ] {
            let mut req = base_request();
            req[field] = json!(0.0);
            match features_of(req) {
                Err(PredictorError::DivisionByZero { feature, .. }) => assert_eq!(feature, expected),
                other => panic!("expected DivisionByZero for {}, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn test_negative_offset_denominator() {
        let mut req = base_request();
        req["total_rec_int"] = json!(-1);

        match features_of(req) {
            Err(PredictorError::DivisionByZero { feature, denominator }) => {
                assert_eq!(feature, "batch_enrolled_to_total_rec_int");
                assert_eq!(denominator, "total_rec_int + 1");
            }
            other => panic!("expected DivisionByZero, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_fields_are_aggregated() {
        let mut req = base_request();
        let obj = req.as_object_mut().unwrap();
        obj.remove("annual_income");
        obj.insert("recoveries".into(), Value::Null);
        obj.insert("total_rec_int".into(), json!("12"));

        match features_of(req) {
            Err(PredictorError::InvalidFields(issues)) => {
                assert_eq!(
                    issues,
                    vec![
                        FieldIssue::Missing("annual_income"),
                        FieldIssue::Missing("recoveries"),
                        FieldIssue::NotNumeric {
                            field: "total_rec_int",
                            found: "a string"
                        },
                    ]
                );
            }
            other => panic!("expected InvalidFields, got {:?}", other),
        }
    }

    #[test]
    fn test_boolean_is_not_numeric() {
        let mut req = base_request();
        req["batch_enrolled"] = json!(true);
        let err = features_of(req).unwrap_err();
        assert!(err.to_string().contains("'batch_enrolled' must be a number, got a boolean"));
    }

    #[test]
    fn test_overflow_is_non_finite() {
        let mut req = base_request();
        req["loan_amount_requested"] = json!(f64::MAX);
        req["existing_debt_or_other_payments"] = json!(f64::MAX);

        match features_of(req) {
            Err(PredictorError::NonFiniteFeature(name)) => assert_eq!(name, "total_payment"),
            other => panic!("expected NonFiniteFeature, got {:?}", other),
        }
    }

    #[test]
    fn test_extra_fields_ignored() {
        let mut req = base_request();
        req["applicant_name"] = json!("Ada");
        assert!(features_of(req).is_ok());
    }

    #[test]
    fn test_from_json_bytes_rejects_non_objects() {
        let bodies: [&[u8]; 5] = [b"not json", b"[1, 2]", b"42", b"null", b""];
        for body in bodies {
            let err = LoanApplication::from_json_bytes(body).unwrap_err();
            assert!(matches!(err, PredictorError::BadRequest(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_from_json_bytes() {
        let body = serde_json::to_vec(&base_request()).unwrap();
        let app = LoanApplication::from_json_bytes(&body).unwrap();
        assert_eq!(app.loan_amount_requested, 10000.0);
        assert!(app.has_emp_length);
    }
}
