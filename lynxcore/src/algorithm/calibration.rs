use std::fmt::{Display, Formatter};

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Mass calibration polynomial with coefficients in ascending powers,
/// `coefficients[i]` multiplies `key^i`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct CalibrationPolynomial {
    pub coefficients: Vec<f64>,
}

impl CalibrationPolynomial {
    /// Creates a new `CalibrationPolynomial`.
    ///
    /// # Arguments
    ///
    /// * `coefficients` - coefficients c0..cn, c0 being the constant term
    ///
    /// # Example
    ///
    /// ```rust
    /// use lynxcore::algorithm::calibration::CalibrationPolynomial;
    /// let calibration = CalibrationPolynomial::new(vec![0.0, 1.0]);
    /// assert_eq!(calibration.evaluate(42.5), 42.5);
    /// ```
    pub fn new(coefficients: Vec<f64>) -> Self {
        CalibrationPolynomial { coefficients }
    }

    /// The polynomial that maps every key onto itself.
    pub fn identity() -> Self {
        CalibrationPolynomial::new(vec![0.0, 1.0])
    }

    /// An empty coefficient list means the function carries no calibration.
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Evaluates the polynomial at a single key.
    ///
    /// Powers are accumulated incrementally instead of calling `powi` per term.
    /// All arithmetic is `f64`; MassLynx itself sums the terms in `f32`, so
    /// keys rounded to 4 or more decimals near m/z 1000 can differ in the last
    /// digit from vendor software.
    pub fn evaluate(&self, key: f64) -> f64 {
        let mut calibrated = 0.0;
        let mut power = 1.0;
        for coefficient in &self.coefficients {
            calibrated += coefficient * power;
            power *= key;
        }
        calibrated
    }

    /// Calibrates a slice of raw keys.
    pub fn apply(&self, keys: &[f64]) -> Vec<f64> {
        keys.iter().map(|&key| self.evaluate(key)).collect()
    }

    /// Calibrates keys in place.
    pub fn apply_in_place(&self, keys: &mut [f64]) {
        for key in keys.iter_mut() {
            *key = self.evaluate(*key);
        }
    }
}

impl From<Vec<f64>> for CalibrationPolynomial {
    fn from(coefficients: Vec<f64>) -> Self {
        CalibrationPolynomial::new(coefficients)
    }
}

impl Display for CalibrationPolynomial {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let terms: Vec<String> = self
            .coefficients
            .iter()
            .enumerate()
            .map(|(i, c)| match i {
                0 => format!("{}", c),
                1 => format!("{}*x", c),
                _ => format!("{}*x^{}", c, i),
            })
            .collect();
        write!(f, "CalibrationPolynomial({})", terms.join(" + "))
    }
}
