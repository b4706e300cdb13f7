use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::arith::fold_hash;
use crate::constants::CIRCLE_ZERO_THRESHOLD;
use crate::laurent::{CircleValue, LaurentPolynomial};

/// Fitting ideal E_d, approximated by a short list of generators.
///
/// For growing `d` the ideals are meant to grow too; from `d = r` on, the
/// ideal is the whole ring. That ordering is produced by the construction
/// in [`crate::alexander`], not checked here.
#[derive(Clone, Debug, PartialEq)]
pub struct FittingIdeal {
    pub degree: usize,
    pub generators: Vec<LaurentPolynomial>,
}

/// All generators evaluated at one point of the unit circle.
#[derive(Clone, Debug, PartialEq)]
pub struct IdealCircleValue {
    /// Smallest modulus across generators; infinite when there are none.
    pub min_abs: f64,
    pub values: Vec<CircleValue>,
}

/// A sample angle at which the ideal nearly vanishes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleZero {
    pub index: usize,
    pub theta: f64,
    pub min_abs: f64,
}

/// Per-degree metadata recorded in a module signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FittingSummary {
    pub degree: usize,
    pub num_generators: usize,
    pub is_trivial: bool,
    pub is_zero: bool,
}

impl FittingIdeal {
    pub fn new(degree: usize, generators: Vec<LaurentPolynomial>) -> Self {
        Self { degree, generators }
    }

    /// The unit ideal `(1)`.
    pub fn trivial(degree: usize) -> Self {
        Self::principal(degree, LaurentPolynomial::one())
    }

    pub fn principal(degree: usize, generator: LaurentPolynomial) -> Self {
        Self::new(degree, vec![generator])
    }

    /// Whole ring: some generator is a ±1 monomial.
    pub fn is_trivial(&self) -> bool {
        self.generators.iter().any(|g| g.is_unit())
    }

    pub fn is_zero(&self) -> bool {
        self.generators.iter().all(|g| g.is_zero())
    }

    /// Stand-in for the gcd of the generators: the first nonzero one.
    ///
    /// With a single generator that generator is returned as is. For a
    /// non-principal ideal this is not the true generator.
    pub fn primary_generator(&self) -> Option<&LaurentPolynomial> {
        self.generators
            .iter()
            .find(|g| !g.is_zero())
            .or(self.generators.first())
    }

    /// Normalized primary generator; zero when the ideal has no generators.
    pub fn characteristic_polynomial(&self) -> LaurentPolynomial<f64> {
        self.primary_generator()
            .map(LaurentPolynomial::normalize)
            .unwrap_or_default()
    }

    pub fn evaluate_on_circle(&self, theta: f64) -> IdealCircleValue {
        let values: Vec<CircleValue> = self
            .generators
            .iter()
            .map(|g| g.evaluate_on_circle(theta))
            .collect();
        let min_abs = values.iter().map(|v| v.abs).fold(f64::INFINITY, f64::min);
        IdealCircleValue { min_abs, values }
    }

    /// Coarse sieve over `samples` equally spaced angles in `[0, 2π)`.
    pub fn find_circle_zeros(&self, samples: usize) -> Vec<CircleZero> {
        (0..samples)
            .filter_map(|index| {
                let theta = TAU * index as f64 / samples as f64;
                let min_abs = self.evaluate_on_circle(theta).min_abs;
                (min_abs < CIRCLE_ZERO_THRESHOLD).then_some(CircleZero {
                    index,
                    theta,
                    min_abs,
                })
            })
            .collect()
    }

    /// Fold of the characteristic polynomial's coefficients, lowest power
    /// first, gaps included as zeros. Fractional coefficients truncate.
    pub fn signature_hash(&self) -> i32 {
        let poly = self.characteristic_polynomial();
        let (Some(lo), Some(hi)) = (poly.min_power(), poly.max_power()) else {
            return 0;
        };
        (lo..=hi).fold(0, |hash, power| fold_hash(hash, poly.get(power).trunc() as i64))
    }

    pub fn summary(&self) -> FittingSummary {
        FittingSummary {
            degree: self.degree,
            num_generators: self.generators.len(),
            is_trivial: self.is_trivial(),
            is_zero: self.is_zero(),
        }
    }
}
