use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Scalar type a Laurent polynomial can carry.
///
/// `i64` is the ring proper; `f64` holds normalized forms, whose
/// coefficients need not be integral.
pub trait Coefficient:
    Copy
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
{
    const ZERO: Self;
    const ONE: Self;

    fn to_f64(self) -> f64;

    fn is_zero(self) -> bool {
        self == Self::ZERO
    }
}

impl Coefficient for i64 {
    const ZERO: Self = 0;
    const ONE: Self = 1;

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Coefficient for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    fn to_f64(self) -> f64 {
        self
    }
}

/// Value of a polynomial at e^{iθ}.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircleValue {
    pub re: f64,
    pub im: f64,
    pub abs: f64,
}

/// Sparse polynomial in one indeterminate `t` with integer (possibly
/// negative) exponents.
///
/// Zero coefficients are never stored. Every operation returns a new value;
/// operands are left untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct LaurentPolynomial<T: Coefficient = i64> {
    terms: BTreeMap<i32, T>,
}

impl<T: Coefficient> Default for LaurentPolynomial<T> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<T: Coefficient> LaurentPolynomial<T> {
    pub fn zero() -> Self {
        Self {
            terms: BTreeMap::new(),
        }
    }

    pub fn constant(c: T) -> Self {
        Self::monomial(0, c)
    }

    pub fn one() -> Self {
        Self::constant(T::ONE)
    }

    pub fn monomial(power: i32, c: T) -> Self {
        let mut p = Self::zero();
        p.set(power, c);
        p
    }

    /// Build from `(power, coefficient)` pairs. Repeated powers are summed.
    pub fn from_terms(terms: impl IntoIterator<Item = (i32, T)>) -> Self {
        let mut p = Self::zero();
        for (power, c) in terms {
            p.set(power, p.get(power) + c);
        }
        p
    }

    /// Product `Π (t − rᵢ)`; the empty product is 1.
    pub fn from_roots(roots: &[T]) -> Self {
        roots.iter().fold(Self::one(), |acc, &r| {
            let factor = Self::from_terms([(1, T::ONE), (0, -r)]);
            &acc * &factor
        })
    }

    /// Generator of the augmentation ideal: `t − 1`.
    pub fn augmentation_generator() -> Self {
        Self::from_terms([(1, T::ONE), (0, -T::ONE)])
    }

    /// Coefficient at `power`, zero when absent.
    pub fn get(&self, power: i32) -> T {
        self.terms.get(&power).copied().unwrap_or(T::ZERO)
    }

    /// Set the coefficient at `power`; a zero value removes the term.
    pub fn set(&mut self, power: i32, value: T) {
        if value.is_zero() {
            self.terms.remove(&power);
        } else {
            self.terms.insert(power, value);
        }
        self.debug_check();
    }

    /// Nonzero terms in ascending power order.
    pub fn terms(&self) -> impl Iterator<Item = (i32, T)> + '_ {
        self.terms.iter().map(|(&p, &c)| (p, c))
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn min_power(&self) -> Option<i32> {
        self.terms.keys().next().copied()
    }

    pub fn max_power(&self) -> Option<i32> {
        self.terms.keys().next_back().copied()
    }

    /// Span `max_power − min_power`; 0 for the zero polynomial.
    pub fn degree(&self) -> i32 {
        match (self.min_power(), self.max_power()) {
            (Some(lo), Some(hi)) => hi - lo,
            _ => 0,
        }
    }

    /// True for a single-term ±1 monomial, i.e. a unit of the Laurent ring.
    pub fn is_unit(&self) -> bool {
        self.terms.len() == 1
            && self
                .terms
                .values()
                .all(|&c| c == T::ONE || c == -T::ONE)
    }

    pub fn scale(&self, k: T) -> Self {
        Self::from_terms(self.terms().map(|(p, c)| (p, c * k)))
    }

    /// Direct sum `Σ cₖ xᵏ` over stored terms.
    pub fn evaluate(&self, x: f64) -> f64 {
        self.terms().map(|(p, c)| c.to_f64() * x.powi(p)).sum()
    }

    /// Evaluate at `t = e^{iθ}` by summing `c·cos(kθ)` and `c·sin(kθ)`.
    pub fn evaluate_on_circle(&self, theta: f64) -> CircleValue {
        let (re, im) = self.terms().fold((0.0, 0.0), |(re, im), (p, c)| {
            let angle = p as f64 * theta;
            let c = c.to_f64();
            (re + c * angle.cos(), im + c * angle.sin())
        });
        CircleValue {
            re,
            im,
            abs: re.hypot(im),
        }
    }

    /// Canonical comparison form: exponents shifted so the lowest is 0, and
    /// every coefficient divided by the leading one. The zero polynomial is
    /// returned unchanged.
    pub fn normalize(&self) -> LaurentPolynomial<f64> {
        let (Some(lo), Some(hi)) = (self.min_power(), self.max_power()) else {
            return LaurentPolynomial::zero();
        };
        let lead = self.get(hi).to_f64();
        LaurentPolynomial::from_terms(self.terms().map(|(p, c)| (p - lo, c.to_f64() / lead)))
    }

    pub fn to_real(&self) -> LaurentPolynomial<f64> {
        LaurentPolynomial::from_terms(self.terms().map(|(p, c)| (p, c.to_f64())))
    }

    fn debug_check(&self) {
        debug_assert!(
            self.terms.values().all(|c| !c.is_zero()),
            "zero coefficient stored in Laurent polynomial"
        );
    }
}

impl<T: Coefficient> Add for &LaurentPolynomial<T> {
    type Output = LaurentPolynomial<T>;

    fn add(self, rhs: Self) -> LaurentPolynomial<T> {
        LaurentPolynomial::from_terms(self.terms().chain(rhs.terms()))
    }
}

impl<T: Coefficient> Sub for &LaurentPolynomial<T> {
    type Output = LaurentPolynomial<T>;

    fn sub(self, rhs: Self) -> LaurentPolynomial<T> {
        LaurentPolynomial::from_terms(self.terms().chain(rhs.terms().map(|(p, c)| (p, -c))))
    }
}

/// Convolution over every pair of terms.
impl<T: Coefficient> Mul for &LaurentPolynomial<T> {
    type Output = LaurentPolynomial<T>;

    fn mul(self, rhs: Self) -> LaurentPolynomial<T> {
        LaurentPolynomial::from_terms(
            self.terms()
                .flat_map(|(p, a)| rhs.terms().map(move |(q, b)| (p + q, a * b))),
        )
    }
}

impl<T: Coefficient> Neg for &LaurentPolynomial<T> {
    type Output = LaurentPolynomial<T>;

    fn neg(self) -> LaurentPolynomial<T> {
        self.scale(-T::ONE)
    }
}

impl<T: Coefficient> Add for LaurentPolynomial<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        &self + &rhs
    }
}

impl<T: Coefficient> Sub for LaurentPolynomial<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        &self - &rhs
    }
}

impl<T: Coefficient> Mul for LaurentPolynomial<T> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        &self * &rhs
    }
}

/// Ascending powers, e.g. `1 - 2t + t^2` or `t^-1 + 3`.
impl<T: Coefficient> fmt::Display for LaurentPolynomial<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        for (i, (power, c)) in self.terms().enumerate() {
            let negative = c < T::ZERO;
            let magnitude = if negative { -c } else { c };
            match (i, negative) {
                (0, true) => write!(f, "-")?,
                (0, false) => {}
                (_, true) => write!(f, " - ")?,
                (_, false) => write!(f, " + ")?,
            }
            if power == 0 {
                write!(f, "{magnitude}")?;
                continue;
            }
            if magnitude != T::ONE {
                write!(f, "{magnitude}")?;
            }
            if power == 1 {
                write!(f, "t")?;
            } else {
                write!(f, "t^{power}")?;
            }
        }
        Ok(())
    }
}
