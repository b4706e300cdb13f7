use std::collections::BTreeMap;
use std::f64::consts::TAU;
use std::sync::OnceLock;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::arith::{binomial, fold_hash, is_prime, k_subsets, legendre_sign};
use crate::constants::{
    CIRCLE_SAMPLES, DEFAULT_ELL, DEFAULT_FIELD, EQUIVALENCE_TOLERANCE, MAX_PRIMES,
    MAX_PRIMES_CEILING, SIGNATURE_FITTING_DEGREES,
};
use crate::crowell::{CrowellSequence, GroupData};
use crate::error::{Result, SignatureError};
use crate::fitting::{FittingIdeal, FittingSummary};
use crate::laurent::LaurentPolynomial;

/// Construction parameters for an [`AlexanderModule`].
#[derive(Clone, Debug, PartialEq)]
pub struct ModuleOptions {
    pub ell: u64,
    /// Informational tag; takes no part in any computation.
    pub field: String,
    /// Upper bound on distinct primes; the degree-0 ideal costs O(r·2^r).
    /// Values above [`MAX_PRIMES_CEILING`] are clamped to it.
    pub max_primes: usize,
}

impl Default for ModuleOptions {
    fn default() -> Self {
        Self {
            ell: DEFAULT_ELL,
            field: DEFAULT_FIELD.to_string(),
            max_primes: MAX_PRIMES,
        }
    }
}

/// One unit-circle sample of the Alexander polynomial.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicValue {
    pub k: usize,
    pub theta: f64,
    pub re: f64,
    pub im: f64,
    pub abs: f64,
}

/// Hashable summary of a module.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub primes: Vec<u64>,
    pub ell: u64,
    pub field: String,
    pub fitting_degrees: Vec<FittingSummary>,
    pub alexander_polynomial: String,
    pub characteristic_values: Vec<CharacteristicValue>,
    pub hash: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleStats {
    pub num_primes: usize,
    pub ell: u64,
    pub alexander_degree: i32,
    pub signature_hash: u32,
    pub mean_characteristic_value: f64,
}

/// Module attached to a finite set of primes.
///
/// Fitting ideals are computed on first request and cached per degree; the
/// signature is computed once. Both caches live as long as the module and
/// are never shared with other modules.
#[derive(Debug)]
pub struct AlexanderModule {
    primes: Vec<u64>,
    ell: u64,
    field: String,
    group: GroupData,
    fitting_ideals: RwLock<BTreeMap<usize, FittingIdeal>>,
    signature: OnceLock<Signature>,
}

impl AlexanderModule {
    pub fn new(primes: &[u64]) -> Result<Self> {
        Self::with_options(primes, ModuleOptions::default())
    }

    /// Non-primes are dropped, duplicates removed, and the rest sorted.
    /// Fails when nothing survives, when ℓ < 2, or when more than
    /// `max_primes` distinct primes remain. `max_primes` is clamped to
    /// [`MAX_PRIMES_CEILING`].
    pub fn with_options(primes: &[u64], options: ModuleOptions) -> Result<Self> {
        if options.ell < 2 {
            return Err(SignatureError::InvalidInput(format!(
                "ell must be at least 2, got {}",
                options.ell
            )));
        }

        let mut filtered: Vec<u64> = primes.iter().copied().filter(|&p| is_prime(p)).collect();
        filtered.sort_unstable();
        filtered.dedup();

        if filtered.is_empty() {
            return Err(SignatureError::InvalidInput(format!(
                "no primes in input {primes:?}"
            )));
        }
        let limit = options.max_primes.min(MAX_PRIMES_CEILING);
        if filtered.len() > limit {
            return Err(SignatureError::ResourceLimit {
                count: filtered.len(),
                limit,
            });
        }

        let group = GroupData::for_primes(&filtered);
        Ok(Self {
            primes: filtered,
            ell: options.ell,
            field: options.field,
            group,
            fitting_ideals: RwLock::new(BTreeMap::new()),
            signature: OnceLock::new(),
        })
    }

    pub fn primes(&self) -> &[u64] {
        &self.primes
    }

    /// Number of distinct primes.
    pub fn r(&self) -> usize {
        self.primes.len()
    }

    pub fn ell(&self) -> u64 {
        self.ell
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn group_data(&self) -> &GroupData {
        &self.group
    }

    pub fn crowell_sequence(&self) -> CrowellSequence {
        CrowellSequence::new(self.group.clone())
    }

    /// E_d, memoized per degree.
    pub fn compute_fitting_ideal(&self, degree: usize) -> FittingIdeal {
        if let Some(ideal) = self.fitting_ideals.read().get(&degree) {
            return ideal.clone();
        }
        let ideal = build_fitting_ideal(&self.primes, degree);
        self.fitting_ideals
            .write()
            .entry(degree)
            .or_insert(ideal)
            .clone()
    }

    /// E_0 through E_{max_degree}, inclusive.
    pub fn all_fitting_ideals(&self, max_degree: usize) -> BTreeMap<usize, FittingIdeal> {
        (0..=max_degree)
            .map(|d| (d, self.compute_fitting_ideal(d)))
            .collect()
    }

    /// Characteristic polynomial of E_0.
    pub fn alexander_polynomial(&self) -> LaurentPolynomial<f64> {
        self.compute_fitting_ideal(0).characteristic_polynomial()
    }

    pub fn signature(&self) -> &Signature {
        self.signature.get_or_init(|| self.build_signature())
    }

    fn build_signature(&self) -> Signature {
        let poly = self.alexander_polynomial();

        let fitting_degrees = (0..SIGNATURE_FITTING_DEGREES)
            .map(|d| self.compute_fitting_ideal(d).summary())
            .collect();

        let characteristic_values: Vec<CharacteristicValue> = (0..CIRCLE_SAMPLES)
            .map(|k| {
                let theta = TAU * k as f64 / CIRCLE_SAMPLES as f64;
                let v = poly.evaluate_on_circle(theta);
                CharacteristicValue {
                    k,
                    theta,
                    re: v.re,
                    im: v.im,
                    abs: v.abs,
                }
            })
            .collect();

        let hash = signature_hash(&self.primes, &characteristic_values);

        Signature {
            primes: self.primes.clone(),
            ell: self.ell,
            field: self.field.clone(),
            fitting_degrees,
            alexander_polynomial: poly.to_string(),
            characteristic_values,
            hash,
        }
    }

    /// Same prime count, same ℓ, and every circle magnitude within
    /// `tolerance` of its counterpart.
    pub fn equivalent_signatures(a: &Signature, b: &Signature, tolerance: f64) -> bool {
        if a.primes.len() != b.primes.len() || a.ell != b.ell {
            return false;
        }
        a.characteristic_values.len() == b.characteristic_values.len()
            && a
                .characteristic_values
                .iter()
                .zip(&b.characteristic_values)
                .all(|(x, y)| (x.abs - y.abs).abs() <= tolerance)
    }

    /// [`Self::equivalent_signatures`] at the default tolerance.
    pub fn is_equivalent(a: &Signature, b: &Signature) -> bool {
        Self::equivalent_signatures(a, b, EQUIVALENCE_TOLERANCE)
    }

    pub fn stats(&self) -> ModuleStats {
        let signature = self.signature();
        let values = &signature.characteristic_values;
        let mean = if values.is_empty() {
            0.0
        } else {
            values.iter().map(|v| v.abs).sum::<f64>() / values.len() as f64
        };
        ModuleStats {
            num_primes: self.r(),
            ell: self.ell,
            alexander_degree: self.alexander_polynomial().degree(),
            signature_hash: signature.hash,
            mean_characteristic_value: mean,
        }
    }
}

/// Primes first, then each circle magnitude as an integer in thousandths.
fn signature_hash(primes: &[u64], values: &[CharacteristicValue]) -> u32 {
    let hash = primes.iter().fold(0, |h, &p| fold_hash(h, p as i64));
    let hash = values
        .iter()
        .fold(hash, |h, v| fold_hash(h, (v.abs * 1000.0).round() as i64));
    hash as u32
}

fn build_fitting_ideal(primes: &[u64], degree: usize) -> FittingIdeal {
    let r = primes.len();
    if degree >= r {
        return FittingIdeal::trivial(degree);
    }
    if degree == 0 {
        return FittingIdeal::principal(0, alexander_generator(primes));
    }

    let size = r - degree;
    let generators: Vec<LaurentPolynomial> = k_subsets(r, size)
        .map(|_| alternating_minor(size))
        .filter(|g| !g.is_zero())
        .collect();

    if generators.is_empty() {
        FittingIdeal::trivial(degree)
    } else {
        FittingIdeal::new(degree, generators)
    }
}

/// Minor of an `size`-subset: `Σ (−1)^i C(size, i) t^i`.
fn alternating_minor(size: usize) -> LaurentPolynomial {
    LaurentPolynomial::from_terms((0..=size).map(|i| {
        let sign = if i % 2 == 0 { 1 } else { -1 };
        (i as i32, sign * binomial(size, i))
    }))
}

/// Generator of E_0.
///
/// Coefficient `i` is 1 at both ends and otherwise the sum over all
/// `i`-subsets of the product of pair signs, after which the polynomial is
/// made palindromic by averaging mirrored coefficients.
fn alexander_generator(primes: &[u64]) -> LaurentPolynomial {
    let r = primes.len();
    if r == 1 {
        return LaurentPolynomial::one();
    }

    let sums = subset_sign_sums(primes);
    let raw = LaurentPolynomial::from_terms((0..=r).map(|i| {
        let c = if i == 0 || i == r { 1 } else { sums[i] };
        (i as i32, c)
    }));
    symmetrize(&raw)
}

/// For each cardinality `k`, the sum over `k`-subsets of
/// `Π legendre_sign(p, q)` over pairs `p < q` in the subset.
///
/// A subset's sign is its sign without the lowest element times the pair
/// signs between that element and the rest.
fn subset_sign_sums(primes: &[u64]) -> Vec<i64> {
    let r = primes.len();
    let mut pair = vec![vec![0i8; r]; r];
    for i in 0..r {
        for j in (i + 1)..r {
            pair[i][j] = legendre_sign(primes[i], primes[j]);
        }
    }

    let total = 1usize << r;
    let mut signs = vec![0i8; total];
    signs[0] = 1;
    let mut sums = vec![0i64; r + 1];
    sums[0] = 1;

    for mask in 1..total {
        let low = mask.trailing_zeros() as usize;
        let rest = mask & (mask - 1);
        let mut sign = signs[rest];
        let mut bits = rest;
        while bits != 0 && sign != 0 {
            let j = bits.trailing_zeros() as usize;
            sign *= pair[low][j];
            bits &= bits - 1;
        }
        signs[mask] = sign;
        sums[mask.count_ones() as usize] += sign as i64;
    }
    sums
}

/// Replace each coefficient at `k` by the half-up rounded mean of the
/// coefficients at `k` and `max + min − k`, reading from the input.
fn symmetrize(poly: &LaurentPolynomial) -> LaurentPolynomial {
    let (Some(lo), Some(hi)) = (poly.min_power(), poly.max_power()) else {
        return poly.clone();
    };
    LaurentPolynomial::from_terms((lo..=hi).map(|k| {
        let mean = (poly.get(k) + poly.get(hi + lo - k)) as f64 / 2.0;
        (k, (mean + 0.5).floor() as i64)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn module(primes: &[u64]) -> AlexanderModule {
        AlexanderModule::new(primes).unwrap()
    }

    #[test]
    fn test_construction_filters_and_sorts() {
        let m = module(&[13, 4, 7, 5, 7, 1, 11, 9]);
        assert_eq!(m.primes(), &[5, 7, 11, 13]);
        assert_eq!(m.r(), 4);
        assert_eq!(m.ell(), 2);
        assert_eq!(m.field(), DEFAULT_FIELD);
    }

    #[test]
    fn test_empty_after_filter_is_invalid() {
        let err = AlexanderModule::new(&[1, 4, 6, 9]).unwrap_err();
        assert!(matches!(err, SignatureError::InvalidInput(_)));
        assert!(matches!(
            AlexanderModule::new(&[]),
            Err(SignatureError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_ell_below_two_is_invalid() {
        let options = ModuleOptions {
            ell: 1,
            ..ModuleOptions::default()
        };
        assert!(matches!(
            AlexanderModule::with_options(&[5], options),
            Err(SignatureError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_resource_limit() {
        let options = ModuleOptions {
            max_primes: 3,
            ..ModuleOptions::default()
        };
        let err = AlexanderModule::with_options(&[2, 3, 5, 7], options).unwrap_err();
        assert_eq!(err, SignatureError::ResourceLimit { count: 4, limit: 3 });
    }

    #[test]
    fn test_resource_limit_is_capped() {
        let primes: Vec<u64> = (2..400).filter(|&n| is_prime(n)).take(64).collect();
        let options = ModuleOptions {
            max_primes: 100,
            ..ModuleOptions::default()
        };
        let err = AlexanderModule::with_options(&primes, options).unwrap_err();
        assert_eq!(
            err,
            SignatureError::ResourceLimit {
                count: 64,
                limit: MAX_PRIMES_CEILING
            }
        );

        let options = ModuleOptions {
            max_primes: usize::MAX,
            ..ModuleOptions::default()
        };
        let err = AlexanderModule::with_options(&primes[..31], options).unwrap_err();
        assert!(matches!(err, SignatureError::ResourceLimit { count: 31, .. }));
    }

    #[test]
    fn test_scenario_four_primes() {
        let m = module(&[5, 7, 11, 13]);
        assert_eq!(m.r(), 4);
        assert_eq!(m.compute_fitting_ideal(0).degree, 0);
        let all = m.all_fitting_ideals(3);
        assert_eq!(all.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_top_degree_is_trivial() {
        let sets: [&[u64]; 4] = [&[2], &[3, 5], &[5, 7, 11], &[2, 3, 5, 7, 11, 13]];
        for primes in sets {
            let m = module(primes);
            assert!(m.compute_fitting_ideal(m.r()).is_trivial(), "r = {}", m.r());
        }
    }

    #[test]
    fn test_single_prime_alexander_is_one() {
        let m = module(&[7]);
        assert_eq!(m.alexander_polynomial(), LaurentPolynomial::one());
        assert_eq!(m.signature().alexander_polynomial, "1");
    }

    #[test]
    fn test_two_primes_alexander() {
        // Single pair has no middle subsets beyond singletons: 1 + 2t + t^2
        assert_eq!(module(&[5, 7]).signature().alexander_polynomial, "1 + 2t + t^2");
    }

    #[test]
    fn test_three_primes_alexander() {
        // Raw 1 + 3t - t^2 + t^3 symmetrizes to 1 + t + t^2 + t^3
        assert_eq!(
            module(&[5, 7, 11]).signature().alexander_polynomial,
            "1 + t + t^2 + t^3"
        );
    }

    #[test]
    fn test_four_primes_alexander() {
        // Raw 1 + 4t - 4t^2 + t^4; the t^3 coefficient sums to zero
        assert_eq!(
            module(&[5, 7, 11, 13]).signature().alexander_polynomial,
            "1 + 2t - 4t^2 + 2t^3 + t^4"
        );
    }

    #[test]
    fn test_alexander_is_palindromic() {
        let m = module(&[3, 5, 7, 11, 13, 17, 19]);
        let p = m.alexander_polynomial();
        let hi = p.max_power().unwrap();
        for k in 0..=hi {
            assert_abs_diff_eq!(p.get(k), p.get(hi - k));
        }
    }

    #[test]
    fn test_symmetrize_rounds_half_up() {
        let raw = LaurentPolynomial::from_terms([(0, 1), (1, 3), (2, -2), (3, 0), (4, 1)]);
        // k=1: (3+0)/2 = 1.5 → 2; k=2: -2; k=3: 1.5 → 2
        let s = symmetrize(&raw);
        assert_eq!(s, LaurentPolynomial::from_terms([(0, 1), (1, 2), (2, -2), (3, 2), (4, 1)]));

        let neg = LaurentPolynomial::from_terms([(0, 1), (1, -3), (2, 1)]);
        assert_eq!(symmetrize(&neg), neg);

        // (-3 + 0)/2 = -1.5 rounds up to -1
        let lopsided = LaurentPolynomial::from_terms([(0, 1), (1, -3), (3, 1)]);
        assert_eq!(
            symmetrize(&lopsided),
            LaurentPolynomial::from_terms([(0, 1), (1, -1), (2, -1), (3, 1)])
        );
    }

    #[test]
    fn test_intermediate_ideals_are_minors() {
        let m = module(&[5, 7, 11, 13]);
        let e1 = m.compute_fitting_ideal(1);
        // C(4, 3) subsets, each giving (1 - t)^3
        assert_eq!(e1.generators.len(), 4);
        let cube = LaurentPolynomial::from_terms([(0, 1), (1, -3), (2, 3), (3, -1)]);
        assert!(e1.generators.iter().all(|g| *g == cube));

        let e2 = m.compute_fitting_ideal(2);
        assert_eq!(e2.generators.len(), 6);
        assert!(!e2.is_trivial());
    }

    #[test]
    fn test_fitting_ideal_is_memoized() {
        let m = module(&[5, 7, 11]);
        let first = m.compute_fitting_ideal(1);
        assert_eq!(m.fitting_ideals.read().len(), 1);
        let second = m.compute_fitting_ideal(1);
        assert_eq!(first, second);
        assert_eq!(m.fitting_ideals.read().len(), 1);
    }

    #[test]
    fn test_signature_shape() {
        let m = module(&[5, 7, 11, 13]);
        let sig = m.signature();
        assert_eq!(sig.primes, vec![5, 7, 11, 13]);
        assert_eq!(sig.fitting_degrees.len(), SIGNATURE_FITTING_DEGREES);
        assert_eq!(sig.characteristic_values.len(), CIRCLE_SAMPLES);
        for (k, v) in sig.characteristic_values.iter().enumerate() {
            assert_eq!(v.k, k);
            assert_abs_diff_eq!(v.theta, TAU * k as f64 / 12.0);
            assert_abs_diff_eq!(v.abs, v.re.hypot(v.im));
        }
        // At θ = 0 the polynomial evaluates to its coefficient sum: 1+2-4+2+1
        assert_abs_diff_eq!(sig.characteristic_values[0].abs, 2.0, epsilon = 1e-9);
        assert!(sig.fitting_degrees[0].degree == 0 && !sig.fitting_degrees[0].is_trivial);
    }

    #[test]
    fn test_signature_computed_once() {
        let m = module(&[3, 5]);
        let a = m.signature() as *const Signature;
        let b = m.signature() as *const Signature;
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_order_independent() {
        assert_eq!(
            module(&[5, 7, 11, 13]).signature().hash,
            module(&[13, 7, 5, 11]).signature().hash
        );
    }

    #[test]
    fn test_hash_fixed_value_single_prime() {
        // Polynomial 1: every sample has modulus 1 → folds 1000 twelve times
        let expected = (0..12).fold(fold_hash(0, 7), |h, _| fold_hash(h, 1000)) as u32;
        assert_eq!(module(&[7]).signature().hash, expected);
    }

    #[test]
    fn test_hash_literal_values() {
        assert_eq!(module(&[7]).signature().hash, 3_914_292_103);
        assert_eq!(module(&[3, 5, 7]).signature().hash, 2_178_570_649);
        assert_eq!(module(&[5, 7]).signature().hash, 153_884_066);
        assert_eq!(module(&[5, 7, 11]).signature().hash, 2_435_920_279);
        assert_eq!(module(&[5, 7, 11, 13]).signature().hash, 44_075_812);
    }

    #[test]
    fn test_alexander_ideal_hash_literal() {
        // 1 + 2t - 4t^2 + 2t^3 + t^4
        assert_eq!(module(&[5, 7, 11, 13]).compute_fitting_ideal(0).signature_hash(), 979_322);
        // 1 + t^3
        assert_eq!(module(&[3, 5, 7]).compute_fitting_ideal(0).signature_hash(), 29_792);
    }

    #[test]
    fn test_hash_distinguishes_prime_sets() {
        assert_ne!(module(&[3]).signature().hash, module(&[5]).signature().hash);
    }

    #[test]
    fn test_equivalence() {
        let a = module(&[5, 7, 11]);
        let b = module(&[11, 7, 5]);
        assert!(AlexanderModule::is_equivalent(a.signature(), b.signature()));

        let c = module(&[5, 7]);
        assert!(!AlexanderModule::is_equivalent(a.signature(), c.signature()));

        let d = AlexanderModule::with_options(
            &[5, 7, 11],
            ModuleOptions {
                ell: 3,
                ..ModuleOptions::default()
            },
        )
        .unwrap();
        assert!(!AlexanderModule::is_equivalent(a.signature(), d.signature()));
    }

    #[test]
    fn test_equivalence_tolerance() {
        let a = module(&[5, 7, 11]).signature().clone();
        let mut b = a.clone();
        b.characteristic_values[3].abs += 0.005;
        assert!(AlexanderModule::equivalent_signatures(&a, &b, 0.01));
        assert!(!AlexanderModule::equivalent_signatures(&a, &b, 0.001));
    }

    #[test]
    fn test_stats() {
        let m = module(&[5, 7, 11, 13]);
        let stats = m.stats();
        assert_eq!(stats.num_primes, 4);
        assert_eq!(stats.ell, 2);
        assert_eq!(stats.alexander_degree, 4);
        assert_eq!(stats.signature_hash, m.signature().hash);
        let mean = m.signature().characteristic_values.iter().map(|v| v.abs).sum::<f64>() / 12.0;
        assert_abs_diff_eq!(stats.mean_characteristic_value, mean);
    }

    #[test]
    fn test_crowell_sequence_from_module() {
        let m = module(&[5, 7, 11]);
        let seq = m.crowell_sequence();
        assert_eq!(seq.group().h.rank, 3);
        assert!(seq.verify_exactness().is_exact());
    }
}
