//! Integer helpers shared by the ideal computations: primality, the
//! Legendre-style pair sign, binomials, k-subset bitmasks and the 32-bit
//! hash fold.

use crate::constants::HASH_MULTIPLIER;

/// Witness set that makes Miller–Rabin deterministic over all of u64.
const MR_WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

/// Modular exponentiation by squaring. `m` must be nonzero.
pub fn pow_mod(base: u64, mut exp: u64, m: u64) -> u64 {
    if m == 1 {
        return 0;
    }
    let mut result = 1u64;
    let mut base = base % m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    result
}

/// Deterministic primality test for u64.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for &p in &MR_WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut s = 0;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'witness: for &a in &MR_WITNESSES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Quadratic-residue sign of `p` modulo `q` by Euler's criterion.
///
/// Returns 0 when `q` divides `p`, +1 when `p^((q-1)/2) ≡ 1 (mod q)`,
/// and -1 otherwise. For `q = 2` the exponent is 0, so any odd `p` gives +1.
pub fn legendre_sign(p: u64, q: u64) -> i8 {
    if q == 0 || p % q == 0 {
        return 0;
    }
    if pow_mod(p, (q - 1) / 2, q) == 1 { 1 } else { -1 }
}

/// Binomial coefficient C(n, k); 0 when k > n.
pub fn binomial(n: usize, k: usize) -> i64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        acc = acc * (n - i) as u128 / (i + 1) as u128;
    }
    acc as i64
}

/// One step of the signature hash: `hash * 31 + value` in wrapping i32
/// arithmetic. Values wider than 32 bits contribute their low 32 bits.
pub fn fold_hash(hash: i32, value: i64) -> i32 {
    hash.wrapping_mul(HASH_MULTIPLIER).wrapping_add(value as i32)
}

/// Iterator over all `k`-element subsets of `0..n` as bitmasks, in
/// increasing numeric order (Gosper's hack).
pub struct KSubsets {
    next: Option<u64>,
    limit: u64,
}

/// All `k`-subsets of an `n`-element set. `n` must be below 64.
pub fn k_subsets(n: usize, k: usize) -> KSubsets {
    debug_assert!(n < 64, "k_subsets over {n} elements");
    let next = if k > n { None } else { Some((1u64 << k) - 1) };
    KSubsets {
        next,
        limit: 1u64 << n,
    }
}

impl Iterator for KSubsets {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let current = self.next?;
        self.next = if current == 0 {
            None
        } else {
            let c = current & current.wrapping_neg();
            let r = current + c;
            let following = (((r ^ current) >> 2) / c) | r;
            (following < self.limit).then_some(following)
        };
        Some(current)
    }
}
