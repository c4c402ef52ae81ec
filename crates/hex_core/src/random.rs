//! Seedable pseudo-random numbers.
//!
//! [`Alea`] is Johannes Baagøe's Alea generator, computed entirely on `f64`
//! so that every seed produces the same stream as the reference generator.
//! Seeds are hashed as strings; numeric seeds go through the same
//! number-to-string formatting the reference uses, see [`number_key`].

use serde::{Deserialize, Serialize};

const TWO_POW_32: f64 = 4_294_967_296.0;
const TWO_POW_NEG_32: f64 = 2.328_306_436_538_696_3e-10;

fn to_uint32(value: f64) -> f64 {
    value.trunc().rem_euclid(TWO_POW_32)
}

/// Alea's seed hashing function. Keeps state across calls.
struct Mash {
    n: f64,
}

impl Mash {
    const fn new() -> Self {
        Self {
            n: 4_022_871_197.0, // 0xefc8249d
        }
    }

    fn hash(&mut self, data: &str) -> f64 {
        for code in data.encode_utf16() {
            self.n += f64::from(code);
            let mut h = 0.025_196_032_824_169_38 * self.n;
            self.n = to_uint32(h);
            h -= self.n;
            h *= self.n;
            self.n = to_uint32(h);
            h -= self.n;
            self.n += h * TWO_POW_32;
        }
        to_uint32(self.n) * TWO_POW_NEG_32
    }
}

/// Format a number the way the reference seeds format it before hashing.
///
/// Integers print without a fractional part, other values print their
/// shortest round-trip form, switching to exponent notation below `1e-6`
/// and from `1e21` upward.
#[must_use]
pub fn number_key(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        format!("{value}")
    } else {
        let exp = format!("{value:e}");
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exp,
        }
    }
}

/// The Alea generator state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alea {
    s0: f64,
    s1: f64,
    s2: f64,
    c: f64,
}

impl Alea {
    /// Seed from a single string key.
    #[must_use]
    pub fn new(seed: &str) -> Self {
        Self::with_args(&[seed])
    }

    /// Seed from an integer, hashed through its decimal form.
    #[must_use]
    pub fn from_seed_u64(seed: u64) -> Self {
        Self::new(&seed.to_string())
    }

    /// Seed from a floating-point number, hashed through [`number_key`].
    #[must_use]
    pub fn from_seed_f64(seed: f64) -> Self {
        Self::new(&number_key(seed))
    }

    /// Seed from several keys, each folded into all three state words.
    #[must_use]
    pub fn with_args(args: &[&str]) -> Self {
        let mut mash = Mash::new();
        let mut s0 = mash.hash(" ");
        let mut s1 = mash.hash(" ");
        let mut s2 = mash.hash(" ");

        for arg in args {
            s0 -= mash.hash(arg);
            if s0 < 0.0 {
                s0 += 1.0;
            }
            s1 -= mash.hash(arg);
            if s1 < 0.0 {
                s1 += 1.0;
            }
            s2 -= mash.hash(arg);
            if s2 < 0.0 {
                s2 += 1.0;
            }
        }

        Self { s0, s1, s2, c: 1.0 }
    }

    /// Next value in `[0, 1)`.
    pub fn random(&mut self) -> f64 {
        let t = 2_091_639.0 * self.s0 + self.c * TWO_POW_NEG_32;
        self.s0 = self.s1;
        self.s1 = self.s2;
        self.c = t.trunc();
        self.s2 = t - self.c;
        self.s2
    }

    /// Uniform integer in `[min, max]` inclusive.
    #[allow(clippy::cast_possible_truncation)]
    pub fn randint(&mut self, min: i64, max: i64) -> i64 {
        let span = (max - min + 1) as f64;
        min + (span * self.random()).floor() as i64
    }

    /// Fair coin flip.
    pub fn coin(&mut self) -> bool {
        self.randint(0, 1) == 1
    }

    /// Raw state bits, for hashing and comparison.
    #[must_use]
    pub fn fingerprint(&self) -> [u64; 4] {
        [
            self.s0.to_bits(),
            self.s1.to_bits(),
            self.s2.to_bits(),
            self.c.to_bits(),
        ]
    }

    /// Fisher-Yates shuffle from the back of the slice.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.randint(0, i as i64) as usize;
            items.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_vector() {
        let mut rng = Alea::with_args(&["my", "3", "seeds"]);
        assert_eq!(rng.random(), 0.308_021_893_259_137_87);
        assert_eq!(rng.random(), 0.519_045_062_130_317_1);
        assert_eq!(rng.random(), 0.436_352_622_928_097_84);
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = Alea::from_seed_u64(42);
        let mut b = Alea::new("42");
        for _ in 0..100 {
            assert_eq!(a.random().to_bits(), b.random().to_bits());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = Alea::from_seed_u64(1);
        let mut b = Alea::from_seed_u64(2);
        let same = (0..20).filter(|_| a.random() == b.random()).count();
        assert!(same < 20);
    }

    #[test]
    fn test_random_range() {
        let mut rng = Alea::new("range");
        for _ in 0..10_000 {
            let value = rng.random();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_randint_inclusive() {
        let mut rng = Alea::new("dice");
        let mut seen = [false; 6];
        for _ in 0..1_000 {
            let roll = rng.randint(1, 6);
            assert!((1..=6).contains(&roll));
            seen[(roll - 1) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = Alea::new("shuffle");
        let mut items: Vec<u32> = (0..50).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
        assert_ne!(items, sorted);
    }

    #[test]
    fn test_shuffle_small_slices() {
        let mut rng = Alea::new("tiny");
        let mut empty: [u8; 0] = [];
        rng.shuffle(&mut empty);
        let mut one = [9];
        rng.shuffle(&mut one);
        assert_eq!(one, [9]);
    }

    #[test]
    fn test_number_key() {
        assert_eq!(number_key(42.0), "42");
        assert_eq!(number_key(0.5), "0.5");
        assert_eq!(number_key(-3.0), "-3");
        assert_eq!(number_key(0.0), "0");
        assert_eq!(number_key(1.5e-7), "1.5e-7");
        assert_eq!(number_key(1e21), "1e+21");
    }

    #[test]
    fn test_state_serde_continues_stream() {
        let mut rng = Alea::new("persist");
        rng.random();
        let bytes = bincode::serialize(&rng).unwrap();
        let mut restored: Alea = bincode::deserialize(&bytes).unwrap();
        assert_eq!(rng.random().to_bits(), restored.random().to_bits());
    }
}
