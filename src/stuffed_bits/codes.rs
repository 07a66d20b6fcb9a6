//! Unary, Elias-gamma, Elias-delta and Zeckendorf (Fibonacci) codings over
//! [`super::StuffedBits`].
//!
//! Gamma and delta are encoded exactly as derived in the original: delta's
//! length prefix is itself gamma-coded, rather than a separate code.

use super::StuffedBits;
use crate::bits::count_bits_needed;

impl StuffedBits {
    // ---- unary -----------------------------------------------------------

    /// Write `value` zero bits followed by a terminating one bit.
    pub fn set_unary(&mut self, value: u64) {
        for _ in 0..value {
            self.set_bit(false);
        }
        self.set_bit(true);
    }

    /// Read zero bits up to and including the terminating one bit; return
    /// the count of zero bits seen.
    ///
    /// # Panics
    /// Panics past the logical end of the stream.
    #[must_use]
    pub fn get_unary(&mut self) -> u64 {
        let mut count = 0u64;
        while !self.get_bit() {
            count += 1;
        }
        count
    }

    pub fn set_unary_many(&mut self, values: &[u64]) {
        for &v in values {
            self.set_unary(v);
        }
    }

    pub fn get_unary_many(&mut self, number: usize) -> Vec<u64> {
        (0..number).map(|_| self.get_unary()).collect()
    }

    // ---- Elias gamma -------------------------------------------------------

    /// Write `value` (`>= 1`) as an Elias-gamma code: `k = floor(log2
    /// value)` zero bits, a terminating one, then the low `k` bits of
    /// `value`.
    ///
    /// # Panics
    /// Panics if `value == 0`.
    pub fn set_gamma(&mut self, value: u64) {
        assert!(value >= 1, "gamma coding is defined for values >= 1");
        let k = count_bits_needed(value) - 1;
        self.set_unary(u64::from(k));
        if k > 0 {
            self.set_binary(k, value - (1 << k));
        }
    }

    /// Read an Elias-gamma coded value.
    #[must_use]
    pub fn get_gamma(&mut self) -> u64 {
        let k = self.get_unary() as u32;
        let rem = if k > 0 { self.get_binary(k) } else { 0 };
        (1u64 << k) + rem
    }

    pub fn set_gamma_many(&mut self, values: &[u64]) {
        for &v in values {
            self.set_gamma(v);
        }
    }

    pub fn get_gamma_many(&mut self, number: usize) -> Vec<u64> {
        (0..number).map(|_| self.get_gamma()).collect()
    }

    // ---- Elias delta -------------------------------------------------------

    /// Write `value` (`>= 1`) as an Elias-delta code: the Elias-gamma code
    /// of `k + 1` (where `k = floor(log2 value)`), followed by the low `k`
    /// bits of `value`.
    ///
    /// # Panics
    /// Panics if `value == 0`.
    pub fn set_delta(&mut self, value: u64) {
        assert!(value >= 1, "delta coding is defined for values >= 1");
        let k = count_bits_needed(value) - 1;
        self.set_gamma(u64::from(k) + 1);
        if k > 0 {
            self.set_binary(k, value - (1 << k));
        }
    }

    /// Read an Elias-delta coded value.
    #[must_use]
    pub fn get_delta(&mut self) -> u64 {
        let n = self.get_gamma();
        let k = (n - 1) as u32;
        let rem = if k > 0 { self.get_binary(k) } else { 0 };
        (1u64 << k) + rem
    }

    pub fn set_delta_many(&mut self, values: &[u64]) {
        for &v in values {
            self.set_delta(v);
        }
    }

    pub fn get_delta_many(&mut self, number: usize) -> Vec<u64> {
        (0..number).map(|_| self.get_delta()).collect()
    }

    // ---- Zeckendorf (Fibonacci) ---------------------------------------------

    /// Write `value` (`>= 1`) as its Zeckendorf representation: the
    /// greedy decomposition into non-consecutive Fibonacci numbers `F(2),
    /// F(3), ...`, presence bits emitted low-to-high, followed by a
    /// terminating one bit. The terminator is always adjacent to the
    /// highest set coefficient bit, so "11" can only ever mean "stop" when
    /// decoding.
    ///
    /// # Panics
    /// Panics if `value == 0`, or if `value` exceeds the largest value
    /// representable with the precomputed Fibonacci table (beyond `u64`'s
    /// range, which cannot occur for a `u64` input).
    pub fn set_zeckendorf(&mut self, value: u64) {
        assert!(value >= 1, "Zeckendorf coding is defined for values >= 1");

        let indices = self.zeckendorf_indices(value);
        let highest = *indices.last().expect("decomposition of a positive value is never empty");

        for i in 0..=highest {
            self.set_bit(indices.contains(&i));
        }
        self.set_bit(true); // terminator
    }

    /// Greedily decompose `value` into indices into `self.fib` (ascending).
    fn zeckendorf_indices(&self, value: u64) -> Vec<usize> {
        let mut remaining = value;
        let mut idx = self
            .fib
            .iter()
            .rposition(|&f| f <= remaining)
            .expect("value is within the precomputed Fibonacci range");

        let mut indices = Vec::new();
        loop {
            if self.fib[idx] <= remaining {
                remaining -= self.fib[idx];
                indices.push(idx);
                if remaining == 0 {
                    break;
                }
            }
            idx -= 1;
        }
        indices.reverse();
        indices
    }

    /// Read a Zeckendorf-coded value.
    ///
    /// # Panics
    /// Panics past the logical end of the stream.
    #[must_use]
    pub fn get_zeckendorf(&mut self) -> u64 {
        let mut value = 0u64;
        let mut prev = false;
        let mut idx = 0usize;

        loop {
            let bit = self.get_bit();
            if bit {
                if prev {
                    break;
                }
                value += self.fib[idx];
                prev = true;
            } else {
                prev = false;
            }
            idx += 1;
        }
        value
    }

    pub fn set_zeckendorf_many(&mut self, values: &[u64]) {
        for &v in values {
            self.set_zeckendorf(v);
        }
    }

    pub fn get_zeckendorf_many(&mut self, number: usize) -> Vec<u64> {
        (0..number).map(|_| self.get_zeckendorf()).collect()
    }
}
