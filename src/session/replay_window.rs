//! Sliding-bitmap anti-replay window.
//!
//! Tracks which of the last `W` receive counters have already been
//! accepted. `W` must be a power of two (enforced by `SageConfig::validate`)
//! so the bitmap index is a cheap mask instead of a modulo.

/// Accepts counters no more than `width` below the highest counter seen so
/// far, and only once each.
pub struct ReplayWindow {
    width: u32,
    highest: Option<u64>,
    bitmap: Vec<u64>,
}

const WORD_BITS: u32 = 64;

impl ReplayWindow {
    pub fn new(width: u32) -> Self {
        assert!(width > 0 && width.is_power_of_two(), "replay window width must be a nonzero power of two");
        let words = (width as usize).div_ceil(WORD_BITS as usize);
        Self {
            width,
            highest: None,
            bitmap: vec![0u64; words],
        }
    }

    /// Check and record `counter`. Returns `true` if newly accepted,
    /// `false` if it is outside the window or already seen (a replay).
    pub fn check_and_set(&mut self, counter: u64) -> bool {
        match self.highest {
            None => {
                self.highest = Some(counter);
                self.set_bit(0);
                true
            }
            Some(highest) if counter > highest => {
                let advance = counter - highest;
                self.shift(advance);
                self.highest = Some(counter);
                self.set_bit(0);
                true
            }
            Some(highest) => {
                let age = highest - counter;
                if age >= self.width as u64 {
                    return false;
                }
                let idx = age as u32;
                if self.test_bit(idx) {
                    false
                } else {
                    self.set_bit(idx);
                    true
                }
            }
        }
    }

    /// Shift the window forward by `advance` slots, dropping bits that fall
    /// off the trailing edge.
    fn shift(&mut self, advance: u64) {
        if advance >= self.width as u64 {
            for word in &mut self.bitmap {
                *word = 0;
            }
            return;
        }
        let advance = advance as u32;
        let word_shift = (advance / WORD_BITS) as usize;
        let bit_shift = advance % WORD_BITS;
        let words = self.bitmap.len();

        let mut shifted = vec![0u64; words];
        for i in (0..words).rev() {
            let src = i.checked_sub(word_shift);
            if let Some(src) = src {
                let mut value = self.bitmap[src] << bit_shift;
                if bit_shift > 0 && src > 0 {
                    value |= self.bitmap[src - 1] >> (WORD_BITS - bit_shift);
                }
                shifted[i] = value;
            }
        }
        self.bitmap = shifted;
    }

    fn set_bit(&mut self, idx: u32) {
        let word = (idx / WORD_BITS) as usize;
        let bit = idx % WORD_BITS;
        if let Some(w) = self.bitmap.get_mut(word) {
            *w |= 1u64 << bit;
        }
    }

    fn test_bit(&self, idx: u32) -> bool {
        let word = (idx / WORD_BITS) as usize;
        let bit = idx % WORD_BITS;
        self.bitmap.get(word).map(|w| w & (1u64 << bit) != 0).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_strictly_increasing_counters() {
        let mut window = ReplayWindow::new(64);
        for i in 0..10 {
            assert!(window.check_and_set(i));
        }
    }

    #[test]
    fn rejects_exact_replay() {
        let mut window = ReplayWindow::new(64);
        assert!(window.check_and_set(5));
        assert!(!window.check_and_set(5));
    }

    #[test]
    fn accepts_reordered_counter_within_window() {
        let mut window = ReplayWindow::new(64);
        assert!(window.check_and_set(10));
        assert!(window.check_and_set(8));
        assert!(!window.check_and_set(8));
    }

    #[test]
    fn rejects_counter_older_than_window() {
        let mut window = ReplayWindow::new(64);
        assert!(window.check_and_set(1000));
        assert!(!window.check_and_set(1000 - 64));
    }

    #[test]
    fn large_forward_jump_resets_window_cleanly() {
        let mut window = ReplayWindow::new(64);
        assert!(window.check_and_set(5));
        assert!(window.check_and_set(1_000_000));
        assert!(window.check_and_set(999_999));
        assert!(!window.check_and_set(999_999));
    }

    #[test]
    fn window_width_must_be_power_of_two() {
        let result = std::panic::catch_unwind(|| ReplayWindow::new(100));
        assert!(result.is_err());
    }
}
