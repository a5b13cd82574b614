//! Running XOR-shift checksum over 16-bit PCM blocks.
//!
//! Each sample is folded into a 32-bit state which is then scrambled with a
//! xorshift32 step (shifts 13, 17, 5). The state starts from a fixed non-zero
//! seed for every block.

pub const XORSHIFT_SEED: u32 = 0x92D6_8CA2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    pub const fn new() -> Self {
        Self {
            state: XORSHIFT_SEED,
        }
    }

    #[inline(always)]
    pub const fn update(mut self, sample: i16) -> Self {
        let mut x = self.state ^ (sample as u16 as u32);
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        self
    }

    pub const fn value(&self) -> u32 {
        self.state
    }
}

impl Default for XorShift32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Checksum of one block of samples.
pub fn block_checksum(samples: &[i16]) -> u32 {
    samples
        .iter()
        .fold(XorShift32::new(), |acc, &s| acc.update(s))
        .value()
}

#[test]
fn test_block_checksum() {
    assert_eq!(block_checksum(&[]), XORSHIFT_SEED);

    let a = block_checksum(&[1, 2, 3, 4]);
    let b = block_checksum(&[1, 2, 4, 3]);
    assert_ne!(a, b);
    assert_eq!(a, block_checksum(&[1, 2, 3, 4]));

    // a zero sample still advances the state
    assert_ne!(block_checksum(&[0]), XORSHIFT_SEED);
    assert_ne!(block_checksum(&[-1]), block_checksum(&[1]));
}
