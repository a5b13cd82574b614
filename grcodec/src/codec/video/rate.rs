use log::debug;

pub const MIN_QUANTIZATION_LEVEL: u8 = 1;
pub const MAX_QUANTIZATION_LEVEL: u8 = 51;

/// Steers the quantization level towards a target average of bits per frame.
///
/// Encoder and decoder both feed it the bits each frame occupied, so they
/// arrive at the same level without it being transmitted.
///
/// Only frame bits count towards the average: the kind bit and the frame
/// payload. The stream header is excluded, so the average of a short
/// sequence is not inflated by its fixed 105 or 145 header bits.
#[derive(Debug, Clone)]
pub struct RateController {
    target: u32,
    total_bits: u64,
    frames: u64,
}

impl RateController {
    /// `None` when `target` is 0.
    pub fn new(target: u32) -> Option<Self> {
        (target > 0).then_some(Self {
            target,
            total_bits: 0,
            frames: 0,
        })
    }

    /// Accounts for one finished frame and returns the level for the next.
    pub fn update(&mut self, frame_bits: u64, level: u8) -> u8 {
        self.total_bits += frame_bits;
        self.frames += 1;

        let average = self.total_bits as f64 / self.frames as f64;
        let target = self.target as f64;

        let next = if average > target {
            MAX_QUANTIZATION_LEVEL.min(level.saturating_add(1))
        } else if average < 0.9 * target {
            MIN_QUANTIZATION_LEVEL.max(level.saturating_sub(1))
        } else {
            level
        };

        if next != level {
            debug!("rate control: average {average:.0} bits/frame, level {level} -> {next}");
        }
        next
    }

    pub fn average(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.total_bits as f64 / self.frames as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_without_target() {
        assert!(RateController::new(0).is_none());
    }

    #[test]
    fn adjusts_towards_target() {
        let mut rc = RateController::new(1000).unwrap();
        assert_eq!(rc.update(1500, 10), 11);
        // average 1250
        assert_eq!(rc.update(1000, 11), 12);
        // average 1000: inside the dead band
        assert_eq!(rc.update(500, 12), 12);
        // average 800
        assert_eq!(rc.update(200, 12), 11);
        assert_eq!(rc.average(), 800.0);
    }

    #[test]
    fn level_limits() {
        let mut rc = RateController::new(10).unwrap();
        assert_eq!(rc.update(1_000_000, 51), 51);
        assert_eq!(rc.update(1_000_000, 200), 51);

        let mut rc = RateController::new(1_000_000).unwrap();
        assert_eq!(rc.update(0, 1), 1);
    }
}
