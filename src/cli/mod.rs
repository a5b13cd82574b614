use std::time::Duration;

use crate::timestamp::elapsed_str;

pub mod audio;
pub mod command;
pub mod image;
pub mod info;
pub mod progress;
pub mod video;

/// Logs sizes, ratio and wall time of a finished encode or decode.
pub(crate) fn log_summary(action: &str, input_bytes: u64, output_bytes: u64, elapsed: Duration) {
    let (raw, coded) = if action == "Encoded" {
        (input_bytes, output_bytes)
    } else {
        (output_bytes, input_bytes)
    };
    let ratio = if coded > 0 {
        raw as f64 / coded as f64
    } else {
        0.0
    };
    let bits_per_byte = if raw > 0 {
        coded as f64 * 8.0 / raw as f64
    } else {
        0.0
    };

    log::info!(
        "{action} {input_bytes} bytes into {output_bytes} bytes | ratio {ratio:.3}:1 ({bits_per_byte:.3} bits per raw byte) | elapsed: {}",
        elapsed_str(elapsed)
    );
}
