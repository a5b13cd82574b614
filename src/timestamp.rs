use std::time::Duration;

/// Formats seconds as `HH:MM:SS.mmm`; hours widen past 99.
pub fn time_str(sec: f64) -> String {
    let ms = (sec.max(0.0) * 1000.0).round() as u64;
    let hours = ms / 3_600_000;
    let minutes = ms % 3_600_000 / 60_000;
    let seconds = ms % 60_000 / 1000;
    let milliseconds = ms % 1000;

    format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
}

pub fn elapsed_str(elapsed: Duration) -> String {
    time_str(elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_components() {
        assert_eq!(time_str(0.0), "00:00:00.000");
        assert_eq!(time_str(3723.456), "01:02:03.456");
        assert_eq!(time_str(360_000.0), "100:00:00.000");
        assert_eq!(elapsed_str(Duration::from_millis(61_005)), "00:01:01.005");
    }
}
