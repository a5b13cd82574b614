use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

pub fn create_progress_bar(multi: &MultiProgress, total_frames: u64) -> Result<ProgressBar> {
    let pb = multi.add(ProgressBar::new(total_frames));
    pb.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} frames ({percent}%)\n{msg} | elapsed: {elapsed_precise} | ETA: {eta_precise}",
    )?);
    Ok(pb)
}

/// A bar when `--progress` is on, nothing otherwise.
pub fn maybe_progress_bar(
    multi: Option<&MultiProgress>,
    total_frames: u64,
) -> Result<Option<ProgressBar>> {
    multi
        .map(|m| create_progress_bar(m, total_frames))
        .transpose()
}
