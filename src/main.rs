use anyhow::Result;
use clap::Parser as ClapParser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

use cli::audio::cmd_audio;
use cli::command::{Cli, Commands, LogFormat};
use cli::image::cmd_image;
use cli::info::cmd_info;
use cli::video::cmd_video;
use config::Profile;

mod cli;
mod config;
mod input;
mod raw;
pub(crate) mod timestamp;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let base_level = cli.loglevel.to_level_filter();

    let multi = MultiProgress::new();

    let mut env_builder = env_logger::Builder::from_default_env();
    env_builder.filter_level(base_level);
    match cli.log_format {
        LogFormat::Plain => {
            env_builder.format_timestamp_secs();
        }
        LogFormat::Json => {
            env_builder.format(|buf, record| {
                use std::io::Write;
                let msg = record.args().to_string();
                writeln!(
                    buf,
                    "{{\"ts\":\"{}\",\"lvl\":\"{}\",\"target\":\"{}\",\"msg\":\"{}\"}}",
                    buf.timestamp(),
                    record.level(),
                    record.target(),
                    msg.escape_default()
                )
            });
        }
    }

    let pb = if cli.progress {
        let logger = env_builder.build();
        LogWrapper::new(multi.clone(), logger).try_init()?;
        Some(&multi)
    } else {
        env_builder.try_init()?;
        None
    };

    let profile = Profile::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Image(ref command) => cmd_image(command, &profile)?,
        Commands::Audio(ref command) => cmd_audio(command, &profile)?,
        Commands::Video(ref command) => cmd_video(command, &profile, pb)?,
        Commands::Info(ref args) => cmd_info(args)?,
    }

    Ok(())
}
