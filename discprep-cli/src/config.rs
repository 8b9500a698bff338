// discprep-cli/src/config.rs
//
// Turns parsed arguments into the core RipConfig.

use discprep_core::selection::{AudioPolicy, AudioQuality};
use discprep_core::{RipConfig, RipConfigBuilder};

use crate::cli::{RipArgs, ToolArgs};
use crate::error::CliResult;

/// Builder pre-filled with the tool and endpoint settings.
pub fn tools_builder(tools: &ToolArgs) -> RipConfigBuilder {
    let mut builder = RipConfigBuilder::new()
        .makemkv_path(tools.makemkv.clone())
        .handbrake_path(tools.handbrake.clone())
        .ffmpeg_path(tools.ffmpeg.clone())
        .store_url(&tools.store_url)
        .volumes_root(tools.volumes_root.clone())
        .disc_index(tools.disc_index)
        .max_retries(tools.max_retries)
        .reinsert_timeout_secs(tools.reinsert_timeout);

    if let Some(token) = tools.user_token.as_deref() {
        builder = builder.user_token(token);
    }
    if let Some(dir) = tools.temp_dir.clone() {
        builder = builder.temp_dir(dir);
    }
    builder
}

/// Validated configuration for commands that only need tools and endpoints.
pub fn tools_config(tools: &ToolArgs) -> CliResult<RipConfig> {
    let config = tools_builder(tools).build();
    config.validate()?;
    Ok(config)
}

/// Validated configuration for the `rip` command.
pub fn rip_config(args: &RipArgs) -> CliResult<RipConfig> {
    let mut builder = tools_builder(&args.tools)
        .movies_dir(args.movies_dir.clone())
        .poll_interval_secs(args.poll_interval)
        .analyze_loudness(args.analyze_audio)
        .audio_policy(AudioPolicy {
            quality: AudioQuality::from_str_lossy(&args.audio_quality),
            include_commentary: args.include_commentary,
        });

    if let Some(preset) = args.dvd_preset.as_deref() {
        builder = builder.dvd_preset(preset);
    }
    if let Some(preset) = args.bluray_preset.as_deref() {
        builder = builder.bluray_preset(preset);
    }
    if let Some(topic) = args.ntfy.as_deref() {
        builder = builder.ntfy_topic(topic);
    }

    let config = builder.build();
    config.validate()?;
    Ok(config)
}
