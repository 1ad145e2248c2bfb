//! Presets command - show the capture preset table

use anyhow::{Context, Result};
use clap::Args;
use pirec_core::config::{Preset, PresetValues, BASELINE_PRESET};
use serde::Serialize;

/// Arguments for the presets command
#[derive(Args)]
pub struct PresetsArgs {
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct PresetEntry {
    name: &'static str,
    baseline: bool,
    #[serde(flatten)]
    values: PresetValues,
}

/// Print every preset with its values
pub fn presets(args: PresetsArgs) -> Result<()> {
    if args.json {
        let entries: Vec<PresetEntry> = Preset::ALL
            .iter()
            .map(|preset| PresetEntry {
                name: preset.name(),
                baseline: *preset == BASELINE_PRESET,
                values: preset.values(),
            })
            .collect();
        let json = serde_json::to_string_pretty(&entries).context("Failed to encode presets")?;
        println!("{}", json);
        return Ok(());
    }

    println!(
        "{:<15} {:>10} {:>5} {:>10} {:>8} {:>8}",
        "PRESET", "SIZE", "FPS", "BITRATE", "BUFFERS", "DENOISE"
    );
    for preset in Preset::ALL {
        let values = preset.values();
        let marker = if preset == BASELINE_PRESET { "*" } else { "" };
        println!(
            "{:<15} {:>10} {:>5} {:>10} {:>8} {:>8}",
            format!("{}{}", preset.name(), marker),
            values.resolution.to_string(),
            values.frame_rate_hz,
            values.bitrate_bps,
            values.buffer_count,
            values.denoise.to_string(),
        );
    }
    println!();
    println!("* baseline for fields neither the preset nor the command line sets");

    Ok(())
}
