//! Config command - inspect and check the pirec configuration

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use pirec_core::config::{
    resolve, sample_config, CaptureConfig, CaptureOverrides, ConfigFile, ResolvedCapture,
};

/// Arguments for the config command
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the path to the config file
    Path,

    /// Show what `record` and `direct` will use with no flags given
    Show,

    /// Check the config file, failing on values no recording can use
    Check,

    /// Write a commented config file
    Init {
        /// Force overwrite if file exists
        #[arg(short, long)]
        force: bool,

        /// Print to stdout instead of writing the file
        #[arg(long)]
        stdout: bool,
    },
}

/// Run config subcommand
pub async fn config(args: ConfigArgs) -> Result<()> {
    let path = ConfigFile::default_path();

    match args.command {
        ConfigCommand::Path => {
            let state = if path.exists() { "exists" } else { "not created, defaults apply" };
            println!("{} ({})", path.display(), state);
        }
        ConfigCommand::Show => {
            let file = load(&path)?;
            let settings = Effective::from_file(&file)?;
            settings.print(&file);
        }
        ConfigCommand::Check => {
            let file = load(&path)?;
            let settings = Effective::from_file(&file)?;
            let warnings = settings.warnings();
            if warnings.is_empty() {
                println!("{}: OK", path.display());
            } else {
                for warning in &warnings {
                    println!("Warning: {}", warning);
                }
                println!("{}: usable, {} warning(s)", path.display(), warnings.len());
            }
        }
        ConfigCommand::Init { force, stdout } => {
            if stdout {
                print!("{}", sample_config());
                return Ok(());
            }
            if path.exists() && !force {
                bail!(
                    "{} already exists; use --force to overwrite it",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(&path, sample_config())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Created {}", path.display());
        }
    }

    Ok(())
}

/// Load strictly; `record` and `direct` fall back to defaults, but here a bad
/// file should be reported
fn load(path: &Path) -> Result<ConfigFile> {
    ConfigFile::load_from(path.to_path_buf())
        .with_context(|| format!("Invalid config file {}", path.display()))
}

/// The settings both recording commands end up with when given no flags
struct Effective {
    record: ResolvedCapture,
    direct: CaptureConfig,
}

impl Effective {
    fn from_file(file: &ConfigFile) -> Result<Self> {
        let overrides = CaptureOverrides::default().or_defaults(&file.defaults);
        let record = resolve(&overrides).context("[defaults] does not resolve")?;

        let direct = CaptureConfig::direct_default()
            .with_bitrate(file.direct.bitrate)
            .with_exposure_time_us(file.direct.exposure_time_us)
            .with_analogue_gain(file.direct.analogue_gain);
        direct
            .validate_strict()
            .context("[direct] cannot be recorded")?;

        Ok(Self { record, direct })
    }

    /// Soft warnings from both strategies, prefixed with their section
    fn warnings(&self) -> Vec<String> {
        let record = self
            .record
            .config
            .validate()
            .into_iter()
            .map(|w| format!("[defaults] {}", w));
        let direct = self
            .direct
            .validate()
            .into_iter()
            .map(|w| format!("[direct] {}", w));
        record.chain(direct).collect()
    }

    fn print(&self, file: &ConfigFile) {
        let record = &self.record.config;
        println!("record:");
        println!("  Preset:      {}", self.record.preset);
        println!("  Resolution:  {}", record.resolution);
        println!("  Framerate:   {} fps", record.frame_rate_hz);
        println!("  Bitrate:     {} bps", record.bitrate_bps);
        println!("  Buffers:     {}", record.buffer_count);
        println!("  Codec:       {}", record.codec.display_name());
        println!("  Denoise:     {}", record.denoise);
        println!();
        println!("direct:");
        println!("  Output:      {}", file.direct.output.display());
        println!(
            "  Frame time:  {} us at {} fps",
            self.direct.frame_duration_ns() / 1000,
            self.direct.frame_rate_hz
        );
        println!("  Exposure:    {} us", self.direct.exposure_time_us);
        println!("  Gain:        {}", self.direct.analogue_gain);
        println!("  Bitrate:     {} bps", self.direct.bitrate_bps);
        println!();
        println!("tools:");
        println!("  rpicam-vid:  {}", file.tools.rpicam_vid);
        println!("  ffmpeg:      {}", file.tools.ffmpeg);

        for warning in self.warnings() {
            println!("Warning: {}", warning);
        }
    }
}
