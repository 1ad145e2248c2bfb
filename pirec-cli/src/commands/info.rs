//! Info command - check the external tools pirec drives

use anyhow::Result;
use pirec_core::config::{ConfigFile, Preset, BASELINE_PRESET};
use pirec_core::process::ExternalCommand;

/// First non-empty line a tool prints for its version flag, if it runs
async fn tool_version(binary: &str, version_flag: &str) -> Option<String> {
    let output = ExternalCommand::new(binary)
        .arg(version_flag)
        .to_command()
        .output()
        .await
        .ok()?;

    // rpicam-vid prints its version to stderr on some builds
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).into_owned()
    } else {
        String::from_utf8_lossy(&output.stdout).into_owned()
    };
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Show tool availability and the active configuration
pub async fn info() -> Result<()> {
    println!("pirec - System Information\n");

    let file = ConfigFile::load_or_default();
    let path = ConfigFile::default_path();

    println!("Configuration:");
    println!(
        "  File:          {} ({})",
        path.display(),
        if path.exists() { "found" } else { "not found, using defaults" }
    );
    println!(
        "  Default mode:  {}",
        file.defaults.mode.as_deref().unwrap_or(BASELINE_PRESET.name())
    );
    println!("  Presets:       {}", Preset::names());
    println!();

    println!("Tools:");
    let mut missing = false;
    for (label, binary, flag) in [
        ("rpicam-vid", file.tools.rpicam_vid.as_str(), "--version"),
        ("ffmpeg", file.tools.ffmpeg.as_str(), "-version"),
    ] {
        match tool_version(binary, flag).await {
            Some(version) => println!("  [OK] {:<11} {}", label, version),
            None => {
                missing = true;
                println!("  [!!] {:<11} not found ({})", label, binary);
            }
        }
    }

    if missing {
        println!();
        println!("Install the missing tools:");
        println!("  sudo apt install rpicam-apps ffmpeg");
        println!("or point [tools] in the config file at them.");
    }

    Ok(())
}
