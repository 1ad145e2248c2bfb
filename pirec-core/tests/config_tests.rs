//! Integration tests for configuration resolution

use pirec_core::config::{
    resolve, sample_config, CaptureConfig, CaptureOverrides, Codec, ConfigFile, Denoise, Preset,
    Resolution, BASELINE_PRESET,
};
use pirec_core::error::PirecError;
use pirec_core::session::StopCondition;
use tempfile::TempDir;

fn with_mode(mode: &str) -> CaptureOverrides {
    CaptureOverrides {
        mode: Some(mode.to_string()),
        ..Default::default()
    }
}

fn invalid_field(err: PirecError) -> &'static str {
    match err {
        PirecError::InvalidConfiguration { field, .. } => field,
        other => panic!("expected InvalidConfiguration, got {:?}", other),
    }
}

#[test]
fn test_preset_table() {
    assert_eq!(Preset::Wide60.values().resolution, Resolution::new(2304, 1296));
    assert_eq!(Preset::Wide60LowBuf.values().buffer_count, 2);
    assert_eq!(Preset::Wide50.values().frame_rate_hz, 50);
    assert_eq!(Preset::Wide1536p60.values().resolution, Resolution::new(1536, 864));
    assert_eq!(Preset::Full30.values().bitrate_bps, 25_000_000);
    assert_eq!(Preset::P1080_60.values().resolution, Resolution::new(1920, 1080));
    assert!(Preset::ALL.iter().all(|p| p.values().denoise == Denoise::Off));
    assert_eq!(BASELINE_PRESET, Preset::Wide60);
}

#[test]
fn test_preset_without_overrides_yields_preset_values() {
    for preset in Preset::ALL {
        let resolved = resolve(&with_mode(preset.name())).expect("preset resolves");
        let values = preset.values();

        assert_eq!(resolved.preset, preset);
        assert_eq!(resolved.config.resolution, values.resolution);
        assert_eq!(resolved.config.frame_rate_hz, values.frame_rate_hz);
        assert_eq!(resolved.config.bitrate_bps, values.bitrate_bps);
        assert_eq!(resolved.config.buffer_count, values.buffer_count);
        assert_eq!(resolved.config.denoise, values.denoise);
        assert_eq!(resolved.config.codec, Codec::H264);
    }
}

#[test]
fn test_override_beats_preset_and_baseline() {
    let overrides = CaptureOverrides {
        mode: Some("wide50".to_string()),
        size: Some("1280x720".to_string()),
        fps: Some(90),
        bitrate: Some(3_000_000),
        buffers: Some(6),
        codec: Some("hevc".to_string()),
        denoise: Some("on".to_string()),
        duration_secs: Some(12),
    };
    let resolved = resolve(&overrides).unwrap();

    assert_eq!(resolved.preset, Preset::Wide50);
    assert_eq!(resolved.config.resolution, Resolution::new(1280, 720));
    assert_eq!(resolved.config.frame_rate_hz, 90);
    assert_eq!(resolved.config.bitrate_bps, 3_000_000);
    assert_eq!(resolved.config.buffer_count, 6);
    assert_eq!(resolved.config.codec, Codec::Hevc);
    assert_eq!(resolved.config.denoise, Denoise::On);
    assert_eq!(resolved.stop, StopCondition::after_secs(12));
}

#[test]
fn test_unspecified_fields_fall_back_to_preset() {
    let resolved = resolve(&CaptureOverrides {
        mode: Some("wide50".to_string()),
        bitrate: Some(4_000_000),
        ..Default::default()
    })
    .unwrap();

    // From the named preset, not the wide60 baseline
    assert_eq!(resolved.config.frame_rate_hz, 50);
    assert_eq!(resolved.config.buffer_count, 2);
    assert_eq!(resolved.config.bitrate_bps, 4_000_000);
}

#[test]
fn test_unspecified_fields_fall_back_to_baseline() {
    let resolved = resolve(&CaptureOverrides {
        fps: Some(30),
        ..Default::default()
    })
    .unwrap();

    let baseline = BASELINE_PRESET.values();
    assert_eq!(resolved.config.frame_rate_hz, 30);
    assert_eq!(resolved.config.resolution, baseline.resolution);
    assert_eq!(resolved.config.bitrate_bps, baseline.bitrate_bps);
    assert_eq!(resolved.config.buffer_count, baseline.buffer_count);
}

#[test]
fn test_size_parsing() {
    let resolved = resolve(&CaptureOverrides {
        size: Some("2304x1296".to_string()),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(resolved.config.resolution.width, 2304);
    assert_eq!(resolved.config.resolution.height, 1296);

    for bad in ["bad", "0x0"] {
        let err = resolve(&CaptureOverrides {
            size: Some(bad.to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(invalid_field(err), "size");
    }
}

#[test]
fn test_invalid_values_name_their_field() {
    let cases: Vec<(CaptureOverrides, &str)> = vec![
        (CaptureOverrides { fps: Some(0), ..Default::default() }, "fps"),
        (CaptureOverrides { fps: Some(-60), ..Default::default() }, "fps"),
        (CaptureOverrides { bitrate: Some(0), ..Default::default() }, "bitrate"),
        (CaptureOverrides { buffers: Some(-1), ..Default::default() }, "buffers"),
        (CaptureOverrides { codec: Some("av1".to_string()), ..Default::default() }, "codec"),
        (CaptureOverrides { denoise: Some("maybe".to_string()), ..Default::default() }, "denoise"),
        (with_mode("wide240"), "mode"),
        (CaptureOverrides { duration_secs: Some(-5), ..Default::default() }, "dur"),
    ];

    for (overrides, field) in cases {
        let err = resolve(&overrides).unwrap_err();
        assert_eq!(invalid_field(err), field);
    }
}

#[test]
fn test_codec_and_denoise_parsing() {
    assert_eq!("h264".parse::<Codec>().ok(), Some(Codec::H264));
    assert_eq!("HEVC".parse::<Codec>().ok(), Some(Codec::Hevc));
    assert!("h265".parse::<Codec>().is_err());
    assert_eq!("on".parse::<Denoise>().ok(), Some(Denoise::On));
    assert_eq!("off".parse::<Denoise>().ok(), Some(Denoise::Off));
}

#[test]
fn test_full_sensor_warns() {
    let config: CaptureConfig = resolve(&with_mode("full30")).unwrap().config;
    assert!(config.validate_strict().is_ok());
    assert!(!config.validate().is_empty());
}

#[test]
fn test_config_file_sample_parses() {
    let sample = sample_config();
    let config: ConfigFile = toml::from_str(&sample).expect("Sample config should parse");
    assert_eq!(config.tools.rpicam_vid, "rpicam-vid");
    assert_eq!(config.direct.analogue_gain, 4.0);
}

#[test]
fn test_config_file_load_from_disk() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "[defaults]\nmode = \"wide1536p60\"\n\n[tools]\nffmpeg = \"/usr/local/bin/ffmpeg\"\n\n[direct]\nexposure_time_us = 2000\n",
    )
    .expect("Failed to write config");

    let loaded = ConfigFile::load_from(config_path).expect("Failed to load config");
    assert_eq!(loaded.defaults.mode.as_deref(), Some("wide1536p60"));
    assert_eq!(loaded.tools.ffmpeg, "/usr/local/bin/ffmpeg");
    assert_eq!(loaded.tools.rpicam_vid, "rpicam-vid");
    assert_eq!(loaded.direct.exposure_time_us, 2000);
    assert_eq!(loaded.direct.analogue_gain, 4.0);
}

#[test]
fn test_config_file_load_nonexistent() {
    let result = ConfigFile::load_from("/nonexistent/path/config.toml".into());
    assert_eq!(result.expect("missing file is not an error"), ConfigFile::default());
}

#[test]
fn test_config_file_bad_toml() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[tools\nffmpeg = ").unwrap();

    let err = ConfigFile::load_from(path).unwrap_err();
    assert!(matches!(err, PirecError::Config(_)));
}
