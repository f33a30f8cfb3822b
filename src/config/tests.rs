use super::loading::parse_config;
use super::validation::validate_config;
use super::*;
use serial_test::serial;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Run `f` with XDG_CONFIG_HOME pointing at `dir`, restoring it afterwards.
fn with_config_home<T>(dir: &Path, f: impl FnOnce() -> T) -> T {
    let original = std::env::var("XDG_CONFIG_HOME").ok();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", dir);
    }

    let result = f();

    unsafe {
        match original {
            Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }
    result
}

#[test]
fn test_empty_config_uses_defaults() {
    let config = parse_config("").unwrap();
    assert_eq!(config, ScrimConfig::default());
    assert_eq!(config.controller_settings(), ControllerSettings::default());
    assert_eq!(config.frame_interval(), Duration::from_millis(16));
}

#[test]
fn test_full_config() {
    let config = parse_config(
        r#"
        shade_opaque = true
        keyguard_behind_alpha = 0.35
        darken_while_dragging = false
        frame_interval_ms = 8

        [doze]
        always_on = true
        display_needs_blanking = true
        controls_screen_off = false
        wallpaper_aod_duration_ms = 30000
        wallpaper_fade_out_duration_ms = 250
        "#,
    )
    .unwrap();

    let settings = config.controller_settings();
    assert_eq!(settings.default_scrim_alpha, BUSY_SCRIM_ALPHA);
    assert_eq!(settings.keyguard_behind_alpha, 0.35);
    assert!(!settings.darken_while_dragging);
    assert!(settings.doze.always_on);
    assert!(settings.doze.display_needs_blanking);
    assert!(!settings.doze.controls_screen_off);
    assert_eq!(settings.doze.wallpaper_aod_duration, Duration::from_secs(30));
    assert_eq!(
        settings.doze.wallpaper_fade_out_duration,
        Duration::from_millis(250)
    );
    assert_eq!(config.frame_interval(), Duration::from_millis(8));
}

#[test]
fn test_partial_doze_table() {
    let config = parse_config("[doze]\nalways_on = true\n").unwrap();
    let doze = config.doze.parameters();
    assert!(doze.always_on);
    assert_eq!(doze.controls_screen_off, DEFAULT_CONTROLS_SCREEN_OFF);
    assert_eq!(
        doze.wallpaper_aod_duration,
        Duration::from_millis(DEFAULT_WALLPAPER_AOD_DURATION_MS)
    );
}

#[test]
fn test_validation_rejects_alpha_out_of_range() {
    for alpha in [-0.1, 1.5, f32::NAN] {
        let config = ScrimConfig {
            keyguard_behind_alpha: Some(alpha),
            ..ScrimConfig::default()
        };
        assert!(validate_config(&config).is_err(), "{alpha} was accepted");
    }

    let config = ScrimConfig {
        keyguard_behind_alpha: Some(1.0),
        ..ScrimConfig::default()
    };
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_validation_frame_interval_bounds() {
    let mut config = ScrimConfig::default();

    config.frame_interval_ms = Some(0);
    assert!(validate_config(&config).is_err());

    config.frame_interval_ms = Some(MAXIMUM_FRAME_INTERVAL_MS + 1);
    assert!(validate_config(&config).is_err());

    config.frame_interval_ms = Some(MINIMUM_FRAME_INTERVAL_MS);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_validation_durations() {
    let mut config = ScrimConfig::default();
    config.doze.wallpaper_aod_duration_ms = Some(MAXIMUM_WALLPAPER_AOD_DURATION_MS + 1);
    let err = validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("wallpaper_aod_duration_ms"));

    config.doze.wallpaper_aod_duration_ms = Some(0);
    config.doze.wallpaper_fade_out_duration_ms = Some(MAXIMUM_WALLPAPER_FADE_OUT_DURATION_MS + 1);
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_parse_error_is_reported() {
    assert!(parse_config("keyguard_behind_alpha = \"dark\"").is_err());
}

#[test]
#[serial]
fn test_load_without_file_uses_defaults() {
    let temp_dir = tempdir().unwrap();
    let result = with_config_home(temp_dir.path(), load);
    assert_eq!(result.unwrap(), ScrimConfig::default());
}

#[test]
#[serial]
fn test_load_from_config_home() {
    let temp_dir = tempdir().unwrap();
    let config_dir = temp_dir.path().join("scrimctl");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("scrimctl.toml"),
        "keyguard_behind_alpha = 0.4\n",
    )
    .unwrap();

    let (path, config) = with_config_home(temp_dir.path(), || {
        (get_config_path().unwrap(), load().unwrap())
    });
    assert_eq!(path, config_dir.join("scrimctl.toml"));
    assert_eq!(config.keyguard_behind_alpha, Some(0.4));
}

#[test]
#[serial]
fn test_load_reports_invalid_file() {
    let temp_dir = tempdir().unwrap();
    let config_dir = temp_dir.path().join("scrimctl");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("scrimctl.toml"), "frame_interval_ms = 0\n").unwrap();

    let result = with_config_home(temp_dir.path(), load);
    assert!(result.is_err());
}

#[test]
fn test_load_from_missing_path_fails() {
    let temp_dir = tempdir().unwrap();
    let result = load_from_path(&temp_dir.path().join("missing.toml"));
    assert!(result.is_err());
}
