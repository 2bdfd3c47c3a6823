mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./audiosqueeze.toml",
        "~/.config/audiosqueeze/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let pipeline = &config.pipeline;

    if pipeline.ceiling_bytes == 0 {
        anyhow::bail!("Size ceiling cannot be 0");
    }

    if pipeline.candidates_kbps.is_empty() {
        anyhow::bail!("At least one candidate bitrate is required");
    }

    if pipeline.candidates_kbps.iter().any(|b| b.kbps() == 0) {
        anyhow::bail!("Candidate bitrates must be greater than 0");
    }

    // Greedy first-fit relies on highest quality coming first
    if pipeline.candidates_kbps.windows(2).any(|w| w[0] <= w[1]) {
        anyhow::bail!(
            "Candidate bitrates must be strictly descending: {:?}",
            pipeline.candidates_kbps
        );
    }

    if pipeline.conversion_bitrate_kbps.kbps() == 0 {
        anyhow::bail!("Conversion bitrate must be greater than 0");
    }

    let source = normalize_extension(&pipeline.source_extension);
    let target = normalize_extension(&pipeline.target_extension);
    if source.is_empty() || target.is_empty() {
        anyhow::bail!("Source and target extensions must not be empty");
    }
    if source == target {
        anyhow::bail!("Source and target extensions must differ (both '{}')", source);
    }

    if config.encoder.compression_level > 10 {
        anyhow::bail!(
            "Compression level must be between 0 and 10, got {}",
            config.encoder.compression_level
        );
    }

    if let Some(ref path) = config.encoder.ffmpeg_path {
        if !path.exists() {
            tracing::warn!("Configured ffmpeg path does not exist: {:?}", path);
        }
    }

    if !pipeline.directory.exists() {
        tracing::warn!("Audio directory does not exist: {:?}", pipeline.directory);
    }

    Ok(())
}

/// Lowercase an extension and strip a leading dot.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiosqueeze_av::{AudioCodec, Bitrate};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.pipeline.ceiling_bytes, 25 * 1024 * 1024);
        assert_eq!(config.pipeline.candidates_kbps.len(), 6);
        assert_eq!(config.pipeline.candidates_kbps[0], Bitrate::from_kbps(64));
        assert_eq!(config.pipeline.conversion_bitrate_kbps, Bitrate::from_kbps(64));
        assert_eq!(config.encoder.codec, AudioCodec::Opus);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audiosqueeze.toml");
        fs::write(
            &path,
            r#"
[pipeline]
directory = "/srv/audio"
ceiling_bytes = 1048576
candidates_kbps = [96, 64, 32]

[encoder]
codec = "vorbis"
compression_level = 5
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.pipeline.directory, Path::new("/srv/audio"));
        assert_eq!(config.pipeline.ceiling_bytes, 1_048_576);
        assert_eq!(
            config.pipeline.candidates_kbps,
            vec![
                Bitrate::from_kbps(96),
                Bitrate::from_kbps(64),
                Bitrate::from_kbps(32)
            ]
        );
        assert_eq!(config.pipeline.target_extension, "webm");
        assert_eq!(config.encoder.codec, AudioCodec::Vorbis);
        assert_eq!(config.encoder.settings().compression_level, 5);
    }

    #[test]
    fn test_rejects_ascending_candidates() {
        let mut config = Config::default();
        config.pipeline.candidates_kbps = vec![Bitrate::from_kbps(32), Bitrate::from_kbps(64)];
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("strictly descending"));
    }

    #[test]
    fn test_rejects_zero_ceiling() {
        let mut config = Config::default();
        config.pipeline.ceiling_bytes = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_same_extensions() {
        let mut config = Config::default();
        config.pipeline.source_extension = ".WEBM".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_compression_level_out_of_range() {
        let mut config = Config::default();
        config.encoder.compression_level = 11;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[pipeline\nceiling_bytes = ").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(".WMA"), "wma");
        assert_eq!(normalize_extension(" webm "), "webm");
    }
}
