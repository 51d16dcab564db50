//! Configuration loading for the CLI.

use crate::error::{CliError, Result};
use gleaner_extractor::ExtractorConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path of the per-user configuration file, if a config directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gleaner").join("config.toml"))
}

/// Resolve the extractor configuration.
///
/// Precedence: an explicit file, then a named preset, then the per-user
/// file when present, then the defaults. The result is always validated.
pub fn load_config(path: Option<&Path>, preset: Option<&str>) -> Result<ExtractorConfig> {
    let user_file = user_config_path().filter(|p| p.exists());
    resolve(path, preset, user_file.as_deref())
}

fn resolve(
    path: Option<&Path>,
    preset: Option<&str>,
    user_file: Option<&Path>,
) -> Result<ExtractorConfig> {
    let config = if let Some(path) = path {
        debug!("Loading configuration from {}", path.display());
        ExtractorConfig::from_file(path)?
    } else if let Some(name) = preset {
        ExtractorConfig::preset(name).ok_or_else(|| CliError::UnknownPreset(name.to_string()))?
    } else if let Some(user_file) = user_file {
        debug!("Loading user configuration from {}", user_file.display());
        ExtractorConfig::from_file(user_file)?
    } else {
        ExtractorConfig::default()
    };

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_without_sources() {
        let config = resolve(None, None, None).unwrap();
        assert_eq!(config, ExtractorConfig::default());
    }

    #[test]
    fn test_preset() {
        let config = resolve(None, Some("aggressive"), None).unwrap();
        assert_eq!(config, ExtractorConfig::aggressive());

        let err = resolve(None, Some("turbo"), None).unwrap_err();
        assert!(matches!(err, CliError::UnknownPreset(_)));
    }

    #[test]
    fn test_explicit_file_wins_over_user_file() {
        let explicit = NamedTempFile::new().unwrap();
        std::fs::write(explicit.path(), ExtractorConfig::lenient().to_toml().unwrap()).unwrap();

        let mut user = NamedTempFile::new().unwrap();
        write!(user, "{}", ExtractorConfig::aggressive().to_toml().unwrap()).unwrap();

        let config = resolve(Some(explicit.path()), None, Some(user.path())).unwrap();
        assert_eq!(config, ExtractorConfig::lenient());

        let config = resolve(None, None, Some(user.path())).unwrap();
        assert_eq!(config, ExtractorConfig::aggressive());
    }

    #[test]
    fn test_invalid_file_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[routing]\nsmall_max_chars = \"many\"\n").unwrap();

        let err = resolve(Some(file.path()), None, None).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
