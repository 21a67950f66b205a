//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.encoder.frame_rate == 0 {
            return Err(ConfigError::ValidationError(
                "encoder.frame_rate must be > 0".into(),
            ));
        }
        if self.encoder.crf > 51 || self.encoder.qp > 51 {
            return Err(ConfigError::ValidationError(
                "encoder.crf and encoder.qp must be between 0 and 51".into(),
            ));
        }
        if self.encoder.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "encoder.timeout_secs must be > 0".into(),
            ));
        }
        if self.encoder.ffmpeg_path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "encoder.ffmpeg_path must not be empty".into(),
            ));
        }
        if self.encoder.output.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "encoder.output must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_parallel_workers() {
        let mut config = Config::default();
        config.processing.parallel_workers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("parallel_workers"));
    }

    #[test]
    fn test_validate_rejects_zero_frame_rate() {
        let mut config = Config::default();
        config.encoder.frame_rate = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("frame_rate"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_quality() {
        let mut config = Config::default();
        config.encoder.qp = 52;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("encoder.qp"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.encoder.timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_validate_rejects_zero_max_dimension() {
        let mut config = Config::default();
        config.limits.max_image_dimension = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_image_dimension"));
    }
}
