//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use vedit_media::TranscodeRunner;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Staging directory for per-job temporary files
    pub staging_dir: PathBuf,
    /// Wall-clock timeout per transcoder run
    pub transcode_timeout: Duration,
    /// Transcoder binary to launch
    pub ffmpeg_binary: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("/tmp/vedit"),
            transcode_timeout: Duration::from_secs(300), // 5 minutes
            ffmpeg_binary: "ffmpeg".to_string(),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            staging_dir: std::env::var("VEDIT_STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/vedit")),
            transcode_timeout: Duration::from_secs(
                std::env::var("VEDIT_TRANSCODE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            ffmpeg_binary: std::env::var("VEDIT_FFMPEG_BIN")
                .unwrap_or_else(|_| "ffmpeg".to_string()),
        }
    }

    /// Build a transcode runner from this config.
    pub fn runner(&self) -> TranscodeRunner {
        TranscodeRunner::new()
            .with_binary(&self.ffmpeg_binary)
            .with_timeout(self.transcode_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.transcode_timeout, Duration::from_secs(300));
        assert_eq!(cfg.ffmpeg_binary, "ffmpeg");
    }
}
