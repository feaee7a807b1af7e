//! Structured job logging utilities.

use tracing::{error, info, warn};

/// Job logger for consistent, structured edit-job logging.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    video_id: String,
}

impl JobLogger {
    /// Create a logger for one edit job.
    pub fn new(job_id: impl Into<String>, video_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            video_id: video_id.into(),
        }
    }

    /// Log the start of the job.
    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            video_id = %self.video_id,
            "Edit started: {}", message
        );
    }

    /// Log a warning during the job.
    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            video_id = %self.video_id,
            "Edit warning: {}", message
        );
    }

    /// Log a failure of the job.
    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            video_id = %self.video_id,
            "Edit failed: {}", message
        );
    }

    /// Log successful completion of the job.
    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            video_id = %self.video_id,
            "Edit completed: {}", message
        );
    }

    /// Get the job ID.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_fields() {
        let logger = JobLogger::new("job-123", "vid-1");
        assert_eq!(logger.job_id(), "job-123");
        logger.log_start("staging input");
        logger.log_completion("artifact committed");
    }
}
