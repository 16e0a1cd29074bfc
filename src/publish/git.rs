use crate::error::{DigestError, Result};
use chrono::{DateTime, TimeZone};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info};

/// Commit message for a dashboard refresh at `at`
pub fn commit_message<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("Dashboard update {}", at.format("%H:%M"))
}

/// Commits and pushes the working tree of a repository
#[derive(Debug, Clone)]
pub struct GitPublisher {
    repo_dir: PathBuf,
}

impl GitPublisher {
    pub fn new(repo_dir: PathBuf) -> Self {
        Self { repo_dir }
    }

    /// Stage everything, commit with `message` and push
    pub async fn publish(&self, message: &str) -> Result<()> {
        self.git(&["add", "."]).await?;
        self.git(&["commit", "-m", message]).await?;
        self.git(&["push"]).await?;

        info!("🚀 Git push successful");
        Ok(())
    }

    async fn git(&self, args: &[&str]) -> Result<()> {
        debug!("git {}", args.join(" "));

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            // `git commit` reports "nothing to commit" on stdout
            let detail = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(DigestError::Publish(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                detail.trim()
            )));
        }

        Ok(())
    }
}
