//! Target application management
//!
//! The suite normally points at an already-running Helioviewer instance
//! (`HV_BASE_URL`). For local work it can also spawn one from a configured
//! command line and tear it down when the tests finish. Either way the
//! readiness probe runs before the first scenario, so a dead target fails
//! fast instead of as a navigation timeout.

use std::process::{Child, Command, Stdio};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{HarnessError, HarnessResult};

#[derive(Debug, Clone)]
pub struct AppServerConfig {
    /// Shell command that starts the app server, e.g.
    /// `npm run start-server`. None = attach to an external instance.
    pub command: Option<String>,
    pub base_url: String,
    pub startup_timeout: Duration,
}

impl Default for AppServerConfig {
    fn default() -> Self {
        Self {
            command: std::env::var("HV_SERVER_CMD").ok(),
            base_url: "http://127.0.0.1:8080".to_string(),
            startup_timeout: Duration::from_secs(60),
        }
    }
}

/// Handle to the application under test.
pub struct AppServer {
    child: Option<Child>,
    base_url: String,
}

impl AppServer {
    /// Spawn the configured command (if any) and wait until the app answers.
    pub async fn start(config: AppServerConfig) -> HarnessResult<Self> {
        let child = match &config.command {
            Some(command) => {
                info!(%command, "spawning app server");
                let child = Command::new("sh")
                    .arg("-c")
                    .arg(command)
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .spawn()
                    .map_err(|e| {
                        HarnessError::ServerStartup(format!("failed to spawn '{command}': {e}"))
                    })?;
                Some(child)
            }
            None => None,
        };

        let server = Self {
            child,
            base_url: config.base_url.clone(),
        };
        server.wait_until_ready(config.startup_timeout).await?;
        info!(base_url = %server.base_url, "target application is ready");
        Ok(server)
    }

    /// Poll the base URL until it answers or the timeout elapses.
    pub async fn wait_until_ready(&self, timeout: Duration) -> HarnessResult<()> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout {
            attempts += 1;
            match client.get(&self.base_url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) => {
                    warn!(status = %resp.status(), "readiness probe returned non-success");
                }
                Err(e) => {
                    // Connection refused is expected while the app starts.
                    if !e.is_connect() {
                        warn!(error = %e, "readiness probe error");
                    }
                }
            }
            sleep(Duration::from_millis(250)).await;
        }

        Err(HarnessError::TargetUnreachable {
            url: self.base_url.clone(),
            attempts,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            info!(pid = child.id(), "stopping app server");

            #[cfg(unix)]
            {
                use nix::sys::signal::{kill, Signal};
                use nix::unistd::Pid;

                let pid = Pid::from_raw(child.id() as i32);
                if kill(pid, Signal::SIGTERM).is_ok() {
                    std::thread::sleep(Duration::from_millis(500));
                }
            }

            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for AppServer {
    fn drop(&mut self) {
        self.stop();
    }
}
