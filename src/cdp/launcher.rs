//! Chromium process launcher
//!
//! Spawns a local Chromium with remote debugging enabled on an ephemeral port
//! and reports the DevTools endpoint it announces on stderr. The process and
//! its throw-away profile directory are released on `shutdown` or on drop.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

const DEVTOOLS_BANNER: &str = "DevTools listening on ";

const EXECUTABLE_CANDIDATES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// Options for launching a local browser process
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Explicit executable; discovered when `None`
    pub executable: Option<PathBuf>,
    /// Run without a window
    pub headless: bool,
    /// Extra command-line arguments
    pub args: Vec<String>,
    /// Initial window size
    pub window_size: (u32, u32),
    /// How long to wait for the DevTools banner
    pub startup_timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            args: vec![],
            window_size: (1280, 800),
            startup_timeout: Duration::from_secs(20),
        }
    }
}

/// A running browser process
#[derive(Debug)]
pub struct ChromeProcess {
    child: Child,
    endpoint: String,
    user_data_dir: Option<PathBuf>,
}

impl ChromeProcess {
    /// Launch a browser and wait until its DevTools endpoint is reachable
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        let executable = match &options.executable {
            Some(path) => path.clone(),
            None => find_executable()?,
        };

        let user_data_dir =
            std::env::temp_dir().join(format!("page-crawler-profile-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&user_data_dir)?;

        let args = build_args(options, &user_data_dir);
        info!("Launching browser {} ({} args)", executable.display(), args.len());
        debug!("Browser args: {:?}", args);

        let mut child = Command::new(&executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                let _ = std::fs::remove_dir_all(&user_data_dir);
                Error::browser_launch(format!("Failed to spawn {}: {}", executable.display(), e))
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::browser_launch("Browser stderr was not captured"))?;

        let mut process = Self {
            child,
            endpoint: String::new(),
            user_data_dir: Some(user_data_dir),
        };

        let mut lines = BufReader::new(stderr).lines();
        let wait_for_banner = async {
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        debug!("browser stderr: {}", line);
                        if let Some(endpoint) = parse_devtools_banner(&line) {
                            return Ok(endpoint);
                        }
                    }
                    Ok(None) => {
                        return Err(Error::browser_launch(
                            "Browser exited before announcing its DevTools endpoint",
                        ))
                    }
                    Err(e) => return Err(Error::from(e)),
                }
            }
        };

        let endpoint = match tokio::time::timeout(options.startup_timeout, wait_for_banner).await {
            Ok(Ok(endpoint)) => endpoint,
            Ok(Err(e)) => {
                process.kill().await;
                process.cleanup_profile();
                return Err(e);
            }
            Err(_) => {
                process.kill().await;
                process.cleanup_profile();
                return Err(Error::browser_launch(format!(
                    "Browser did not announce a DevTools endpoint within {:?}",
                    options.startup_timeout
                )));
            }
        };

        // Keep draining stderr so the browser never blocks on a full pipe
        tokio::spawn(async move {
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("browser stderr: {}", line);
            }
        });

        info!("Browser DevTools endpoint: {}", endpoint);
        process.endpoint = endpoint;
        Ok(process)
    }

    /// Browser-level endpoint, `ws://host:port`
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Kill the process, wait for it, and remove the profile directory
    pub async fn shutdown(mut self) -> Result<()> {
        self.kill().await;
        self.cleanup_profile();
        Ok(())
    }

    async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            debug!("Browser process already gone: {}", e);
        }
    }

    fn cleanup_profile(&mut self) {
        if let Some(path) = self.user_data_dir.take() {
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!("Failed to remove browser profile {}: {}", path.display(), e);
            }
        }
    }
}

impl Drop for ChromeProcess {
    fn drop(&mut self) {
        if self.user_data_dir.is_some() {
            warn!("ChromeProcess dropped without shutdown - killing browser");
            let _ = self.child.start_kill();
            self.cleanup_profile();
        }
    }
}

/// Command-line arguments for a launch
pub fn build_args(options: &LaunchOptions, user_data_dir: &Path) -> Vec<String> {
    let mut args = vec![
        "--remote-debugging-port=0".to_string(),
        format!("--user-data-dir={}", user_data_dir.display()),
        format!("--window-size={},{}", options.window_size.0, options.window_size.1),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
    ];

    if options.headless {
        args.push("--headless=new".to_string());
    }

    args.extend(options.args.iter().cloned());
    args.push("about:blank".to_string());
    args
}

/// Extract `ws://host:port` from Chromium's "DevTools listening on ..." line
pub fn parse_devtools_banner(line: &str) -> Option<String> {
    let ws_url = line.split(DEVTOOLS_BANNER).nth(1)?.trim();
    let rest = ws_url.strip_prefix("ws://")?;
    let authority = rest.split('/').next().filter(|a| !a.is_empty())?;
    Some(format!("ws://{}", authority))
}

/// Locate a Chromium executable: `CHROME_BIN`, then well-known names on `PATH`
pub fn find_executable() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CHROME_BIN") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
    }

    #[cfg(target_os = "macos")]
    {
        let path = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if path.exists() {
            return Ok(path);
        }
    }

    EXECUTABLE_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or_else(|| {
            Error::browser_launch(format!(
                "No Chromium executable found (set CHROME_BIN or install one of: {})",
                EXECUTABLE_CANDIDATES.join(", ")
            ))
        })
}
