//! Opens URLs in the system browser.

use async_trait::async_trait;
use gsa_core::auth::LinkOpener;
use gsa_core::error::{GsaError, Result};
use tokio::process::Command;

/// Spawns the platform's URL handler and returns without waiting for it.
///
/// Handlers run as `tokio::process` children, which the runtime reaps after
/// they are dropped.
#[derive(Debug, Clone, Default)]
pub struct SystemLinkOpener;

impl SystemLinkOpener {
    pub fn new() -> Self {
        Self
    }
}

/// Only http(s) URLs are handed to the shell.
fn ensure_web_url(url: &str) -> Result<()> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(GsaError::InvalidInput(format!("Refusing to open '{}'", url)))
    }
}

/// Handler command lines to try in order. The URL is always one argument
/// of its own and never passes through a shell.
fn handler_commands(url: &str) -> Vec<(&'static str, Vec<String>)> {
    #[cfg(target_os = "windows")]
    {
        vec![(
            "rundll32",
            vec!["url.dll,FileProtocolHandler".to_string(), url.to_string()],
        )]
    }

    #[cfg(target_os = "macos")]
    {
        vec![("open", vec![url.to_string()])]
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        vec![
            ("xdg-open", vec![url.to_string()]),
            ("wslview", vec![url.to_string()]),
        ]
    }
}

fn spawn_handler(url: &str) -> std::io::Result<()> {
    let mut last_error = None;
    for (program, args) in handler_commands(url) {
        match Command::new(program).args(&args).spawn() {
            Ok(_child) => return Ok(()),
            Err(e) => {
                tracing::debug!("{} unavailable: {}", program, e);
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| std::io::Error::other("no URL handler")))
}

#[async_trait]
impl LinkOpener for SystemLinkOpener {
    async fn open(&self, url: &str) -> Result<()> {
        ensure_web_url(url)?;
        tracing::debug!("Opening {}", url);
        spawn_handler(url).map_err(|e| GsaError::io(format!("Failed to open {}: {}", url, e)))
    }
}
