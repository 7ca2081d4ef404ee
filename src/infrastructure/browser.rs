//! Browser rendering abstraction
//!
//! A [`BrowserLauncher`] starts a fresh, exclusively owned browser; the
//! resulting [`BrowserSession`] navigates, waits for content and hands back
//! the rendered HTML. DOM queries run on that HTML snapshot.
//!
//! [`BrowserGuard`] scopes a session to one job: `release()` closes it on the
//! normal path, and dropping an unreleased guard (cancellation, panic) spawns
//! the close on the runtime instead.

pub mod chromium;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub use chromium::ChromiumLauncher;

#[derive(Error, Debug, Clone)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Failed to read rendered document: {0}")]
    Document(String),

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Failed to close browser: {0}")]
    Close(String),
}

/// Starts a new browser instance for a single job
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// One live browser with a single page
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Load `url` in the session's page
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Wait until `selector` matches at least one element.
    ///
    /// Returns `Ok(false)` when `timeout` elapses first.
    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, BrowserError>;

    /// Serialized HTML of the current document state
    async fn content(&mut self) -> Result<String, BrowserError>;

    /// Shut the browser down and release its process
    async fn close(self: Box<Self>) -> Result<(), BrowserError>;
}

/// Scoped owner of a browser session.
pub struct BrowserGuard {
    session: Option<Box<dyn BrowserSession>>,
    label: String,
    runtime_handle: tokio::runtime::Handle,
}

impl BrowserGuard {
    /// Launch a browser and take ownership of it
    pub async fn acquire(
        launcher: &Arc<dyn BrowserLauncher>,
        label: impl Into<String>,
    ) -> Result<Self, BrowserError> {
        let session = launcher.launch().await?;
        Ok(Self {
            session: Some(session),
            label: label.into(),
            runtime_handle: tokio::runtime::Handle::current(),
        })
    }

    /// Borrow the live session.
    ///
    /// The session is only taken out by `release`, which consumes the guard,
    /// so it is always present here.
    pub fn session(&mut self) -> Result<&mut (dyn BrowserSession + 'static), BrowserError> {
        self.session.as_deref_mut().ok_or_else(|| {
            BrowserError::Document(format!("{}: browser already released", self.label))
        })
    }

    /// Close the browser, consuming the guard. Close failures are logged only.
    pub async fn release(mut self) {
        if let Some(session) = self.session.take() {
            match session.close().await {
                Ok(()) => debug!("[{}] browser released", self.label),
                Err(e) => warn!("[{}] browser close failed: {}", self.label, e),
            }
        }
    }
}

impl Drop for BrowserGuard {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            let label = std::mem::take(&mut self.label);
            self.runtime_handle.spawn(async move {
                match session.close().await {
                    Ok(()) => debug!("[{}] browser released on drop", label),
                    Err(e) => warn!("[{}] browser close on drop failed: {}", label, e),
                }
            });
        }
    }
}
