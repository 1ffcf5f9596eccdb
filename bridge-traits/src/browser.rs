//! Browser launch abstraction.
//!
//! Opening a URL in the user's default browser is platform-specific (the desktop
//! shim wraps a crate like `open`, mobile hosts delegate to an intent/activity,
//! and a web host just no-ops since the user is already in a browser). The core
//! never shells out directly; it only depends on this trait.

use async_trait::async_trait;

use crate::error::Result;

/// Opens URLs in the user's default browser.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::browser::Browser;
///
/// async fn show_auth_page(browser: &dyn Browser, url: &str) {
///     if browser.open_url(url).await.is_err() {
///         eprintln!("Could not open a browser automatically. Visit: {url}");
///     }
/// }
/// ```
#[async_trait]
pub trait Browser: Send + Sync {
    /// Opens `url` in the host's default browser.
    ///
    /// Failure here is never fatal to a flow: the caller always prints the URL
    /// to the user channel as well, so the user can navigate there manually.
    async fn open_url(&self, url: &str) -> Result<()>;
}

/// A [`Browser`] that never actually opens anything.
///
/// Useful for headless environments and as the default when no host browser
/// launcher has been injected — the device flow and PKCE flow both tolerate
/// `open_url` failing, they just rely on the caller having printed the URL.
#[derive(Debug, Clone, Default)]
pub struct NoopBrowser;

#[async_trait]
impl Browser for NoopBrowser {
    async fn open_url(&self, _url: &str) -> Result<()> {
        Ok(())
    }
}
