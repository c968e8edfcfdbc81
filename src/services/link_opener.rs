//! Opening bookmark URLs in a new browsing context.

use tracing::info;

use crate::types::errors::OpenError;

/// How a link is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenPolicy {
    pub new_context: bool,
    /// The opened page gets no handle back to the opener.
    pub no_opener: bool,
    pub no_referrer: bool,
}

impl OpenPolicy {
    /// New context with no opener reference and no referrer. The only
    /// policy the renderer uses.
    pub fn isolated() -> Self {
        Self {
            new_context: true,
            no_opener: true,
            no_referrer: true,
        }
    }

    /// The `rel`/window-features string a browser host would pass along.
    pub fn features(&self) -> String {
        let mut parts = Vec::new();
        if self.no_opener {
            parts.push("noopener");
        }
        if self.no_referrer {
            parts.push("noreferrer");
        }
        parts.join(",")
    }
}

/// The host's ability to open a URL.
pub trait LinkOpener {
    fn open(&mut self, url: &str, policy: OpenPolicy) -> Result<(), OpenError>;
}

/// Records every request and logs it. Used by the demo binary.
#[derive(Debug, Default)]
pub struct LogOpener {
    pub opened: Vec<(String, OpenPolicy)>,
}

impl LinkOpener for LogOpener {
    fn open(&mut self, url: &str, policy: OpenPolicy) -> Result<(), OpenError> {
        if url.trim().is_empty() {
            return Err(OpenError::InvalidUrl(url.to_string()));
        }
        info!(url, features = %policy.features(), "open link");
        self.opened.push((url.to_string(), policy));
        Ok(())
    }
}
