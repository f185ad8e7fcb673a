//! One-shot notifications carried across a redirect.
//!
//! Handlers queue a flash before redirecting; the next rendered page drains
//! the queue and shows each message once.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::session_keys;

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Info,
    Error,
}

impl FlashKind {
    /// CSS modifier class.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "flash--success",
            Self::Info => "flash--info",
            Self::Error => "flash--error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    /// Queue this flash for the next rendered page.
    ///
    /// A session store failure only loses the notification, so it is logged
    /// rather than returned.
    pub async fn push(self, session: &Session) {
        let mut queued: Vec<Self> = session
            .get(session_keys::FLASHES)
            .await
            .ok()
            .flatten()
            .unwrap_or_default();
        queued.push(self);

        if let Err(e) = session.insert(session_keys::FLASHES, queued).await {
            tracing::warn!(error = %e, "Failed to queue flash message");
        }
    }

    /// Remove and return every queued flash.
    pub async fn take_all(session: &Session) -> Vec<Self> {
        session
            .remove::<Vec<Self>>(session_keys::FLASHES)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_flashes_drain_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        Flash::success("Added to cart").push(&session).await;
        Flash::error("Only 1 left of Mug.").push(&session).await;

        let flashes = Flash::take_all(&session).await;
        assert_eq!(
            flashes,
            vec![Flash::success("Added to cart"), Flash::error("Only 1 left of Mug.")]
        );
        assert!(Flash::take_all(&session).await.is_empty());
    }

    #[test]
    fn test_css_class() {
        assert_eq!(FlashKind::Error.css_class(), "flash--error");
    }
}
