//! Per-request data every page layout needs.

use std::sync::{Arc, Mutex};

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use super::{Flash, SessionUser, session_keys};

/// Signed-in customer and pending flashes for the layout.
///
/// Extracting it drains the flash queue, so take it only in handlers that
/// render a page.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<SessionUser>,
    pub flashes: Vec<Flash>,
}

impl PageContext {
    /// Greeting name for the navigation bar.
    #[must_use]
    pub fn user_name(&self) -> Option<&str> {
        self.user.as_ref().map(SessionUser::first_name)
    }

    /// Add a flash raised while rendering this page.
    pub fn flash(&mut self, flash: Flash) {
        self.flashes.push(flash);
    }

    /// Read the signed-in customer and drain queued flashes.
    pub async fn load(session: &Session) -> Self {
        let user = session
            .get::<SessionUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();
        let flashes = Flash::take_all(session).await;

        Self { user, flashes }
    }
}

/// Request-scoped copy of the extracted [`PageContext`].
///
/// Flashes are drained on extraction. When the handler then fails, the error
/// page reads them back from here instead of losing them.
#[derive(Debug, Clone, Default)]
pub struct PageSlot(Arc<Mutex<Option<PageContext>>>);

impl PageSlot {
    fn store(&self, page: &PageContext) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(page.clone());
        }
    }

    /// The context extracted during this request, if any.
    #[must_use]
    pub fn take(&self) -> Option<PageContext> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self::default());
        };

        let page = Self::load(session).await;
        if let Some(slot) = parts.extensions.get::<PageSlot>() {
            slot.store(&page);
        }

        Ok(page)
    }
}
