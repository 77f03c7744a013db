//! One-shot notices carried across a redirect in the session.

use tower_sessions::Session;

use crate::models::{Flash, session_keys};

/// Queue a notice for the next rendered page.
///
/// Failures are logged and swallowed; a lost notice never fails the request.
pub async fn set_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(session_keys::FLASH, flash).await {
        tracing::warn!(error = %e, "Failed to store flash notice");
    }
}

/// Take the queued notice, if any, removing it from the session.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    match session.remove::<Flash>(session_keys::FLASH).await {
        Ok(flash) => flash,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash notice");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_flash_is_shown_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        set_flash(&session, Flash::success("Added to cart")).await;

        assert_eq!(take_flash(&session).await, Some(Flash::success("Added to cart")));
        assert_eq!(take_flash(&session).await, None);
    }
}
