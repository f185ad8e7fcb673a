//! Error pages with the customer's layout.
//!
//! `AppError` renders without access to the session, so the page comes out
//! anonymous and without flashes. This middleware renders it again with the
//! signed-in customer and the flashes queued before the failure.

use axum::{
    extract::Request,
    http::header::{CONTENT_LENGTH, CONTENT_TYPE},
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

use crate::error::ErrorPage;
use crate::models::{PageContext, PageSlot};

/// Re-render error pages with the request's [`PageContext`].
///
/// If the handler extracted a `PageContext` before failing, that context
/// (including the flashes it drained) is reused. Otherwise it is loaded from
/// the session here.
pub async fn error_page_middleware(session: Session, mut request: Request, next: Next) -> Response {
    let slot = PageSlot::default();
    request.extensions_mut().insert(slot.clone());

    let response = next.run(request).await;
    let Some(error_page) = response.extensions().get::<ErrorPage>().cloned() else {
        return response;
    };

    let page = match slot.take() {
        Some(page) => page,
        None => PageContext::load(&session).await,
    };
    let mut rendered = error_page.render(page);
    for (name, value) in response.headers() {
        if name != CONTENT_LENGTH && name != CONTENT_TYPE && !rendered.headers().contains_key(name) {
            rendered.headers_mut().insert(name.clone(), value.clone());
        }
    }
    rendered
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, middleware, routing::get};
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    use super::*;
    use crate::error::AppError;
    use crate::models::Flash;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn app(handler: Router) -> Router {
        handler
            .layer(middleware::from_fn(error_page_middleware))
            .layer(SessionManagerLayer::new(MemoryStore::default()))
    }

    #[tokio::test]
    async fn test_error_page_keeps_drained_flashes() {
        let handler = Router::new()
            .route(
                "/",
                get(|session: Session| async move {
                    Flash::error("Only 2 left of Large.").push(&session).await;
                    axum::response::Redirect::to("/fail")
                }),
            )
            .route(
                "/fail",
                get(|_page: PageContext| async move {
                    AppError::NotFound("product".to_string())
                }),
            );
        let app = app(handler);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = response.headers()[axum::http::header::SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/fail")
                    .header(axum::http::header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
        let html = body_text(response).await;
        assert!(html.contains("could not be found"));
        assert!(html.contains("Only 2 left of Large."));
    }

    #[tokio::test]
    async fn test_error_page_loads_queued_flashes() {
        let handler = Router::new().route(
            "/",
            get(|session: Session| async move {
                Flash::info("Signed out.").push(&session).await;
                AppError::BadRequest("Bad page number.".to_string())
            }),
        );

        let response = app(handler)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
        let html = body_text(response).await;
        assert!(html.contains("Bad page number."));
        assert!(html.contains("Signed out."));
    }

    #[tokio::test]
    async fn test_other_responses_untouched() {
        let handler = Router::new().route("/", get(|| async { "plain" }));

        let response = app(handler)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(body_text(response).await, "plain");
    }
}
