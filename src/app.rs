//! HTTP surface: the counter page.

use crate::{
    session::{Session, SessionLayer},
    store::VisitCounter,
};
use axum::{extract::State, response::Html, routing::get, Router};
use cookie::Key;
use std::sync::Arc;

/// Builds the router: `GET /` behind the session middleware.
pub fn app(counter: Arc<VisitCounter>, key: Key) -> Router {
    Router::new()
        .route("/", get(index))
        .layer(SessionLayer::new(key))
        .with_state(counter)
}

async fn index(State(counter): State<Arc<VisitCounter>>, session: Session) -> Html<String> {
    let id = session.resolve_or_create();
    let visits = counter.record(&id).await;
    Html(render_page(visits))
}

fn render_page(visits: u64) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head><meta charset=\"UTF-8\"><title>Page Visit Counter</title></head>\n\
         <body>\n\
         <h1>Welcome to the Page Counter!</h1>\n\
         <p>You have visited this page <strong>{visits}</strong> time(s).</p>\n\
         </body>\n\
         </html>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ClientId;
    use crate::store::{StoreError, VisitStore};
    use async_trait::async_trait;
    use axum::body::Body;
    use http::{header, Request, Response, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct DownStore;

    #[async_trait]
    impl VisitStore for DownStore {
        async fn increment(&self, _id: &ClientId) -> Result<u64, StoreError> {
            Err(redis::RedisError::from(std::io::Error::from(
                std::io::ErrorKind::ConnectionRefused,
            ))
            .into())
        }
    }

    fn fallback_app() -> Router {
        app(Arc::new(VisitCounter::fallback_only()), Key::generate())
    }

    async fn body_string(res: Response<Body>) -> String {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8_lossy(&bytes).into()
    }

    fn get_root() -> Request<Body> {
        Request::builder().uri("/").body(Body::empty()).unwrap()
    }

    /// The `name=value` pair of the session cookie set by `res`.
    fn session_cookie(res: &Response<Body>) -> String {
        let header = res
            .headers()
            .get(header::SET_COOKIE)
            .expect("no session cookie set")
            .to_str()
            .unwrap();
        header.split(';').next().unwrap().to_owned()
    }

    #[tokio::test]
    async fn first_visit_counts_one_and_sets_cookie() {
        let res = fallback_app().oneshot(get_root()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = session_cookie(&res);
        assert!(cookie.starts_with("user_id="));
        assert!(body_string(res).await.contains("<strong>1</strong>"));
    }

    #[tokio::test]
    async fn replayed_cookie_continues_the_count() {
        let app = fallback_app();

        let res = app.clone().oneshot(get_root()).await.unwrap();
        let cookie = session_cookie(&res);
        assert!(body_string(res).await.contains("<strong>1</strong>"));

        for expected in 2..=4 {
            let req = Request::builder()
                .uri("/")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap();
            let res = app.clone().oneshot(req).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            // The identity is unchanged, so no new cookie is needed; the
            // count keeps increasing.
            let body = body_string(res).await;
            assert!(body.contains(&format!("<strong>{expected}</strong>")), "{body}");
        }
    }

    #[tokio::test]
    async fn distinct_clients_count_independently() {
        let app = fallback_app();

        let first = app.clone().oneshot(get_root()).await.unwrap();
        let first_cookie = session_cookie(&first);

        // A cookieless client gets its own identity starting at one.
        let res = app.clone().oneshot(get_root()).await.unwrap();
        assert_ne!(session_cookie(&res), first_cookie);
        assert!(body_string(res).await.contains("<strong>1</strong>"));

        // The first client is unaffected.
        let req = Request::builder()
            .uri("/")
            .header(header::COOKIE, &first_cookie)
            .body(Body::empty())
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert!(body_string(res).await.contains("<strong>2</strong>"));
    }

    #[tokio::test]
    async fn forged_cookie_gets_a_fresh_identity() {
        let app = fallback_app();
        let forged = format!("user_id={}", ClientId::mint());
        let req = Request::builder()
            .uri("/")
            .header(header::COOKIE, &forged)
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_ne!(session_cookie(&res), forged);
        assert!(body_string(res).await.contains("<strong>1</strong>"));
    }

    #[tokio::test]
    async fn unreachable_store_still_serves_a_count() {
        let app = app(
            Arc::new(VisitCounter::store_backed(Arc::new(DownStore))),
            Key::generate(),
        );

        let res = app.clone().oneshot(get_root()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = session_cookie(&res);
        assert!(body_string(res).await.contains("<strong>1</strong>"));

        let req = Request::builder()
            .uri("/")
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert!(body_string(res).await.contains("<strong>2</strong>"));
    }
}
