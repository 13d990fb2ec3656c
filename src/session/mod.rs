//! Signed session cookie middleware.
//!
//! [`SessionLayer`] parses the request's `Cookie` headers into a lazily-built
//! jar and puts a [`Session`] handle into the request extensions, where
//! handlers can pick it up as an extractor. Changes made through the handle
//! are written back as `Set-Cookie` headers when the response passes through
//! the middleware.
//!
//! All reads and writes go through the jar's signed child jar, so clients can
//! neither tamper with nor fabricate an identifier. A cookie that fails
//! verification is simply invisible.

use crate::identity::ClientId;
use cookie::{Cookie, CookieJar, Key};
use http::{header, HeaderValue, Request, Response};
use parking_lot::Mutex;
use std::{
    fmt,
    sync::Arc,
    task::{Context, Poll},
};
use tower_layer::Layer;
use tower_service::Service;

use self::future::ResponseFuture;

pub mod extract;
pub mod future;

/// Name of the cookie carrying the client identifier.
const USER_ID_COOKIE: &str = "user_id";

/// A handle to the request's session, usable as an axum extractor.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Mutex<Inner>>,
    key: Arc<Key>,
}

#[derive(Debug, Default)]
struct Inner {
    headers: Vec<HeaderValue>,
    jar: Option<CookieJar>,
    changed: bool,
}

impl Session {
    pub(crate) fn new(headers: Vec<HeaderValue>, key: Arc<Key>) -> Self {
        let inner = Inner {
            headers,
            ..Default::default()
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            key,
        }
    }

    /// Returns the verified client identifier, if the request carried one.
    /// An absent, unsigned, or malformed cookie yields `None`.
    pub fn user_id(&self) -> Option<ClientId> {
        let mut inner = self.inner.lock();
        let cookie = inner.jar().signed(&self.key).get(USER_ID_COOKIE)?;
        ClientId::parse(cookie.value())
    }

    /// Stages a signed `user_id` cookie for this and all future requests
    /// from the client.
    pub fn set_user_id(&self, id: &ClientId) {
        let cookie = Cookie::build((USER_ID_COOKIE, id.to_string()))
            .path("/")
            .http_only(true)
            .build();
        let mut inner = self.inner.lock();
        inner.changed = true;
        inner.jar().signed_mut(&self.key).add(cookie);
    }

    /// Returns the request's identifier, minting and attaching a fresh one
    /// when the client did not present a valid cookie.
    pub fn resolve_or_create(&self) -> ClientId {
        if let Some(id) = self.user_id() {
            return id;
        }
        let id = ClientId::mint();
        self.set_user_id(&id);
        id
    }
}

// The signing key stays out of the Debug output.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl Inner {
    /// Cached jar
    fn jar(&mut self) -> &mut CookieJar {
        if self.jar.is_none() {
            let mut jar = CookieJar::new();
            for header in &self.headers {
                let Ok(s) = std::str::from_utf8(header.as_bytes()) else {
                    continue;
                };
                for cookie_str in s.split(';').map(str::trim) {
                    if let Ok(cookie) = Cookie::parse_encoded(cookie_str) {
                        jar.add_original(cookie.into_owned());
                    }
                }
            }
            self.jar = Some(jar);
        }
        self.jar.as_mut().unwrap()
    }
}

/// Middleware to make [`Session`] available to handlers.
#[derive(Clone)]
pub struct SessionManager<S> {
    inner: S,
    key: Arc<Key>,
}

impl<S: fmt::Debug> fmt::Debug for SessionManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<ReqBody, ResBody, S> Service<Request<ReqBody>> for SessionManager<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future>;

    #[inline]
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let headers = req
            .headers()
            .get_all(header::COOKIE)
            .iter()
            .cloned()
            .collect();
        let session = Session::new(headers, self.key.clone());
        req.extensions_mut().insert(session.clone());

        ResponseFuture {
            future: self.inner.call(req),
            session,
        }
    }
}

/// Layer to apply [`SessionManager`] middleware.
#[derive(Clone)]
pub struct SessionLayer {
    key: Arc<Key>,
}

impl SessionLayer {
    /// Creates a session layer signing cookies with `key`.
    pub fn new(key: Key) -> Self {
        Self { key: Arc::new(key) }
    }
}

impl fmt::Debug for SessionLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionLayer").finish_non_exhaustive()
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionManager<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionManager {
            inner,
            key: self.key.clone(),
        }
    }
}
