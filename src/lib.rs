//! # A Redis-backed page visit counter
//!
//! Every client gets an opaque identifier in a signed session cookie; each
//! `GET /` atomically increments that client's count in Redis and renders it.
//! When Redis is unreachable the process keeps serving counts from an
//! in-memory fallback, so the endpoint never fails because the store did.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cookie::Key;
//! use revisits::{app, RedisVisits, VisitCounter};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = RedisVisits::connect("redis://localhost:6379/0")
//!         .await
//!         .unwrap();
//!     let counter = Arc::new(VisitCounter::store_backed(Arc::new(store)));
//!     let app = app(counter, Key::generate());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await.unwrap();
//!     axum::serve(listener, app.into_make_service())
//!         .await
//!         .unwrap();
//! }
//! ```

pub use cookie::Key;

pub mod app;
pub mod config;
pub mod identity;
pub mod session;
pub mod store;

pub use app::app;
pub use config::Config;
pub use identity::ClientId;
pub use session::{Session, SessionLayer};
pub use store::{MemoryVisits, RedisVisits, StoreError, VisitCounter, VisitStore};
