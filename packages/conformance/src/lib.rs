//! Shared helpers for the kbsync conformance test suite.
//!
//! Provides [`spawn_store`]: a function that binds a `TcpListener` on an
//! ephemeral port, serves an in-process [`MockStore`] behind the action API,
//! and returns both the endpoint URL and a handle to the store so tests can
//! seed entities and inspect the result without going through HTTP.

pub mod router;
pub mod store;

use std::sync::Arc;

pub use router::{build_router, API_PATH};
pub use store::{MockStore, DEFAULT_TOKEN};

/// Start an ephemeral in-process store and return `(api_url, store)`.
///
/// The store runs in a background `tokio` task bound to an OS-assigned port
/// on `127.0.0.1`. The returned URL is the full action API endpoint, e.g.
/// `http://127.0.0.1:51234/w/api.php`.
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound or the server fails.
pub async fn spawn_store() -> (String, Arc<MockStore>) {
    spawn_with(MockStore::new()).await
}

/// Like [`spawn_store`], with a caller-built store (e.g. a custom token).
pub async fn spawn_with(store: MockStore) -> (String, Arc<MockStore>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");
    let api_url = format!("http://{addr}{API_PATH}");

    let store = Arc::new(store);
    let router = build_router(Arc::clone(&store));

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("conformance store error");
    });

    (api_url, store)
}
