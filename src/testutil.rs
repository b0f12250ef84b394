//! Shared helpers for tests that exercise real HTTP round trips.

/// Serve an axum router on an ephemeral localhost port and return its base
/// URL. The server task lives until the test runtime shuts down.
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}
