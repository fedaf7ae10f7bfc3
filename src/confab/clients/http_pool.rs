//! HTTP client pool for maintaining persistent connections per base URL.
//!
//! This module provides a singleton pool of reqwest::Client instances, one per base URL.
//! This ensures that:
//! - HTTP connections are reused across multiple requests (connection pooling)
//! - DNS lookups are minimized
//! - TLS handshakes are reused where possible
//! - TCP connections are kept alive to avoid reconnection overhead

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

lazy_static! {
    /// Global HTTP client pool, lazily initialized on first access.
    static ref HTTP_CLIENT_POOL: Mutex<HashMap<String, reqwest::Client>> =
        Mutex::new(HashMap::new());
}

/// Get or create a shared HTTP client for the given base URL.
///
/// Each base URL gets its own client to ensure proper connection pooling.
pub fn get_http_client(base_url: &str) -> reqwest::Client {
    let mut pool = HTTP_CLIENT_POOL.lock().unwrap();

    if let Some(client) = pool.get(base_url) {
        return client.clone();
    }

    let client = reqwest::ClientBuilder::new()
        // Keep idle connections alive for 90 seconds
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        // Allow up to 10 idle connections per host for better throughput
        .pool_max_idle_per_host(10)
        // Enable TCP keepalive to prevent connection drops
        .tcp_keepalive(Some(Duration::from_secs(60)))
        // Set a reasonable timeout for the entire request
        .timeout(Duration::from_secs(300))
        .build()
        .expect("Failed to build HTTP client");

    pool.insert(base_url.to_string(), client.clone());
    client
}
