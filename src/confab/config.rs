//! Configuration for the completion gateway.
//!
//! Provides the [`GatewayConfig`] struct bundling the admission-control width
//! with the [`CompletionOptions`] forwarded on every call. Users construct it
//! manually — no file parsing dependencies are required.
//!
//! # Example
//!
//! ```rust
//! use confab::GatewayConfig;
//!
//! // Use the defaults (128 slots, short high-temperature completions)
//! let config = GatewayConfig::default();
//! assert_eq!(config.max_in_flight, 128);
//!
//! // Or narrow the gate for a small deployment
//! let config = GatewayConfig {
//!     max_in_flight: 8,
//!     ..GatewayConfig::default()
//! };
//! ```

use crate::confab::client_wrapper::CompletionOptions;

/// Default width of the gateway's slot pool.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 128;

/// Configuration for a [`CompletionGateway`](crate::CompletionGateway).
///
/// This struct is intentionally minimal and users construct it however they
/// want. No TOML, YAML, or other config-file parsing dependencies are
/// introduced.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Maximum number of completion requests that may be simultaneously in
    /// flight across the whole process.
    pub max_in_flight: usize,
    /// Request options forwarded to the underlying client on every call.
    pub options: CompletionOptions,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            options: CompletionOptions::default(),
        }
    }
}
