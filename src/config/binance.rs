//! Binance-specific configuration constants and types.

/// Configuration for Binance REST API client
/// (This is the runtime struct used by the kline client)
#[derive(Debug, Clone, Copy)]
pub struct BinanceApiConfig {
    pub timeout_ms: u64,
    pub retries: u32,
    pub backoff_ms: u64,
}

impl Default for BinanceApiConfig {
    fn default() -> Self {
        Self {
            timeout_ms: BINANCE.client.timeout_ms,
            retries: BINANCE.client.retries,
            backoff_ms: BINANCE.client.backoff_ms,
        }
    }
}

/// Configuration for REST API Limits and Weights
pub struct RestLimits {
    /// Default limit for number of klines returned in a single request
    pub klines_limit: i32,
    /// Maximum number of simultaneous Binance API calls allowed per batch
    pub simultaneous_calls_ceiling: usize,
    /// Weight limit per minute as specified in Binance FAQ
    pub weight_limit_minute: u32,
    /// Weight cost for a single kline API call
    pub kline_call_weight: u32,
    /// Hard stop on pagination for one symbol's history
    pub max_pages_per_fetch: usize,
}

/// Configuration for WebSocket Connections
pub struct WsConfig {
    /// WebSocket base URL for Binance combined streaming API
    pub combined_base_url: &'static str,
    /// Maximum reconnection delay (seconds)
    pub max_reconnect_delay_sec: u64,
    /// Initial reconnection delay (seconds)
    pub initial_reconnect_delay_sec: u64,
    /// Binance caps one combined connection at 1024 streams
    pub max_streams_per_connection: usize,
}

/// Default values for the Rest Client
pub struct ClientDefaults {
    pub timeout_ms: u64,
    pub retries: u32,
    pub backoff_ms: u64,
}

/// The Master Configuration Struct
pub struct BinanceConfig {
    pub limits: RestLimits,
    pub ws: WsConfig,
    pub client: ClientDefaults,
    /// Candidate list, one symbol per line
    pub symbols_file: &'static str,
    pub max_symbols: usize,
}

pub const BINANCE: BinanceConfig = BinanceConfig {
    limits: RestLimits {
        klines_limit: 1000,
        // Theoretical limit is 1000, but 500 is safer for rate limiting
        simultaneous_calls_ceiling: 500,
        weight_limit_minute: 6000,
        kline_call_weight: 2,
        max_pages_per_fetch: 50,
    },
    ws: WsConfig {
        combined_base_url: "wss://stream.binance.com:9443/stream?streams=",
        max_reconnect_delay_sec: 300, // 5 minutes
        initial_reconnect_delay_sec: 1,
        max_streams_per_connection: 1024,
    },
    client: ClientDefaults {
        timeout_ms: 5000,
        retries: 5,
        backoff_ms: 5000,
    },
    symbols_file: "pairs.txt",
    max_symbols: 200,
};
