//! Log tags identifying which subsystem produced a message
//!
//! Tags drive both the colored console prefix and per-subsystem debug
//! gating (--debug-<tag> command-line flags).

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    /// Startup, shutdown, top-level lifecycle
    System,
    /// Configuration loading and validation
    Config,
    /// Websocket subscription and reconnect loop
    Websocket,
    /// Signature intake and event dispatch
    Monitor,
    /// Transaction detail fetching and retries
    Fetch,
    /// Buy/sell classification decisions
    Classify,
    /// Position tracking and event application
    Position,
    /// Waiter queries over tracked state
    Waiter,
    /// JSON-RPC requests
    Rpc,
    /// Price and supply lookups
    Quotes,
    /// Per-token watch workflow
    Workflow,
}

impl LogTag {
    /// Key used in --debug-<key> / --verbose-<key> command-line flags.
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system",
            LogTag::Config => "config",
            LogTag::Websocket => "websocket",
            LogTag::Monitor => "monitor",
            LogTag::Fetch => "fetch",
            LogTag::Classify => "classify",
            LogTag::Position => "position",
            LogTag::Waiter => "waiter",
            LogTag::Rpc => "rpc",
            LogTag::Quotes => "quotes",
            LogTag::Workflow => "workflow",
        }
        .to_string()
    }

    /// Uncolored tag text as written to the console column.
    pub fn to_plain_string(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Config => "CONFIG",
            LogTag::Websocket => "WS",
            LogTag::Monitor => "MONITOR",
            LogTag::Fetch => "FETCH",
            LogTag::Classify => "CLASSIFY",
            LogTag::Position => "POSITION",
            LogTag::Waiter => "WAITER",
            LogTag::Rpc => "RPC",
            LogTag::Quotes => "QUOTES",
            LogTag::Workflow => "WORKFLOW",
        }
    }
}
