//! Logging conventions for focss.
//!
//! focss uses the `tracing` crate for instrumentation. Nothing here installs a
//! subscriber; applications opt in:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("focss=debug,focss_core=info")
//!     .init();
//! ```

/// Span names used throughout focss.
pub mod span_names {
    /// A full or incremental engine match pass.
    pub const MATCH_PASS: &str = "focss::match_pass";
    /// One frame of the frame scheduler.
    pub const FRAME: &str = "focss::frame";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Document tree target.
    pub const DOCUMENT: &str = "focss_core::document";
    /// Mutation observer target.
    pub const MUTATION: &str = "focss_core::mutation";
    /// Frame scheduler target.
    pub const FRAME: &str = "focss_core::frame";
    /// Rule engine target.
    pub const ENGINE: &str = "focss::engine";
    /// Selector template target.
    pub const TEMPLATE: &str = "focss::template";
    /// Selector parsing and matching target.
    pub const SELECTOR: &str = "focss::selector";
    /// Style operator target.
    pub const OPERATOR: &str = "focss::operator";
}
