//! Logging system demonstration
//!
//! This example shows how to use the logging infrastructure in different modes.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # Compact format
//! cargo run --example logging_demo -- compact
//!
//! # With custom filter
//! cargo run --example logging_demo -- pretty "core_runtime=trace"
//! ```

use bridge_traits::time::LogLevel;
use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig,
};
use std::env;
use tracing::{debug, error, info, instrument, span, trace, warn, Level};

#[core_async::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let format = if args.len() > 1 {
        match args[1].as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Pretty,
        }
    } else {
        LogFormat::default()
    };

    let filter = args.get(2).cloned();

    // Initialize logging
    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_pii_redaction(true)
        .with_spans(true)
        .with_target(true);

    if let Some(f) = filter {
        config = config.with_filter(f);
    }

    init_logging(config).expect("Failed to initialize logging");

    info!("=== Logging System Demo ===");
    info!(format = ?format, "Logging initialized");

    // Demonstrate different log levels
    demo_log_levels();

    // Demonstrate structured logging
    demo_structured_logging();

    // Demonstrate spans for tracing
    demo_spans().await;

    // Demonstrate PII redaction
    demo_pii_redaction();

    // Demonstrate instrumentation
    demo_instrumentation().await;

    info!("=== Demo Complete ===");
}

fn demo_log_levels() {
    let span = span!(Level::INFO, "log_levels");
    let _enter = span.enter();

    trace!("This is a TRACE level log");
    debug!("This is a DEBUG level log");
    info!("This is an INFO level log");
    warn!("This is a WARN level log");
    error!("This is an ERROR level log");
}

fn demo_structured_logging() {
    let span = span!(Level::INFO, "structured_logging");
    let _enter = span.enter();

    info!("Simple message without fields");

    info!(
        client_id = "demo-client",
        grant_type = "authorization_code",
        expires_in = 3600,
        "Token issued"
    );

    info!(
        active_flows = 2,
        tokens_cached = 7,
        store_hit_rate = 0.95,
        "System metrics"
    );
}

async fn demo_spans() {
    let span = span!(Level::INFO, "device_flow", provider = "example-idp");
    let _enter = span.enter();

    info!("Starting device authorization flow");

    {
        let inner_span = span!(Level::DEBUG, "request_device_code");
        let _inner = inner_span.enter();

        debug!(interval_secs = 5, "Received device and user codes");
        core_async::sleep(core_async::Duration::from_millis(10)).await;
    }

    {
        let inner_span = span!(Level::DEBUG, "poll_for_token");
        let _inner = inner_span.enter();

        debug!(attempt = 1, status = "authorization_pending", "Polling token endpoint");
        core_async::sleep(core_async::Duration::from_millis(10)).await;
    }

    info!("Device authorization flow completed");
}

fn demo_pii_redaction() {
    let span = span!(Level::INFO, "pii_redaction");
    let _enter = span.enter();

    // These values will be automatically redacted by our helper
    let token = "access_token_abcdef123456";
    let email = "user@example.com";
    let path = "/home/user/.config/myapp/tokens.json";

    info!(
        token = %redact_if_sensitive("access_token", token),
        email = %redact_if_sensitive("email", email),
        file = %strip_path(path),
        "Sensitive data example"
    );

    // Best practice: Don't log sensitive values at all
    info!("Authentication successful for user");
    // Instead of: info!(refresh_token = token, "Auth successful")
}

#[instrument]
async fn demo_instrumentation() {
    info!("Instrumented function automatically creates spans");

    let scopes = vec!["openid", "profile", "offline_access"];
    process_scopes(&scopes).await;
}

#[instrument(fields(count = scopes.len()))]
async fn process_scopes(scopes: &[&str]) {
    debug!("Processing requested scopes");

    for (idx, scope) in scopes.iter().enumerate() {
        process_scope(idx, scope).await;
    }

    info!("All scopes processed");
}

#[instrument(fields(scope_id = idx))]
async fn process_scope(idx: usize, scope: &str) {
    trace!(scope = %scope, "Processing individual scope");
    core_async::sleep(core_async::Duration::from_millis(5)).await;
}
