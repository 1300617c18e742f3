// Copyright (c) Teacup Team
// SPDX-License-Identifier: Apache-2.0

use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Feed requests served, labelled by mode.
pub static FEED_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("teacup_feed_requests_total", "Feed requests served, by mode"),
        &["mode"],
    )
    .expect("feed_requests metric definition is valid");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("feed_requests metric registers once");
    counter
});

/// Prometheus text exposition endpoint
pub async fn get_metrics() -> (StatusCode, String) {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    match encoder.encode(&REGISTRY.gather(), &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            String::from_utf8(buffer).unwrap_or_default(),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to encode metrics: {}", e),
        ),
    }
}
