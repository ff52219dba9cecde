//! Metrics recording helpers.
//!
//! Counters only; wiring an exporter is the embedding binary's choice.

/// Count a request rejected before the handler ran.
pub fn record_rejection(stage: &'static str) {
    metrics::counter!("pipeline_rejections_total", "stage" => stage).increment(1);
}

/// Count a completed request by status class.
pub fn record_request(status: u16) {
    let class = match status {
        200..=299 => "2xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    };
    metrics::counter!("pipeline_requests_total", "class" => class).increment(1);
}
