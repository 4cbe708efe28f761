use std::{fmt::Display, time::Duration};

use tower_http::trace::OnResponse;

/// Logs status + latency once per request, attached to the trace layer.
#[derive(Clone)]
pub struct LatencyResponse;

impl<T> OnResponse<T> for LatencyResponse {
    fn on_response(
        self,
        response: &axum::http::Response<T>,
        latency: std::time::Duration,
        _: &tracing::Span,
    ) {
        tracing::info!(
            status = %response.status(),
            latency = %Latency(latency),
            "request completed"
        );
    }
}

struct Latency(Duration);

impl Display for Latency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 >= Duration::from_millis(1) {
            write!(f, "{:.1} ms", self.0.as_secs_f64() * 1000.0)
        } else {
            write!(f, "{} µs", self.0.as_micros())
        }
    }
}
