//! HTTP client module
//!
//! Provides the HTTP client used to talk to the SAP endpoint.
//!
//! # Features
//!
//! - **Automatic Retries**: Transient failures retried with backoff
//! - **Rate Limiting**: Optional token bucket rate limiter using governor
//! - **Authentication**: Basic or cached bearer token via the auth module

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
