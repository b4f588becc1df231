mod client;
mod dto;

pub use client::{ColorizeClient, ColorizeError, HttpColorizeClient};
pub use dto::{ColorizeResponse, HealthStatus};
