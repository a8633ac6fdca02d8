// Domain layer - Pure session, feed and chart data models
pub mod accumulator;
pub mod endpoint;
pub mod feed;
pub mod job;
pub mod session;
pub mod telemetry;
