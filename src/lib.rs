//! IoT measurement anchoring gateway library.

pub mod access;
pub mod anchoring;
pub mod blockchain;
pub mod config;
pub mod crypto;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod resilience;
pub mod storage;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::IngestionPipeline;
