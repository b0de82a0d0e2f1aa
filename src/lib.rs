// Reading model and validation
pub mod reading;

// Threshold configuration and lookup
pub mod threshold;

// Zone evaluation and fleet aggregation
pub mod status;

// Fan speed control
pub mod ventilation;

// Rolling per-sensor history
pub mod history;

// Safety report
pub mod report;

// Service configuration
pub mod config;

// Reading sources (simulator, HTTP feed)
pub mod source;

// Monitoring engine and sampler
pub mod state;

// HTTP and WebSocket APIs
pub mod api;

// Subscription management
pub mod subscription;
