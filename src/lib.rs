// Device model and snapshot decoding
pub mod device;

// Coarse status bands
pub mod status;

// Particle field: smoothing, spawn curve, simulation
pub mod field;

// Surfaces and particle rendering
pub mod render;

// Snapshot diffing, identity and highlight timers
pub mod reconcile;

// Engine task tying both flows together
pub mod engine;

// NATS snapshot feed
pub mod feed;

// HTTP and WebSocket APIs
pub mod api;

// WebSocket connection management
pub mod subscription;

// Configuration
pub mod config;
