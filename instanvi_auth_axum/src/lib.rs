mod config;
mod middleware;
mod response;

pub use config::{GATE_CONFIG, init};
pub use middleware::{auth_gate, auth_gate_with_config};
pub use response::{apply_headers, into_response};

// Re-export the core types handlers and tests work with
pub use instanvi_auth::{GateConfig, GateDecision, GateRequest, evaluate};
