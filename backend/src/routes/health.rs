use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Repository status: "connected", "disconnected" or an error message
    pub repository: String,
}

pub const HEALTH_PATH: &str = "/health";
