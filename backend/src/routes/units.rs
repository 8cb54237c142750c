use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertRequest {
    /// Unit name as shown in the UI, e.g. `"MJ/m²"`.
    #[serde(default)]
    pub from_unit: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Conversion factor plus a one-value preview taken from the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertResponse {
    pub from_unit: String,
    pub to_unit: String,
    pub factor_to_kwh: f64,
    pub preview_original: Option<f64>,
    pub preview_converted: Option<f64>,
}

pub const CONVERT_IRRADIANCE_PATH: &str = "/units/irradiance/convert";
