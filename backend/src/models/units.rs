//! Irradiance unit normalization.
//!
//! Downstream model training expects irradiance in kWh/m². Conversions are a
//! single scalar multiplication by a fixed factor; stored datasets are never
//! rewritten, the factor travels as pipeline metadata instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CleaningError, CleaningResult};

/// Supported irradiance units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IrradianceUnit {
    #[default]
    #[serde(rename = "kWh/m²")]
    KwhPerM2,
    #[serde(rename = "MJ/m²")]
    MjPerM2,
    #[serde(rename = "Wh/m²")]
    WhPerM2,
}

impl IrradianceUnit {
    /// Unit expected by model training.
    pub const CANONICAL: IrradianceUnit = IrradianceUnit::KwhPerM2;

    pub const ALL: [IrradianceUnit; 3] = [
        IrradianceUnit::KwhPerM2,
        IrradianceUnit::MjPerM2,
        IrradianceUnit::WhPerM2,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            IrradianceUnit::KwhPerM2 => "kWh/m²",
            IrradianceUnit::MjPerM2 => "MJ/m²",
            IrradianceUnit::WhPerM2 => "Wh/m²",
        }
    }

    /// Multiplier taking a value in this unit to kWh/m².
    ///
    /// 1 kWh/m² = 3.6 MJ/m² = 1000 Wh/m².
    pub fn factor_to_kwh(&self) -> f64 {
        match self {
            IrradianceUnit::KwhPerM2 => 1.0,
            IrradianceUnit::MjPerM2 => 1.0 / 3.6,
            IrradianceUnit::WhPerM2 => 1.0 / 1000.0,
        }
    }
}

impl fmt::Display for IrradianceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for IrradianceUnit {
    type Err = CleaningError;

    /// Accepts the display symbols plus ASCII spellings (`kWh/m2`, `mj/m^2`, `wh`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .replace('²', "2")
            .replace("^2", "2")
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        match normalized.as_str() {
            "kwh/m2" | "kwh" => Ok(IrradianceUnit::KwhPerM2),
            "mj/m2" | "mj" => Ok(IrradianceUnit::MjPerM2),
            "wh/m2" | "wh" => Ok(IrradianceUnit::WhPerM2),
            _ => Err(CleaningError::UnknownUnit(s.to_string())),
        }
    }
}

/// Convert `value` from one irradiance unit to another.
pub fn convert(value: f64, from: IrradianceUnit, to: IrradianceUnit) -> f64 {
    value * from.factor_to_kwh() / to.factor_to_kwh()
}

/// [`convert`] with unit names as strings.
pub fn convert_named(value: f64, from: &str, to: &str) -> CleaningResult<f64> {
    Ok(convert(value, from.parse()?, to.parse()?))
}

/// Conversion factor attached to pipeline results and applied at the point
/// of consumption.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitConversion {
    pub irradiance_unit: IrradianceUnit,
    pub factor_to_kwh: f64,
}

impl UnitConversion {
    pub fn new(irradiance_unit: IrradianceUnit) -> Self {
        Self {
            irradiance_unit,
            factor_to_kwh: irradiance_unit.factor_to_kwh(),
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        value * self.factor_to_kwh
    }

    pub fn apply_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| self.apply(*v)).collect()
    }
}

impl Default for UnitConversion {
    fn default() -> Self {
        Self::new(IrradianceUnit::CANONICAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_factors() {
        assert_eq!(IrradianceUnit::KwhPerM2.factor_to_kwh(), 1.0);
        assert!((convert(3.6, IrradianceUnit::MjPerM2, IrradianceUnit::KwhPerM2) - 1.0).abs() < 1e-12);
        assert!((convert(1000.0, IrradianceUnit::WhPerM2, IrradianceUnit::KwhPerM2) - 1.0).abs() < 1e-12);
        assert!((convert(1.0, IrradianceUnit::KwhPerM2, IrradianceUnit::MjPerM2) - 3.6).abs() < 1e-12);
    }

    #[test]
    fn test_parse_spellings() {
        assert_eq!("kWh/m²".parse::<IrradianceUnit>().unwrap(), IrradianceUnit::KwhPerM2);
        assert_eq!("MJ/m2".parse::<IrradianceUnit>().unwrap(), IrradianceUnit::MjPerM2);
        assert_eq!(" wh / m^2 ".parse::<IrradianceUnit>().unwrap(), IrradianceUnit::WhPerM2);
        assert!(matches!(
            "W/m²".parse::<IrradianceUnit>(),
            Err(CleaningError::UnknownUnit(_))
        ));
    }

    #[test]
    fn test_convert_named_rejects_unknown() {
        assert!(convert_named(1.0, "kWh/m²", "BTU").is_err());
        assert!((convert_named(7.2, "MJ/m²", "kWh/m²").unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_unit_conversion_metadata() {
        let conv = UnitConversion::new(IrradianceUnit::WhPerM2);
        assert_eq!(conv.apply_all(&[500.0, 1500.0]), vec![0.5, 1.5]);
        let json = serde_json::to_value(conv).unwrap();
        assert_eq!(json["irradiance_unit"], "Wh/m²");
    }

    proptest! {
        #[test]
        fn prop_round_trip_through_every_unit(x in -1.0e6f64..1.0e6) {
            for unit in IrradianceUnit::ALL {
                let there = convert(x, IrradianceUnit::KwhPerM2, unit);
                let back = convert(there, unit, IrradianceUnit::KwhPerM2);
                prop_assert!((back - x).abs() <= 1e-9 * x.abs().max(1.0));
            }
        }
    }
}
