use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const SNAP_TOLERANCE_RATIO_DEFAULT: f64 = 0.25;
pub const SCATTER_MARGIN_DEFAULT: f64 = 0.0;

/// Tunables of the assembly engine. Cut shape is not configurable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineRules {
    /// Snap tolerance as a fraction of the piece width.
    pub snap_tolerance_ratio: f64,
    /// Inset of the scatter area, as a fraction of its shorter side.
    pub scatter_margin: f64,
}

impl Default for EngineRules {
    fn default() -> Self {
        Self {
            snap_tolerance_ratio: SNAP_TOLERANCE_RATIO_DEFAULT,
            scatter_margin: SCATTER_MARGIN_DEFAULT,
        }
    }
}

impl EngineRules {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let mut rules: EngineRules = toml::from_str(source)?;
        if !rules.snap_tolerance_ratio.is_finite() || rules.snap_tolerance_ratio < 0.0 {
            tracing::warn!(
                value = rules.snap_tolerance_ratio,
                "invalid snap tolerance, using default"
            );
            rules.snap_tolerance_ratio = SNAP_TOLERANCE_RATIO_DEFAULT;
        }
        rules.scatter_margin = if rules.scatter_margin.is_finite() {
            rules.scatter_margin.clamp(0.0, 0.45)
        } else {
            SCATTER_MARGIN_DEFAULT
        };
        Ok(rules)
    }

    pub fn snap_tolerance(&self, piece_width: f64) -> f64 {
        piece_width * self.snap_tolerance_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let rules = EngineRules::from_toml_str("").expect("rules");
        assert_eq!(rules, EngineRules::default());
        assert_eq!(rules.snap_tolerance(100.0), 25.0);
    }

    #[test]
    fn partial_file_overrides_named_keys() {
        let rules = EngineRules::from_toml_str("snap_tolerance_ratio = 0.1\n").expect("rules");
        assert_eq!(rules.snap_tolerance_ratio, 0.1);
        assert_eq!(rules.scatter_margin, SCATTER_MARGIN_DEFAULT);
    }

    #[test]
    fn out_of_range_values_are_corrected() {
        let rules =
            EngineRules::from_toml_str("snap_tolerance_ratio = -1.0\nscatter_margin = 0.9\n")
                .expect("rules");
        assert_eq!(rules.snap_tolerance_ratio, SNAP_TOLERANCE_RATIO_DEFAULT);
        assert_eq!(rules.scatter_margin, 0.45);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let err = EngineRules::from_toml_str("snap_tolerance_ratio = \"wide\"").unwrap_err();
        assert!(matches!(err, crate::error::PuzzleError::Config(_)));
    }
}
