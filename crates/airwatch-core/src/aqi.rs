use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// US EPA air quality index category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    /// Category for an index value, using the EPA breakpoints.
    pub fn from_aqi(aqi: i64) -> Self {
        match aqi {
            i64::MIN..=50 => AqiCategory::Good,
            51..=100 => AqiCategory::Moderate,
            101..=150 => AqiCategory::UnhealthySensitive,
            151..=200 => AqiCategory::Unhealthy,
            201..=300 => AqiCategory::VeryUnhealthy,
            _ => AqiCategory::Hazardous,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AqiCategory::Good => "good",
            AqiCategory::Moderate => "moderate",
            AqiCategory::UnhealthySensitive => "unhealthy_sensitive",
            AqiCategory::Unhealthy => "unhealthy",
            AqiCategory::VeryUnhealthy => "very_unhealthy",
            AqiCategory::Hazardous => "hazardous",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AqiCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "good" => Ok(AqiCategory::Good),
            "moderate" => Ok(AqiCategory::Moderate),
            "unhealthy_sensitive" => Ok(AqiCategory::UnhealthySensitive),
            "unhealthy" => Ok(AqiCategory::Unhealthy),
            "very_unhealthy" => Ok(AqiCategory::VeryUnhealthy),
            "hazardous" => Ok(AqiCategory::Hazardous),
            other => Err(ValidationError::UnknownVariant {
                kind: "AQI category",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for AqiCategory {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Kind of a stored user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    ThresholdAlert,
    ForecastAlert,
    SystemUpdate,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::ThresholdAlert => "threshold_alert",
            NotificationType::ForecastAlert => "forecast_alert",
            NotificationType::SystemUpdate => "system_update",
        }
    }
}

impl FromStr for NotificationType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "threshold_alert" => Ok(NotificationType::ThresholdAlert),
            "forecast_alert" => Ok(NotificationType::ForecastAlert),
            "system_update" => Ok(NotificationType::SystemUpdate),
            other => Err(ValidationError::UnknownVariant {
                kind: "notification type",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for NotificationType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_breakpoints() {
        assert_eq!(AqiCategory::from_aqi(0), AqiCategory::Good);
        assert_eq!(AqiCategory::from_aqi(50), AqiCategory::Good);
        assert_eq!(AqiCategory::from_aqi(51), AqiCategory::Moderate);
        assert_eq!(AqiCategory::from_aqi(150), AqiCategory::UnhealthySensitive);
        assert_eq!(AqiCategory::from_aqi(151), AqiCategory::Unhealthy);
        assert_eq!(AqiCategory::from_aqi(300), AqiCategory::VeryUnhealthy);
        assert_eq!(AqiCategory::from_aqi(301), AqiCategory::Hazardous);
        assert_eq!(AqiCategory::from_aqi(999), AqiCategory::Hazardous);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(
            "unhealthy_sensitive".parse::<AqiCategory>().unwrap(),
            AqiCategory::UnhealthySensitive
        );
        assert!("smoggy".parse::<AqiCategory>().is_err());
    }
}
