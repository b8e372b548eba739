//! WMO weather-code mapping
//!
//! The forecast endpoint reports a numeric `weather_code`; the face only
//! distinguishes a small set of visual conditions.

use serde::{Deserialize, Serialize};

/// Visual weather condition driving the atmosphere layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    HeavySnow,
    Thunderstorm,
}

impl WeatherCondition {
    /// Precipitation that falls from the top of the surface
    pub fn is_precipitation(self) -> bool {
        matches!(
            self,
            Self::Drizzle
                | Self::Rain
                | Self::HeavyRain
                | Self::Snow
                | Self::HeavySnow
                | Self::Thunderstorm
        )
    }

    pub fn is_rainy(self) -> bool {
        matches!(
            self,
            Self::Drizzle | Self::Rain | Self::HeavyRain | Self::Thunderstorm
        )
    }

    pub fn is_snowy(self) -> bool {
        matches!(self, Self::Snow | Self::HeavySnow)
    }
}

/// Map an Open-Meteo WMO code to a condition. Unknown codes read as clear
/// skies rather than failing.
pub fn condition_for_code(code: u32) -> WeatherCondition {
    match code {
        0 | 1 => WeatherCondition::Clear,
        2 => WeatherCondition::PartlyCloudy,
        3 => WeatherCondition::Cloudy,
        45 | 48 => WeatherCondition::Fog,
        51 | 53 | 55 => WeatherCondition::Drizzle,
        61 | 63 | 80 | 81 => WeatherCondition::Rain,
        65 | 82 => WeatherCondition::HeavyRain,
        71 | 73 | 77 | 85 => WeatherCondition::Snow,
        75 | 86 => WeatherCondition::HeavySnow,
        95 | 96 | 99 => WeatherCondition::Thunderstorm,
        _ => WeatherCondition::Clear,
    }
}
