//! Weather Sampler
//!
//! Ambient condition (clear/rain/snow/fog/..., day/night) resolved from
//! geolocation plus a forecast lookup, cached and failure-tolerant. Feeds
//! the atmosphere layer of the render pipeline; never touches presence
//! state.

pub mod codes;
pub mod sampler;

pub use codes::{condition_for_code, WeatherCondition};
pub use sampler::{
    Coordinates, FixedLocation, LocationProvider, NoLocation, WeatherSample, WeatherSampler,
    CACHE_DURATION_MS, WEATHER_CACHE_KEY,
};
