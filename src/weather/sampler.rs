//! Ambient weather resolution
//!
//! Resolves the current condition from geolocation plus a forecast lookup,
//! caching the result for 30 minutes in the key-value store. Every failure
//! path degrades to a usable sample: stale cache first, then a local-clock
//! day/night guess with clear skies. Nothing here may ever surface an error
//! to the render loop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::codes::{condition_for_code, WeatherCondition};
use crate::errors::{FaceError, Result};
use crate::store::{KvStore, KvStoreExt};

/// Store key for the cached sample
pub const WEATHER_CACHE_KEY: &str = "weather-cache";

/// Cache lifetime: 30 minutes
pub const CACHE_DURATION_MS: i64 = 30 * 60 * 1000;

const FORECAST_BASE_URL: &str = "https://api.open-meteo.com";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// One resolved weather observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSample {
    pub condition: WeatherCondition,
    pub is_day: bool,
    pub temperature: Option<f64>,
    pub fetched_at_ms: i64,
}

impl WeatherSample {
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        now_ms - self.fetched_at_ms < CACHE_DURATION_MS
    }
}

/// Geographic coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Where the face is physically located. The host decides how to answer;
/// denial is modeled as an error and triggers the clock fallback.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn locate(&self) -> Result<Coordinates>;
}

/// Static coordinates from configuration or CLI
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn locate(&self) -> Result<Coordinates> {
        Ok(self.0)
    }
}

/// No location available (permission denied analogue)
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn locate(&self) -> Result<Coordinates> {
        Err(FaceError::WeatherLookupError("no location available".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: Option<f64>,
    weather_code: Option<u32>,
    is_day: Option<u8>,
}

/// Weather sampler with store-backed caching
pub struct WeatherSampler {
    client: reqwest::Client,
    base_url: String,
    location: Arc<dyn LocationProvider>,
    store: Arc<dyn KvStore>,
}

impl WeatherSampler {
    pub fn new(location: Arc<dyn LocationProvider>, store: Arc<dyn KvStore>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .user_agent(concat!("aura-face/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                FaceError::WeatherLookupError(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: FORECAST_BASE_URL.to_string(),
            location,
            store,
        })
    }

    /// Override the forecast endpoint (tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Resolve the current sample: fresh cache, then lookup, then stale
    /// cache, then clock guess. Always returns something usable.
    pub async fn sample(&self, now_ms: i64) -> WeatherSample {
        let cached: Option<WeatherSample> = self
            .store
            .get_json(WEATHER_CACHE_KEY)
            .unwrap_or_default();

        if let Some(sample) = &cached {
            if sample.is_fresh(now_ms) {
                return sample.clone();
            }
        }

        match self.lookup(now_ms).await {
            Ok(sample) => {
                if let Err(e) = self.store.set_json(WEATHER_CACHE_KEY, &sample) {
                    warn!("Failed to cache weather sample: {}", e);
                }
                sample
            }
            Err(e) => {
                warn!("Weather lookup failed: {}", e);
                if let Some(stale) = cached {
                    debug!("Serving stale weather cache");
                    stale
                } else {
                    clock_fallback(now_ms)
                }
            }
        }
    }

    async fn lookup(&self, now_ms: i64) -> Result<WeatherSample> {
        let coords = self.location.locate().await?;
        let url = format!(
            "{}/v1/forecast?latitude={}&longitude={}&current=temperature_2m,weather_code,is_day",
            self.base_url, coords.latitude, coords.longitude
        );

        debug!("Fetching forecast from {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FaceError::WeatherLookupError(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FaceError::WeatherLookupError(format!(
                "forecast endpoint returned {status}"
            )));
        }

        let forecast: ForecastResponse = response
            .json()
            .await
            .map_err(|e| FaceError::WeatherLookupError(format!("bad forecast body: {e}")))?;

        let current = forecast
            .current
            .ok_or_else(|| FaceError::WeatherLookupError("missing current block".to_string()))?;

        Ok(WeatherSample {
            condition: condition_for_code(current.weather_code.unwrap_or(0)),
            is_day: current.is_day.unwrap_or(1) == 1,
            temperature: current.temperature_2m,
            fetched_at_ms: now_ms,
        })
    }
}

/// Day/night guess from the wall clock; condition defaults to clear
fn clock_fallback(now_ms: i64) -> WeatherSample {
    fallback_for_hour(Local::now().hour(), now_ms)
}

fn fallback_for_hour(hour: u32, now_ms: i64) -> WeatherSample {
    WeatherSample {
        condition: WeatherCondition::Clear,
        is_day: (6..20).contains(&hour),
        temperature: None,
        fetched_at_ms: now_ms,
    }
}
