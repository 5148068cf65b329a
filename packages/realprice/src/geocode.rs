//! Address Resolver - free-text address to coordinates with a degrading
//! fallback.
//!
//! A resolution runs a primary lookup with the address verbatim; when that
//! finds nothing (or fails), a second lookup retries with the trailing
//! house number stripped, which catches services that index road segments
//! but not individual house numbers.

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::error::GeocodeError;
use crate::records::Coordinates;

const NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Pause inserted before the fallback lookup to respect the service's
/// rate limits.
const FALLBACK_PAUSE: Duration = Duration::from_secs(1);

/// Text-address-in, coordinates-out lookup (trait seam to allow mocking).
///
/// `Ok(None)` means the service answered but found nothing; `Err` is a
/// transport or service failure.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError>;
}

/// One result row from the Nominatim search endpoint.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Geocoder backed by Nominatim (OpenStreetMap).
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl NominatimGeocoder {
    pub fn new(user_agent: impl Into<String>) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GeocodeError::Http(Box::new(e)))?;

        Ok(Self {
            client,
            base_url: NOMINATIM_BASE_URL.to_string(),
            user_agent: user_agent.into(),
        })
    }

    /// Point the client at a different service base URL (tests use this).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let url = format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(address)
        );

        debug!(address = %address, "Geocoding address");

        let response = self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| GeocodeError::Http(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Api {
                status: status.as_u16(),
            });
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Http(Box::new(e)))?;

        let Some(place) = places.first() else {
            return Ok(None);
        };

        let lat: f64 = place.lat.parse().map_err(|_| GeocodeError::Malformed {
            reason: format!("invalid latitude: {}", place.lat),
        })?;
        let lon: f64 = place.lon.parse().map_err(|_| GeocodeError::Malformed {
            reason: format!("invalid longitude: {}", place.lon),
        })?;

        Ok(Some(Coordinates::new(lat, lon)))
    }
}

/// Strip a trailing house-number suffix from an address, reducing
/// `西湖路427號5樓` to `西湖路`. Returns the input unchanged when no house
/// number is present.
pub fn strip_house_number(address: &str) -> String {
    let trimmed = address.trim();

    // number + optional sub-number + 號, plus anything after (floor, unit)
    let with_suffix = Regex::new(r"[0-9０-９]+(之[0-9０-９]+)?號.*$").unwrap();
    let stripped = with_suffix.replace(trimmed, "");
    if stripped != trimmed {
        return stripped.trim().to_string();
    }

    let bare_digits = Regex::new(r"[0-9０-９]+$").unwrap();
    bare_digits.replace(trimmed, "").trim().to_string()
}

/// Resolves a free-text address via a primary lookup, then a degraded
/// road-level fallback, then gives up.
///
/// Both lookups failing (or finding nothing) yields `None`; network errors
/// never escape as panics or hard failures.
pub struct AddressResolver<G> {
    geocoder: G,
    fallback_pause: Duration,
}

impl<G: Geocoder> AddressResolver<G> {
    pub fn new(geocoder: G) -> Self {
        Self {
            geocoder,
            fallback_pause: FALLBACK_PAUSE,
        }
    }

    /// Shorten the rate-limit pause (tests use this).
    pub fn with_fallback_pause(mut self, pause: Duration) -> Self {
        self.fallback_pause = pause;
        self
    }

    /// Resolve an address to coordinates, or `None` when both stages fail.
    pub async fn resolve(&self, address: &str) -> Option<Coordinates> {
        match self.geocoder.geocode(address).await {
            Ok(Some(coordinates)) => return Some(coordinates),
            Ok(None) => {
                debug!(address = %address, "Primary lookup found nothing");
            }
            Err(e) => {
                warn!(address = %address, error = %e, "Primary lookup failed");
            }
        }

        let degraded = strip_house_number(address);
        if degraded.is_empty() || degraded == address.trim() {
            return None;
        }

        tokio::time::sleep(self.fallback_pause).await;

        warn!(address = %address, degraded = %degraded, "Falling back to road-level lookup");
        match self.geocoder.geocode(&degraded).await {
            Ok(found) => found,
            Err(e) => {
                warn!(address = %degraded, error = %e, "Fallback lookup failed");
                None
            }
        }
    }
}

/// A geocoder wrapper that caches successful lookups by address string.
pub struct CachedGeocoder<G> {
    inner: G,
    cache: TtlCache<Coordinates>,
}

impl<G: Geocoder> CachedGeocoder<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            cache: TtlCache::unbounded(),
        }
    }

    pub fn with_cache(inner: G, cache: TtlCache<Coordinates>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        if let Some(hit) = self.cache.get(address) {
            return Ok(Some(hit));
        }
        let result = self.inner.geocode(address).await?;
        if let Some(coordinates) = result {
            self.cache.insert(address, coordinates);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockGeocoder;

    const DEMO_ADDRESS: &str = "台中市大里區西湖路427號";
    const DEMO_ROAD: &str = "台中市大里區西湖路";

    fn taichung() -> Coordinates {
        Coordinates::new(24.099, 120.678)
    }

    #[test]
    fn strips_trailing_house_numbers() {
        assert_eq!(strip_house_number(DEMO_ADDRESS), DEMO_ROAD);
        assert_eq!(strip_house_number("西湖路427之1號"), "西湖路");
        assert_eq!(strip_house_number("西湖路427號5樓"), "西湖路");
        assert_eq!(strip_house_number("西湖路４２７號"), "西湖路");
        assert_eq!(strip_house_number("Main Road 123"), "Main Road");
        assert_eq!(strip_house_number("西湖路"), "西湖路");
    }

    #[test]
    fn stripping_changes_any_address_with_trailing_digits() {
        for address in ["中正路9號", "文心路三段99", "Road 1000號12樓"] {
            assert_ne!(strip_house_number(address), address);
        }
    }

    #[tokio::test]
    async fn primary_hit_skips_the_fallback() {
        let geocoder = MockGeocoder::new().with_answer(DEMO_ADDRESS, taichung());
        let resolver =
            AddressResolver::new(geocoder.clone()).with_fallback_pause(Duration::ZERO);

        let resolved = resolver.resolve(DEMO_ADDRESS).await;

        assert_eq!(resolved, Some(taichung()));
        assert_eq!(geocoder.calls(), vec![DEMO_ADDRESS.to_string()]);
    }

    #[tokio::test]
    async fn primary_miss_retries_with_the_house_number_stripped() {
        let geocoder = MockGeocoder::new().with_answer(DEMO_ROAD, taichung());
        let resolver =
            AddressResolver::new(geocoder.clone()).with_fallback_pause(Duration::ZERO);

        let resolved = resolver.resolve(DEMO_ADDRESS).await;

        assert_eq!(resolved, Some(taichung()));
        assert_eq!(
            geocoder.calls(),
            vec![DEMO_ADDRESS.to_string(), DEMO_ROAD.to_string()]
        );
    }

    #[tokio::test]
    async fn primary_error_still_tries_the_fallback() {
        let geocoder = MockGeocoder::new().with_answer(DEMO_ROAD, taichung());
        geocoder.fail_address(DEMO_ADDRESS);
        let resolver =
            AddressResolver::new(geocoder.clone()).with_fallback_pause(Duration::ZERO);

        assert_eq!(resolver.resolve(DEMO_ADDRESS).await, Some(taichung()));
    }

    #[tokio::test]
    async fn both_stages_failing_resolves_to_none() {
        let geocoder = MockGeocoder::new();
        let resolver =
            AddressResolver::new(geocoder.clone()).with_fallback_pause(Duration::ZERO);

        assert_eq!(resolver.resolve(DEMO_ADDRESS).await, None);
        assert_eq!(geocoder.call_count(), 2);
    }

    #[tokio::test]
    async fn address_without_a_house_number_gets_no_fallback() {
        let geocoder = MockGeocoder::new();
        let resolver =
            AddressResolver::new(geocoder.clone()).with_fallback_pause(Duration::ZERO);

        assert_eq!(resolver.resolve(DEMO_ROAD).await, None);
        assert_eq!(geocoder.call_count(), 1);
    }

    #[tokio::test]
    async fn cached_geocoder_serves_repeats_from_the_cache() {
        let inner = MockGeocoder::new().with_answer(DEMO_ADDRESS, taichung());
        let cached = CachedGeocoder::new(inner.clone());

        assert_eq!(cached.geocode(DEMO_ADDRESS).await.unwrap(), Some(taichung()));
        assert_eq!(cached.geocode(DEMO_ADDRESS).await.unwrap(), Some(taichung()));
        assert_eq!(inner.call_count(), 1);
    }

    #[tokio::test]
    async fn cached_geocoder_does_not_cache_misses() {
        let inner = MockGeocoder::new();
        let cached = CachedGeocoder::new(inner.clone());

        assert_eq!(cached.geocode(DEMO_ADDRESS).await.unwrap(), None);
        assert_eq!(cached.geocode(DEMO_ADDRESS).await.unwrap(), None);
        assert_eq!(inner.call_count(), 2);
    }
}
