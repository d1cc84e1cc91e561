//! Address lookup against a Nominatim-compatible search endpoint.

use crate::config::GeocoderConfig;
use crate::types::LatLon;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Coordinates of the best match for `address`. One attempt, no retries.
    async fn geocode(&self, address: &str) -> Result<LatLon>;
}

pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to build geocoder HTTP client")?;
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid geocoder base URL: {}", config.base_url))?;

        Ok(Self { client, base_url })
    }

    /// `{base}/search/{address}?format=json`, with the address escaped as a
    /// single path segment.
    pub fn search_url(&self, address: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Geocoder base URL cannot take a path: {}", self.base_url))?
            .pop_if_empty()
            .push("search")
            .push(address);
        url.query_pairs_mut().append_pair("format", "json");
        Ok(url)
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<LatLon> {
        let url = self.search_url(address)?;
        debug!(%url, "Geocoding address");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Geocoding request failed")?;

        let status = response.status();
        if status != StatusCode::OK {
            bail!("Geocoder returned {}", status);
        }

        let body = response
            .text()
            .await
            .context("Failed to read geocoder response")?;
        parse_places(&body)
    }
}

/// First result of a Nominatim JSON array.
pub fn parse_places(body: &str) -> Result<LatLon> {
    let places: Vec<Place> =
        serde_json::from_str(body).context("Unexpected geocoder response format")?;
    let first = places
        .first()
        .ok_or_else(|| anyhow!("Geocoder returned no results"))?;

    let lat = first
        .lat
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid latitude: {}", first.lat))?;
    let lon = first
        .lon
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid longitude: {}", first.lon))?;

    Ok(LatLon { lat, lon })
}
