//! Driving-route geometry from an OSRM-compatible service.

use std::time::Duration;

use pantry_core::{AppConfig, Coordinate};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::AgentError;
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org/";

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    geometry: Geometry,
}

/// GeoJSON line string; positions are `[lng, lat]`.
#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Clone)]
pub struct RouteClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl RouteClient {
    /// # Errors
    ///
    /// Returns [`AgentError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(timeout_secs: u64) -> Result<Self, AgentError> {
        Self::with_base_url(timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`AgentError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`AgentError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(timeout_secs: u64, base_url: &str) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("pantry/0.1 (meal-ordering)")
            .build()?;
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| AgentError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            base_url,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// # Errors
    ///
    /// See [`RouteClient::with_base_url`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, AgentError> {
        Ok(
            Self::with_base_url(config.request_timeout_secs, &config.routing_base_url)?
                .with_retry(config.max_retries, config.retry_backoff_base_ms),
        )
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    fn route_url(&self, from: Coordinate, to: Coordinate) -> Result<Url, AgentError> {
        let path = format!(
            "route/v1/driving/{},{};{},{}",
            from.lng, from.lat, to.lng, to.lat
        );
        let mut url = self
            .base_url
            .join(&path)
            .map_err(|e| AgentError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("overview", "full")
            .append_pair("geometries", "geojson");
        Ok(url)
    }

    /// Full driving polyline from `from` to `to`.
    ///
    /// # Errors
    ///
    /// - [`AgentError::Http`] on network failure or a non-2xx status.
    /// - [`AgentError::Deserialize`] if the body is not a route response.
    /// - [`AgentError::Api`] if the service reports no usable route.
    pub async fn route(
        &self,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<Vec<Coordinate>, AgentError> {
        let url = self.route_url(from, to)?;
        let url = &url;
        let response = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.get_route(url)
        })
        .await?;

        if response.code != "Ok" {
            return Err(AgentError::Api(format!("routing failed: {}", response.code)));
        }
        let route = response
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Api("routing returned no routes".to_owned()))?;
        if route.geometry.coordinates.len() < 2 {
            return Err(AgentError::Api("route geometry has fewer than two points".to_owned()));
        }

        Ok(route
            .geometry
            .coordinates
            .into_iter()
            .map(|[lng, lat]| Coordinate::new(lat, lng))
            .collect())
    }

    /// [`RouteClient::route`], or the straight segment `[from, to]` when the
    /// service cannot provide one.
    pub async fn route_or_straight(&self, from: Coordinate, to: Coordinate) -> Vec<Coordinate> {
        match self.route(from, to).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "route lookup failed; using straight line");
                vec![from, to]
            }
        }
    }

    async fn get_route(&self, url: &Url) -> Result<RouteResponse, AgentError> {
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| AgentError::Deserialize {
            context: url.path().to_owned(),
            source: e,
        })
    }
}
