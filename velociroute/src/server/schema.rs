//! Request and response bodies of the HTTP service.

use crate::condition::{ClassificationResult, ConditionLabel};
use crate::route::{RoutePoint, RouteReport};
use crate::server::ApiError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct ImageRequest {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteRequest {
    pub images: Vec<RouteImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteImage {
    pub url: String,
    /// Accepts a number or a numeric string; missing means `0`.
    #[serde(default, deserialize_with = "distance_marker")]
    pub kilometer: f64,
}

fn distance_marker<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Marker {
        Number(f64),
        Text(String),
    }

    match Marker::deserialize(deserializer)? {
        Marker::Number(value) => Ok(value),
        Marker::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid kilometer value: {:?}", text))),
    }
}

impl ImageRequest {
    pub fn validate(&self) -> Result<&str, ApiError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ApiError::BadRequest("url must not be empty".to_string()));
        }
        Ok(url)
    }
}

impl RouteRequest {
    /// Rejects empty routes, blank urls and non-finite markers before any work starts.
    pub fn into_points(self) -> Result<Vec<RoutePoint>, ApiError> {
        if self.images.is_empty() {
            return Err(ApiError::BadRequest(
                "images must contain at least one entry".to_string(),
            ));
        }

        self.images
            .into_iter()
            .enumerate()
            .map(|(index, image)| {
                let url = image.url.trim();
                if url.is_empty() {
                    return Err(ApiError::BadRequest(format!(
                        "images[{}].url must not be empty",
                        index
                    )));
                }
                if !image.kilometer.is_finite() {
                    return Err(ApiError::BadRequest(format!(
                        "images[{}].kilometer must be finite",
                        index
                    )));
                }
                Ok(RoutePoint::new(url, image.kilometer))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub labels: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PointClassification {
    pub kilometer: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClassificationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteResponse {
    pub message: &'static str,
    pub total_points: usize,
    pub processed_points: usize,
    pub condition_summary: BTreeMap<ConditionLabel, f64>,
    pub narrative: String,
    pub point_classifications: Vec<PointClassification>,
}

impl From<RouteReport> for RouteResponse {
    fn from(report: RouteReport) -> Self {
        let point_classifications = report
            .outcomes
            .into_iter()
            .map(|outcome| match outcome.result {
                Ok(classification) => PointClassification {
                    kilometer: outcome.distance_marker,
                    classification: Some(classification),
                    error: None,
                },
                Err(e) => PointClassification {
                    kilometer: outcome.distance_marker,
                    classification: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();

        Self {
            message: "Route analysis completed",
            total_points: report.total_points,
            processed_points: report.processed_points,
            condition_summary: report.condition_summary,
            narrative: report.narrative,
            point_classifications,
        }
    }
}
