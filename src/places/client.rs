use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::Config;
use crate::error::PlacesError;

use super::PlaceSearchProvider;
use super::models::{
    DetailsResponse, NearbyQuery, NearbySearchResponse, PlaceCandidate, PlaceDetails,
};

/// Google Places HTTP 客户端
pub struct GooglePlacesClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl GooglePlacesClient {
    pub fn new(config: &Config) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            api_key: config.places_api_key.clone(),
            base_url: config.places_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn location_param(query: &NearbyQuery) -> String {
        format!("{},{}", query.location.latitude, query.location.longitude)
    }
}

#[async_trait]
impl PlaceSearchProvider for GooglePlacesClient {
    async fn nearby_search(&self, query: &NearbyQuery) -> Result<Vec<PlaceCandidate>, PlacesError> {
        let url = format!("{}/nearbysearch/json", self.base_url);

        let mut params = vec![
            ("key".to_string(), self.api_key.clone()),
            ("location".to_string(), Self::location_param(query)),
            ("type".to_string(), "restaurant".to_string()),
        ];
        // radius 与 rankby=distance 互斥
        if query.rank_by_distance {
            params.push(("rankby".to_string(), "distance".to_string()));
        } else {
            params.push(("radius".to_string(), format!("{}", query.radius as u32)));
        }
        if let Some(keyword) = &query.keyword {
            params.push(("keyword".to_string(), keyword.clone()));
        }

        let response: NearbySearchResponse = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await?
            .json()
            .await?;

        match response.status.as_str() {
            "OK" => Ok(response
                .results
                .into_iter()
                .filter_map(|summary| summary.into_candidate())
                .collect()),
            "ZERO_RESULTS" => Ok(Vec::new()),
            "REQUEST_DENIED" | "INVALID_REQUEST" => Err(PlacesError::Denied(
                response
                    .error_message
                    .unwrap_or_else(|| response.status.clone()),
            )),
            _ => Err(PlacesError::Transient(response.status.clone())),
        }
    }

    async fn get_details(
        &self,
        place_id: &str,
        fields: &[&str],
    ) -> Result<PlaceDetails, PlacesError> {
        let url = format!("{}/details/json", self.base_url);
        let fields_param = fields.join(",");

        let response: DetailsResponse = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("place_id", place_id),
                ("fields", fields_param.as_str()),
            ])
            .send()
            .await?
            .json()
            .await?;

        match response.status.as_str() {
            "OK" => match response.result {
                Some(result) => Ok(result.into_details()),
                // OK 但没有 result, 按临时性失败跳过该地点
                None => Err(PlacesError::Transient("OK_EMPTY_RESULT".to_string())),
            },
            "REQUEST_DENIED" | "INVALID_REQUEST" => Err(PlacesError::Denied(
                response
                    .error_message
                    .unwrap_or_else(|| response.status.clone()),
            )),
            _ => Err(PlacesError::Transient(response.status.clone())),
        }
    }
}
