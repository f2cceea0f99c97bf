//! TMDB provider: movie search and details over the v3 REST API with a v4 bearer token.

use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    models::{TmdbMovieDetails, TmdbSearchPage, TmdbSearchResult},
    services::providers::MovieLookup,
};

#[derive(Clone)]
pub struct TmdbLookup {
    http_client: HttpClient,
    access_token: String,
    api_url: String,
}

impl TmdbLookup {
    pub fn new(access_token: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            access_token,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http_client
            .get(format!("{}{}", self.api_url, path))
            .bearer_auth(&self.access_token)
            .query(&[("language", "en-US")])
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound("Movie not found on TMDB".to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl MovieLookup for TmdbLookup {
    async fn search(&self, query: &str) -> AppResult<Vec<TmdbSearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .get("/search/movie")
            .query(&[("query", query), ("page", "1"), ("include_adult", "false")])
            .send()
            .await?;

        let page: TmdbSearchPage = Self::parse(response).await?;

        tracing::info!(
            query = %query,
            results = page.results.len(),
            provider = self.name(),
            "Movie search completed"
        );

        Ok(page.results)
    }

    async fn details(&self, tmdb_id: i64) -> AppResult<TmdbMovieDetails> {
        let response = self
            .get(&format!("/movie/{}", tmdb_id))
            .query(&[("append_to_response", "credits")])
            .send()
            .await?;

        let details: TmdbMovieDetails = Self::parse(response).await?;
        tracing::debug!(tmdb_id, title = %details.title, "Fetched movie details");
        Ok(details)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
