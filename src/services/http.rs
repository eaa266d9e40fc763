// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! REST client for the onboarding backend

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{AddressLookup, Organization, OrganizationService, SessionService, UserProfile, ZipLookup};
use crate::config::ApiConfig;
use crate::enrichment::{AnalysisContext, AnalysisResponse, EnrichmentService, Suggestion};
use crate::submission::OrganizationPayload;
use crate::{OnboardError, Result};

const HEALTH_PATH: &str = "/api/health";
const ANALYZE_PATH: &str = "/api/enrichment/analyze-website";
const ORGANIZATIONS_PATH: &str = "/api/organizations";
const CURRENT_USER_PATH: &str = "/api/users/me";

/// Backend API client
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
    retries: u32,
}

#[derive(serde::Serialize)]
struct AnalyzeRequest<'a> {
    website: &'a str,
    context: &'a AnalysisContext,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            retries: config.retries,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the backend is reachable
    pub async fn health_check(&self) -> Result<()> {
        self.request(Method::GET, HEALTH_PATH)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| {
                OnboardError::ServiceUnavailable(format!(
                    "Cannot connect to backend at {}: {}",
                    self.base_url, e
                ))
            })?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request_id = Uuid::new_v4().to_string();
        debug!("{} {} ({})", method, url, request_id);

        let builder = self.client.request(method, url).header("X-Request-Id", request_id);
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and turn non-2xx statuses into errors
    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(OnboardError::ServiceStatus {
            status: status.as_u16(),
            message: truncate(&message, 200),
        })
    }

    /// Send with retry on transport errors and 5xx responses
    async fn send_with_retry<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..=self.retries {
            if attempt > 0 {
                let delay = Duration::from_secs(2u64.pow(attempt - 1));
                warn!("Retrying request in {:?} (attempt {})", delay, attempt + 1);
                tokio::time::sleep(delay).await;
            }

            match self.send(build()).await {
                Ok(response) => return Ok(response),
                Err(e) if is_retryable(&e) => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            OnboardError::ServiceUnavailable("Unknown error".to_string())
        }))
    }
}

fn is_retryable(error: &OnboardError) -> bool {
    match error {
        OnboardError::Api(e) => e.is_timeout() || e.is_connect(),
        OnboardError::ServiceStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[async_trait]
impl EnrichmentService for ApiClient {
    async fn analyze(&self, website: &str, context: &AnalysisContext) -> Result<Vec<Suggestion>> {
        let body = AnalyzeRequest { website, context };
        let response = self
            .send_with_retry(|| self.request(Method::POST, ANALYZE_PATH).json(&body))
            .await?;
        let parsed: AnalysisResponse = response
            .json()
            .await
            .map_err(|e| OnboardError::Enrichment(format!("Malformed analysis response: {}", e)))?;
        Ok(parsed.into_suggestions())
    }
}

#[async_trait]
impl OrganizationService for ApiClient {
    async fn create(&self, payload: &OrganizationPayload) -> Result<Organization> {
        // Not retried: a timed-out create may still have succeeded
        let response = self
            .send(self.request(Method::POST, ORGANIZATIONS_PATH).json(payload))
            .await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SessionService for ApiClient {
    async fn get_current_user(&self) -> Result<UserProfile> {
        let response = self
            .send_with_retry(|| self.request(Method::GET, CURRENT_USER_PATH))
            .await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AddressLookup for ApiClient {
    async fn lookup_by_zip_code(&self, zip: &str) -> Result<Option<ZipLookup>> {
        let path = format!("/api/address/zip/{}", zip.trim());
        match self.send_with_retry(|| self.request(Method::GET, &path)).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(OnboardError::ServiceStatus { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn get_cities_by_state(&self, state_code: &str) -> Result<Vec<String>> {
        let path = format!("/api/address/states/{}/cities", state_code.trim());
        let response = self.send_with_retry(|| self.request(Method::GET, &path)).await?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: server.uri(),
            timeout_secs: 5,
            retries: 0,
            auth_token: Some("token-123".to_string()),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_analyze_posts_website_and_context() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .and(header("authorization", "Bearer token-123"))
            .and(header_exists("x-request-id"))
            .and(body_partial_json(json!({
                "website": "acme.co",
                "context": { "client_name": "Acme", "market_sector": "retail" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "suggestions": { "company_name": { "value": "Acme Co", "confidence": 0.9 } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let context = AnalysisContext {
            client_name: "Acme".to_string(),
            market_sector: "retail".to_string(),
        };
        let suggestions = client_for(&server).analyze("acme.co", &context).await.unwrap();
        assert_eq!(suggestions, vec![Suggestion::new("company_name", json!("Acme Co"), 0.9)]);
    }

    #[tokio::test]
    async fn test_malformed_analysis_response_is_enrichment_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .analyze("acme.co", &AnalysisContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OnboardError::Enrichment(_)));
    }

    #[tokio::test]
    async fn test_create_surfaces_status_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ORGANIZATIONS_PATH))
            .respond_with(ResponseTemplate::new(422).set_body_string("name taken"))
            .mount(&server)
            .await;

        let payload = OrganizationPayload {
            name: "Acme".to_string(),
            ..Default::default()
        };
        let err = client_for(&server).create(&payload).await.unwrap_err();
        match err {
            OnboardError::ServiceStatus { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "name taken");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_current_user_keeps_unknown_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CURRENT_USER_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u1", "email": "ops@acme.co", "organization_id": "org-9", "role": "admin"
            })))
            .mount(&server)
            .await;

        let user = client_for(&server).get_current_user().await.unwrap();
        assert_eq!(user.organization_id.as_deref(), Some("org-9"));
        assert_eq!(user.extra["role"], "admin");
    }

    #[tokio::test]
    async fn test_zip_lookup_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/address/zip/00000"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/address/zip/94107"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "city": "San Francisco", "state_code": "CA"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.lookup_by_zip_code("00000").await.unwrap(), None);
        assert_eq!(
            client.lookup_by_zip_code("94107").await.unwrap(),
            Some(ZipLookup { city: "San Francisco".into(), state_code: "CA".into() })
        );
    }

    #[test]
    fn test_only_transient_errors_retry() {
        assert!(is_retryable(&OnboardError::ServiceStatus { status: 503, message: String::new() }));
        assert!(!is_retryable(&OnboardError::ServiceStatus { status: 400, message: String::new() }));
        assert!(!is_retryable(&OnboardError::Config("x".into())));
    }
}
