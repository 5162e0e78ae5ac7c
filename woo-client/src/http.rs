//! Signed HTTP client for the remote platform REST API

use crate::config::API_PREFIX;
use crate::oauth::{OAuthParams, signed_query};
use crate::{ClientError, ClientResult, WooConfig};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

/// HTTP client that signs every request with OAuth1 query parameters
#[derive(Debug, Clone)]
pub struct WooClient {
    client: Client,
    config: WooConfig,
}

impl WooClient {
    /// Create a new HTTP client from configuration.
    ///
    /// Missing credentials are not an error here; they fail the individual call.
    pub fn new(config: &WooConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout.max(1)))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &WooConfig {
        &self.config
    }

    /// `{base}/wp-json/wc/v3/{path}`
    fn endpoint(base_url: &str, path: &str) -> ClientResult<Url> {
        let raw = format!(
            "{}/{}/{}",
            base_url.trim_end_matches('/'),
            API_PREFIX,
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&raw)?)
    }

    async fn send<T, B>(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        body: Option<&B>,
    ) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let credentials = self.config.credentials()?;
        let url = Self::endpoint(credentials.base_url, path)?;
        let oauth = OAuthParams::new(credentials.consumer_key);
        let query = signed_query(
            method.as_str(),
            url.as_str(),
            params,
            &oauth,
            credentials.consumer_secret,
        )?;

        tracing::debug!(method = %method, path = %path, "Remote request");

        let mut request = self.client.request(method, url).query(&query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> ClientResult<T> {
        self.send::<T, ()>(Method::GET, path, params, None).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(Method::PUT, path, &[], Some(body)).await
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return match status {
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                StatusCode::FORBIDDEN => Err(ClientError::Forbidden(text)),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(text)),
                StatusCode::BAD_REQUEST => Err(ClientError::Validation(text)),
                _ => Err(ClientError::Remote {
                    status: status.as_u16(),
                    body: text,
                }),
            };
        }

        serde_json::from_str(&text)
            .map_err(|e| ClientError::InvalidResponse(format!("{} (body: {:.200})", e, text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_prefix() {
        let url = WooClient::endpoint("https://shop.example.com/", "/orders/7").unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/wp-json/wc/v3/orders/7");
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_the_call() {
        let client = WooConfig::new("https://shop.example.com").build_client().unwrap();
        let result: ClientResult<serde_json::Value> = client.get("orders", &[]).await;
        assert!(matches!(result, Err(ClientError::NotConfigured("consumer key"))));
    }
}
