//! Confluence REST transport.
//!
//! Every request carries basic auth. Any non-success status becomes a
//! `DirectoryError::Api` carrying the `message` field of the error body.

use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use wiki_publish_core::DirectoryError;

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Confluence REST API client.
pub struct ConfluenceClient {
    http: Client,
    base_url: String,
    login: String,
    password: String,
}

impl ConfluenceClient {
    pub fn new(base_url: &str, login: &str, password: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            login: login.to_string(),
            password: password.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` with `query` and decode the JSON response.
    #[instrument(skip(self), level = "debug")]
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, DirectoryError> {
        let url = self.url(path);
        let response = self
            .send(Method::GET, &url, self.http.get(&url).query(query))
            .await?;
        decode(response).await
    }

    /// POST a JSON body to `path` and decode the JSON response.
    #[instrument(skip(self, body), level = "debug")]
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DirectoryError> {
        let url = self.url(path);
        let response = self
            .send(Method::POST, &url, self.http.post(&url).json(body))
            .await?;
        decode(response).await
    }

    /// PUT a JSON body to `path`, discarding the response body.
    #[instrument(skip(self, body), level = "debug")]
    pub async fn put_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), DirectoryError> {
        let url = self.url(path);
        self.send(Method::PUT, &url, self.http.put(&url).json(body))
            .await?;
        Ok(())
    }

    /// POST a multipart form to `path`, discarding the response body.
    #[instrument(skip(self, form, headers), level = "debug")]
    pub async fn post_multipart(
        &self,
        path: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
        form: Form,
    ) -> Result<(), DirectoryError> {
        let url = self.url(path);
        let mut request = self.http.post(&url).query(query).multipart(form);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        self.send(Method::POST, &url, request).await?;
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        request: RequestBuilder,
    ) -> Result<Response, DirectoryError> {
        let response = request
            .basic_auth(&self.login, Some(&self.password))
            .send()
            .await
            .map_err(|e| DirectoryError::Request(format!("{} {}: {}", method, url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.message)
                .unwrap_or(text);
            return Err(DirectoryError::Api {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        debug!("{} {} -> {}", method, url, status);
        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, DirectoryError> {
    let body = response
        .bytes()
        .await
        .map_err(|e| DirectoryError::Request(format!("failed to read response: {}", e)))?;
    serde_json::from_slice(&body).map_err(|e| DirectoryError::Decode(e.to_string()))
}
