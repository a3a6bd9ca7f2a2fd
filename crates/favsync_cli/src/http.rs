//! `reqwest` implementation of the engine's HTTP client.

use favsync_engine::{HttpClient, HttpFailure, HttpResponse};
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// A blocking HTTP client.
///
/// Must not be created or dropped on an async task; the scheduler runs
/// engines on the blocking pool.
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    /// Creates a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("favsync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    fn finish(result: reqwest::Result<Response>) -> Result<HttpResponse, HttpFailure> {
        let response = result.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(classify)?;
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

fn classify(error: reqwest::Error) -> HttpFailure {
    if error.is_timeout() {
        HttpFailure::Timeout(error.to_string())
    } else {
        HttpFailure::Connect(error.to_string())
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, HttpFailure> {
        Self::finish(self.client.get(url).query(query).send())
    }

    fn post(&self, url: &str, body: Vec<u8>) -> Result<HttpResponse, HttpFailure> {
        Self::finish(
            self.client
                .post(url)
                .header(CONTENT_TYPE, "application/json")
                .body(body)
                .send(),
        )
    }
}
