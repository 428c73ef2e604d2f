use crate::config::EnrichmentConfig;
use crate::domain::model::SongInfo;
use crate::domain::ports::EnrichmentClient;
use crate::utils::error::EnrichmentError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Enrichment provider reached over HTTP: `GET {base}/info?group=..&song=..`.
pub struct HttpEnrichmentClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpEnrichmentClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EnrichmentError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
        })
    }

    pub fn from_config(config: &EnrichmentConfig) -> Result<Self, EnrichmentError> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn info_url(&self, group_name: &str, title: &str) -> Result<Url, EnrichmentError> {
        let mut url = Url::parse(&format!("{}/info", self.base_url.trim_end_matches('/')))?;
        url.query_pairs_mut()
            .append_pair("group", group_name)
            .append_pair("song", title);
        Ok(url)
    }
}

#[async_trait]
impl EnrichmentClient for HttpEnrichmentClient {
    async fn fetch_info(&self, group_name: &str, title: &str) -> Result<SongInfo, EnrichmentError> {
        let url = self.info_url(group_name, title)?;
        tracing::debug!("Making enrichment request to: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                EnrichmentError::Timeout(self.timeout)
            } else {
                EnrichmentError::Request(e)
            }
        })?;

        tracing::debug!("Enrichment response status: {}", response.status());

        if response.status() != StatusCode::OK {
            return Err(EnrichmentError::UnexpectedStatus {
                status: response.status().as_u16(),
            });
        }

        response.json::<SongInfo>().await.map_err(|e| {
            if e.is_timeout() {
                EnrichmentError::Timeout(self.timeout)
            } else if e.is_decode() {
                EnrichmentError::Decode(e)
            } else {
                EnrichmentError::Request(e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_info_url_encodes_query() {
        let client =
            HttpEnrichmentClient::new("http://localhost:3000/", Duration::from_secs(1)).unwrap();
        let url = client.info_url("AC/DC", "Back in Black & Blue").unwrap();

        assert_eq!(url.path(), "/info");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("group".to_string(), "AC/DC".to_string()),
                ("song".to_string(), "Back in Black & Blue".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_info_success() {
        let server = MockServer::start();
        let info_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/info")
                .query_param("group", "Muse")
                .query_param("song", "Supermassive Black Hole");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "releaseDate": "16.07.2006",
                    "text": "Ooh baby, don't you know I suffer?",
                    "link": "https://www.youtube.com/watch?v=Xsp3_a-PMTw"
                }));
        });

        let client = HttpEnrichmentClient::new(server.base_url(), Duration::from_secs(5)).unwrap();
        let info = client
            .fetch_info("Muse", "Supermassive Black Hole")
            .await
            .unwrap();

        info_mock.assert();
        assert_eq!(info.release_date, "16.07.2006");
        assert_eq!(info.link, "https://www.youtube.com/watch?v=Xsp3_a-PMTw");
    }

    #[tokio::test]
    async fn test_fetch_info_rejects_non_200() {
        let server = MockServer::start();
        let info_mock = server.mock(|when, then| {
            when.method(GET).path("/info");
            then.status(500);
        });

        let client = HttpEnrichmentClient::new(server.base_url(), Duration::from_secs(5)).unwrap();
        let err = client.fetch_info("Muse", "Uprising").await.unwrap_err();

        info_mock.assert();
        assert!(matches!(err, EnrichmentError::UnexpectedStatus { status: 500 }));
    }

    #[tokio::test]
    async fn test_fetch_info_rejects_other_success_codes() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/info");
            then.status(204);
        });

        let client = HttpEnrichmentClient::new(server.base_url(), Duration::from_secs(5)).unwrap();
        let err = client.fetch_info("Muse", "Uprising").await.unwrap_err();
        assert!(matches!(err, EnrichmentError::UnexpectedStatus { status: 204 }));
    }

    #[tokio::test]
    async fn test_fetch_info_times_out() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/info");
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(serde_json::json!({"releaseDate": "", "text": "", "link": ""}));
        });

        let client =
            HttpEnrichmentClient::new(server.base_url(), Duration::from_millis(200)).unwrap();
        let err = client.fetch_info("Muse", "Uprising").await.unwrap_err();
        assert!(matches!(err, EnrichmentError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_fetch_info_rejects_malformed_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/info");
            then.status(200).body("not json");
        });

        let client = HttpEnrichmentClient::new(server.base_url(), Duration::from_secs(5)).unwrap();
        let err = client.fetch_info("Muse", "Uprising").await.unwrap_err();
        assert!(matches!(err, EnrichmentError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_info_rejects_body_missing_fields() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/info");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"releaseDate": "16.07.2006"}));
        });

        let client = HttpEnrichmentClient::new(server.base_url(), Duration::from_secs(5)).unwrap();
        let err = client.fetch_info("Muse", "Uprising").await.unwrap_err();
        assert!(matches!(err, EnrichmentError::Decode(_)));
        assert!(err.to_string().contains("could not be decoded"));
    }
}
