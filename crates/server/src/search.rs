//! Restaurant lookup against an Elasticsearch/OpenSearch index.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use foody_core::config::SearchConfig;
use foody_core::domain::restaurant::capitalize_cuisine;
use foody_core::errors::ApplicationError;
use foody_core::ports::RestaurantSearch;
use foody_core::BusinessId;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
}

pub struct ElasticsearchClient {
    client: Client,
    search_url: String,
    username: Option<String>,
    password: Option<SecretString>,
    max_hits: u32,
}

impl ElasticsearchClient {
    pub fn from_config(config: &SearchConfig) -> Result<Self, ApplicationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|error| ApplicationError::Configuration(format!("search client: {error}")))?;

        Ok(Self {
            client,
            search_url: format!(
                "{}/{}/_search",
                config.base_url.trim_end_matches('/'),
                config.index
            ),
            username: config.username.clone(),
            password: config.password.clone(),
            max_hits: config.max_hits,
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    pub fn query_body(&self, cuisine: &str) -> Value {
        json!({
            "query": {
                "match": {
                    "Cuisine": {
                        "query": capitalize_cuisine(cuisine),
                        "operator": "and"
                    }
                }
            },
            "size": self.max_hits
        })
    }
}

#[async_trait]
impl RestaurantSearch for ElasticsearchClient {
    async fn find_business_ids(&self, cuisine: &str) -> Result<Vec<BusinessId>, ApplicationError> {
        let mut request = self.client.post(&self.search_url).json(&self.query_body(cuisine));
        if let Some(username) = &self.username {
            request = request
                .basic_auth(username, self.password.as_ref().map(|password| password.expose_secret()));
        }

        let response = request
            .send()
            .await
            .map_err(|error| ApplicationError::Integration(format!("search request: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                event_name = "search.query.rejected",
                cuisine = %cuisine,
                status = status.as_u16(),
                "search index rejected query"
            );
            return Err(ApplicationError::Integration(format!(
                "search index returned status {status}"
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|error| ApplicationError::Integration(format!("search response: {error}")))?;

        let ids = parsed.hits.hits.into_iter().map(|hit| BusinessId(hit.id)).collect::<Vec<_>>();
        debug!(
            event_name = "search.query.completed",
            cuisine = %cuisine,
            hit_count = ids.len(),
            "search index answered"
        );
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    use foody_core::config::AppConfig;
    use foody_core::ports::RestaurantSearch;
    use foody_core::{ApplicationError, BusinessId};

    use super::ElasticsearchClient;

    type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    async fn spawn_index(status: StatusCode, reply: Value) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let router = Router::new()
            .route(
                "/restaurants/_search",
                post(
                    move |State(captured): State<Captured>,
                          headers: HeaderMap,
                          Json(body): Json<Value>| {
                        let reply = reply.clone();
                        async move {
                            let auth = headers
                                .get("authorization")
                                .and_then(|value| value.to_str().ok())
                                .map(str::to_string);
                            if let Ok(mut requests) = captured.lock() {
                                requests.push((auth, body));
                            }
                            (status, Json(reply))
                        }
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        (format!("http://{address}"), captured)
    }

    fn client(base_url: &str, with_auth: bool) -> ElasticsearchClient {
        let mut config = AppConfig::default().search;
        config.base_url = base_url.to_string();
        if with_auth {
            config.username = Some("search-user".to_string());
            config.password = Some("search-pass".to_string().into());
        }
        ElasticsearchClient::from_config(&config).expect("client")
    }

    #[test]
    fn query_body_capitalizes_cuisine_and_caps_size() {
        let client = client("http://localhost:9200/", false);

        assert_eq!(client.search_url(), "http://localhost:9200/restaurants/_search");
        assert_eq!(
            client.query_body("chinese"),
            json!({
                "query": {"match": {"Cuisine": {"query": "Chinese", "operator": "and"}}},
                "size": 1000
            })
        );
    }

    #[tokio::test]
    async fn hit_ids_become_business_ids_with_basic_auth() {
        let (base_url, captured) = spawn_index(
            StatusCode::OK,
            json!({"hits": {"total": {"value": 2}, "hits": [
                {"_id": "biz-a", "_source": {"Cuisine": "Thai"}},
                {"_id": "biz-b", "_source": {"Cuisine": "Thai"}}
            ]}}),
        )
        .await;

        let ids = client(&base_url, true).find_business_ids("THAI").await.expect("search");

        assert_eq!(ids, vec![BusinessId("biz-a".to_string()), BusinessId("biz-b".to_string())]);
        let requests = captured.lock().expect("lock").clone();
        assert_eq!(requests.len(), 1);
        let (auth, body) = &requests[0];
        assert!(auth.as_deref().is_some_and(|value| value.starts_with("Basic ")));
        assert_eq!(body["query"]["match"]["Cuisine"]["query"], "Thai");
    }

    #[tokio::test]
    async fn empty_hits_and_failures_are_distinguished() {
        let (empty_url, _) = spawn_index(StatusCode::OK, json!({"hits": {"hits": []}})).await;
        assert!(client(&empty_url, false).find_business_ids("thai").await.expect("ok").is_empty());

        let (failing_url, _) =
            spawn_index(StatusCode::SERVICE_UNAVAILABLE, json!({"error": "red cluster"})).await;
        let error = client(&failing_url, false)
            .find_business_ids("thai")
            .await
            .expect_err("503 should fail");
        assert!(matches!(error, ApplicationError::Integration(_)));
    }
}
