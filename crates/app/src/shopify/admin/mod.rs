//! Shopify Admin API GraphQL client.
//!
//! Requests go through a [`GraphQLTransport`] so the HTTP layer can be
//! swapped out (tests script responses page by page). The client owns the
//! `graphql_client` envelope handling: building the request body, decoding
//! `data`/`errors`, and mapping errors.

use std::sync::Arc;

use async_trait::async_trait;
use graphql_client::QueryBody;
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use tracing::instrument;

use crate::config::ShopifyConfig;

use super::{AdminShopifyError, GraphQLError};

pub mod paginate;
pub mod products;
pub mod queries;

/// Sends one GraphQL request body and returns the raw JSON response.
///
/// Implementations map HTTP-level failures (429, 401, 5xx) onto
/// [`AdminShopifyError`]; GraphQL-level errors are left in the body.
#[async_trait]
pub trait GraphQLTransport: Send + Sync {
    /// POST a GraphQL request body.
    async fn post(&self, body: serde_json::Value) -> Result<serde_json::Value, AdminShopifyError>;
}

/// Transport that talks to `https://{store}/admin/api/{version}/graphql.json`.
pub struct ReqwestTransport {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
}

impl ReqwestTransport {
    /// Create a transport for the configured store.
    #[must_use]
    pub fn new(config: &ShopifyConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!(
                "https://{}/admin/api/{}/graphql.json",
                config.store, config.api_version
            ),
            access_token: config.access_token.clone(),
        }
    }
}

#[async_trait]
impl GraphQLTransport for ReqwestTransport {
    async fn post(&self, body: serde_json::Value) -> Result<serde_json::Value, AdminShopifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Shopify-Access-Token", self.access_token.expose_secret())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<f64>().ok())
                .map_or(2, |secs| secs.ceil() as u64);
            return Err(AdminShopifyError::RateLimited(retry_after));
        }

        // Check for unauthorized
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AdminShopifyError::Unauthorized(
                "Invalid or expired access token".to_string(),
            ));
        }

        if status.is_server_error() {
            return Err(AdminShopifyError::Server(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

/// Shopify Admin API GraphQL client.
///
/// Cheap to clone; all clones share one transport.
///
/// # Security
///
/// The default transport carries the HIGH PRIVILEGE Admin API access token.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    store: String,
    transport: Arc<dyn GraphQLTransport>,
}

impl AdminClient {
    /// Create a client that talks to Shopify over HTTPS.
    #[must_use]
    pub fn new(config: &ShopifyConfig) -> Self {
        Self::with_transport(config.store.clone(), Arc::new(ReqwestTransport::new(config)))
    }

    /// Create a client over a custom transport.
    #[must_use]
    pub fn with_transport(store: impl Into<String>, transport: Arc<dyn GraphQLTransport>) -> Self {
        Self {
            inner: Arc::new(AdminClientInner {
                store: store.into(),
                transport,
            }),
        }
    }

    /// Get the store domain.
    #[must_use]
    pub fn store(&self) -> &str {
        &self.inner.store
    }

    /// Execute a GraphQL operation and decode its `data`.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::GraphQL` if the response carries errors or
    /// no data, and whatever the transport reports for HTTP failures.
    #[instrument(skip(self, query, variables), fields(store = %self.inner.store))]
    pub async fn execute<V, D>(
        &self,
        query: &'static str,
        operation_name: &'static str,
        variables: V,
    ) -> Result<D, AdminShopifyError>
    where
        V: Serialize + Send,
        D: DeserializeOwned,
    {
        let body = serde_json::to_value(QueryBody {
            variables,
            query,
            operation_name,
        })?;

        let raw = self.inner.transport.post(body).await?;
        let response: graphql_client::Response<D> = serde_json::from_value(raw)?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            tracing::warn!(operation = operation_name, count = errors.len(), "GraphQL errors");
            return Err(AdminShopifyError::GraphQL(
                errors.into_iter().map(GraphQLError::from).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            AdminShopifyError::GraphQL(vec![GraphQLError {
                message: "No data in response".to_string(),
                locations: vec![],
                path: vec![],
            }])
        })
    }
}

/// Scripted transport for unit tests: answers requests from a queue and
/// records every request body.
#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::{AdminShopifyError, GraphQLTransport, async_trait};

    #[derive(Default)]
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<serde_json::Value, AdminShopifyError>>>,
        requests: Mutex<Vec<serde_json::Value>>,
    }

    impl ScriptedTransport {
        pub fn new(
            responses: impl IntoIterator<Item = Result<serde_json::Value, AdminShopifyError>>,
        ) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        #[allow(clippy::unwrap_used)]
        pub fn requests(&self) -> Vec<serde_json::Value> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GraphQLTransport for ScriptedTransport {
        #[allow(clippy::unwrap_used)]
        async fn post(
            &self,
            body: serde_json::Value,
        ) -> Result<serde_json::Value, AdminShopifyError> {
            self.requests.lock().unwrap().push(body);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AdminShopifyError::NotFound("script exhausted".into())))
        }
    }

    /// Build a `{data: {<root>: <connection>}}` page body.
    pub fn page(
        root: &str,
        nodes: &[serde_json::Value],
        end_cursor: Option<&str>,
        has_next_page: bool,
    ) -> serde_json::Value {
        let edges: Vec<_> = nodes
            .iter()
            .map(|n| serde_json::json!({ "node": n, "cursor": end_cursor }))
            .collect();
        serde_json::json!({
            "data": {
                root: {
                    "edges": edges,
                    "pageInfo": { "hasNextPage": has_next_page, "endCursor": end_cursor }
                }
            }
        })
    }
}
