//! Shopify Admin API client (HIGH PRIVILEGE).
//!
//! # Security
//!
//! **This module holds the high-privilege Admin API access token.**
//!
//! The app only reads products, customers and orders, and creates demo
//! products, but the token itself usually grants more than that.
//!
//! # Architecture
//!
//! - `graphql_client` request/response envelopes over a pluggable transport
//! - One typed query shape per connection (no dotted-path response walking)
//! - [`Paginator`] walks connections with bounded retry and backoff
//!
//! # Example
//!
//! ```rust,ignore
//! use storepulse_app::shopify::{AdminClient, Paginator, ProductsQuery};
//!
//! let client = AdminClient::new(&config.shopify);
//! let paginator = Paginator::new(&client, &config.sync);
//!
//! let total = paginator.count_all::<ProductsQuery>(Default::default()).await?;
//! ```

mod admin;
pub mod types;

pub use admin::paginate::{DEFAULT_COLLECT_LIMIT, Page, Paginator, RetryPolicy};
pub use admin::products::{
    COLORS, CreatedProduct, CreatedVariant, DEMO_VARIANT_PRICE, GeneratedProduct, random_color,
};
pub use admin::queries::{
    ConnectionQuery, CustomersQuery, NoFilter, OrderFilter, OrdersQuery, PageVariables,
    ProductsQuery,
};
pub use admin::{AdminClient, GraphQLTransport, ReqwestTransport};
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with Shopify Admin API.
#[derive(Debug, Error)]
pub enum AdminShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Shopify answered with a server error status.
    #[error("Server error: HTTP {0}")]
    Server(u16),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),
}

impl AdminShopifyError {
    /// Whether retrying the same request may succeed.
    ///
    /// Rate limiting, 5xx answers, timeouts and connection failures are
    /// transient. GraphQL errors, bad credentials and decode failures are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::Server(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::GraphQL(_)
            | Self::Parse(_)
            | Self::NotFound(_)
            | Self::Unauthorized(_)
            | Self::UserError(_) => false,
        }
    }
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

impl From<graphql_client::Error> for GraphQLError {
    fn from(e: graphql_client::Error) -> Self {
        Self {
            message: e.message,
            locations: e
                .locations
                .unwrap_or_default()
                .into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect(),
            path: e
                .path
                .unwrap_or_default()
                .into_iter()
                .map(|fragment| match fragment {
                    graphql_client::PathFragment::Key(key) => serde_json::Value::String(key),
                    graphql_client::PathFragment::Index(index) => serde_json::Value::from(index),
                })
                .collect(),
        }
    }
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}
