//! Typed connection queries.
//!
//! Each query shape knows its GraphQL text, its extra variables, and how to
//! reach the connection inside its `data` payload.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::shopify::types::{Connection, CustomerNode, OrderNode, ProductNode};

/// A paginated Admin API query over one connection.
pub trait ConnectionQuery {
    /// Variables merged next to `first`/`after`.
    type Filter: Serialize + Clone + Send + Sync;
    /// Shape of the `data` payload.
    type Data: DeserializeOwned + Send;
    /// Node type of the connection.
    type Node: Send;

    /// GraphQL document.
    const QUERY: &'static str;
    /// Operation name inside [`Self::QUERY`].
    const OPERATION_NAME: &'static str;

    /// Pull the connection out of the decoded payload.
    fn connection(data: Self::Data) -> Connection<Self::Node>;
}

/// Variables for one page request.
#[derive(Debug, Clone, Serialize)]
pub struct PageVariables<F> {
    pub first: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(flatten)]
    pub filter: F,
}

/// No extra variables.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NoFilter {}

/// Search filter for the orders connection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl OrderFilter {
    /// Orders created within `start..=end` (`YYYY-MM-DD`).
    #[must_use]
    pub fn created_between(start: &str, end: &str) -> Self {
        Self {
            query: Some(format!("created_at:>={start} created_at:<={end}")),
        }
    }
}

pub struct ProductsQuery;

#[derive(Debug, Deserialize)]
pub struct ProductsData {
    #[serde(default)]
    pub products: Connection<ProductNode>,
}

impl ConnectionQuery for ProductsQuery {
    type Filter = NoFilter;
    type Data = ProductsData;
    type Node = ProductNode;

    const QUERY: &'static str = r"
query listProducts($first: Int!, $after: String) {
  products(first: $first, after: $after) {
    edges { cursor node { id title handle vendor productType createdAt variants(first: 1) { edges { node { price } } } } }
    pageInfo { hasNextPage endCursor }
  }
}";
    const OPERATION_NAME: &'static str = "listProducts";

    fn connection(data: Self::Data) -> Connection<Self::Node> {
        data.products
    }
}

pub struct CustomersQuery;

#[derive(Debug, Deserialize)]
pub struct CustomersData {
    #[serde(default)]
    pub customers: Connection<CustomerNode>,
}

impl ConnectionQuery for CustomersQuery {
    type Filter = NoFilter;
    type Data = CustomersData;
    type Node = CustomerNode;

    const QUERY: &'static str = r"
query listCustomers($first: Int!, $after: String) {
  customers(first: $first, after: $after) {
    edges { cursor node { id email displayName createdAt } }
    pageInfo { hasNextPage endCursor }
  }
}";
    const OPERATION_NAME: &'static str = "listCustomers";

    fn connection(data: Self::Data) -> Connection<Self::Node> {
        data.customers
    }
}

/// Orders sorted by creation time, optionally filtered by a search query.
pub struct OrdersQuery;

#[derive(Debug, Deserialize)]
pub struct OrdersData {
    #[serde(default)]
    pub orders: Connection<OrderNode>,
}

impl ConnectionQuery for OrdersQuery {
    type Filter = OrderFilter;
    type Data = OrdersData;
    type Node = OrderNode;

    const QUERY: &'static str = r"
query listOrders($first: Int!, $after: String, $query: String) {
  orders(first: $first, after: $after, sortKey: CREATED_AT, query: $query) {
    edges { cursor node { id createdAt totalPriceSet { shopMoney { amount } } customer { id displayName email } } }
    pageInfo { hasNextPage endCursor }
  }
}";
    const OPERATION_NAME: &'static str = "listOrders";

    fn connection(data: Self::Data) -> Connection<Self::Node> {
        data.orders
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_variables_flatten_filter() {
        let vars = PageVariables {
            first: 100,
            after: Some("abc".to_string()),
            filter: OrderFilter::created_between("2024-01-01", "2024-01-31"),
        };
        assert_eq!(
            serde_json::to_value(&vars).unwrap(),
            serde_json::json!({
                "first": 100,
                "after": "abc",
                "query": "created_at:>=2024-01-01 created_at:<=2024-01-31"
            })
        );
    }

    #[test]
    fn test_first_page_omits_after() {
        let vars = PageVariables {
            first: 50,
            after: None,
            filter: NoFilter {},
        };
        assert_eq!(
            serde_json::to_value(&vars).unwrap(),
            serde_json::json!({ "first": 50 })
        );
    }

    #[test]
    fn test_operation_names_match_documents() {
        assert!(ProductsQuery::QUERY.contains(ProductsQuery::OPERATION_NAME));
        assert!(CustomersQuery::QUERY.contains(CustomersQuery::OPERATION_NAME));
        assert!(OrdersQuery::QUERY.contains("sortKey: CREATED_AT"));
    }

    #[test]
    fn test_orders_connection_accessor() {
        let data: OrdersData = serde_json::from_value(serde_json::json!({
            "orders": {
                "edges": [{ "cursor": "c1", "node": { "id": "gid://shopify/Order/1", "createdAt": "2024-01-01T00:00:00Z" } }],
                "pageInfo": { "hasNextPage": false, "endCursor": "c1" }
            }
        }))
        .unwrap();
        let conn = OrdersQuery::connection(data);
        assert_eq!(conn.edges.len(), 1);
        assert!(!conn.page_info.has_next_page);
    }
}
