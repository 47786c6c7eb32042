//! Relay-style connection shape shared by every paged query.

use serde::{Deserialize, Serialize};

/// Pagination information for a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Whether another page follows this one.
    #[serde(default)]
    pub has_next_page: bool,
    /// Cursor of the last edge, passed as `after` for the next page.
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// One edge of a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge<N> {
    /// The record itself.
    pub node: N,
    /// Cursor locating this edge.
    #[serde(default)]
    pub cursor: Option<String>,
}

/// `{ edges: [{ node, cursor }], pageInfo: { hasNextPage, endCursor } }`.
///
/// Missing `edges` reads as an empty page and missing `pageInfo` as the last page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<N> {
    /// Edges on this page.
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<N>>,
    /// Pagination information.
    #[serde(default)]
    pub page_info: PageInfo,
}

impl<N> Connection<N> {
    /// Consume the connection, returning the nodes in edge order.
    #[must_use]
    pub fn into_nodes(self) -> Vec<N> {
        self.edges.into_iter().map(|e| e.node).collect()
    }

    /// Borrow the first node, if any.
    #[must_use]
    pub fn first_node(&self) -> Option<&N> {
        self.edges.first().map(|e| &e.node)
    }
}

impl<N> Default for Connection<N> {
    fn default() -> Self {
        Self {
            edges: Vec::new(),
            page_info: PageInfo::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_read_as_last_empty_page() {
        let conn: Connection<serde_json::Value> = serde_json::from_str("{}").unwrap();
        assert!(conn.edges.is_empty());
        assert!(!conn.page_info.has_next_page);
        assert!(conn.page_info.end_cursor.is_none());
    }

    #[test]
    fn test_into_nodes_keeps_order() {
        let conn: Connection<i32> = serde_json::from_str(
            r#"{"edges":[{"node":1,"cursor":"a"},{"node":2,"cursor":"b"}],
                "pageInfo":{"hasNextPage":true,"endCursor":"b"}}"#,
        )
        .unwrap();
        assert_eq!(conn.page_info.end_cursor.as_deref(), Some("b"));
        assert_eq!(conn.into_nodes(), vec![1, 2]);
    }
}
