//! Revenue and customer metrics over a date window.
//!
//! Orders are fetched for the window and aggregated in memory; nothing is
//! persisted.

use std::collections::{BTreeMap, HashMap};

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use storepulse_core::round_money;
use thiserror::Error;
use tracing::instrument;

use crate::shopify::{AdminShopifyError, OrderFilter, OrderNode, OrdersQuery, Paginator};

/// Orders fetched per metrics request.
pub const METRICS_ORDER_LIMIT: usize = 2000;

/// Length of the top spenders list.
pub const TOP_CUSTOMERS: usize = 5;

/// Default window: the last 30 days, today included.
const DEFAULT_WINDOW_DAYS: u64 = 30;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Invalid metrics window.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("invalid date: {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("start date {start} is after end date {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Parse optional `YYYY-MM-DD` bounds.
    ///
    /// Missing or blank bounds default to `today - 29 days ..= today`.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError`] for malformed dates or `start > end`.
    pub fn parse(
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self, RangeError> {
        let default_start = today
            .checked_sub_days(Days::new(DEFAULT_WINDOW_DAYS - 1))
            .unwrap_or(today);
        let start = parse_bound(start)?.unwrap_or(default_start);
        let end = parse_bound(end)?.unwrap_or(today);
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Orders search filter covering this window.
    #[must_use]
    pub fn order_filter(&self) -> OrderFilter {
        OrderFilter::created_between(&format_date(self.start), &format_date(self.end))
    }
}

fn parse_bound(raw: Option<&str>) -> Result<Option<NaiveDate>, RangeError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Some)
            .map_err(|_| RangeError::InvalidDate(s.to_string())),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub customers: usize,
    pub orders: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
}

/// Orders and revenue for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub date: String,
    pub orders: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopCustomer {
    /// Customer id, or email when the order carried no id.
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeSummary {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub totals: Totals,
    /// Date ascending; days without orders are absent.
    pub series: Vec<SeriesPoint>,
    pub top_customers: Vec<TopCustomer>,
    pub range: RangeSummary,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Aggregate `orders` for `range`.
///
/// Revenue is summed exactly and rounded once; sums saturate rather than
/// overflow. Orders whose customer has neither id nor email count toward
/// orders and revenue but not customers.
#[must_use]
pub fn aggregate(orders: &[OrderNode], range: &DateRange) -> MetricsSummary {
    let mut revenue = Decimal::ZERO;
    let mut by_date: BTreeMap<NaiveDate, (usize, Decimal)> = BTreeMap::new();
    let mut customers: Vec<TopCustomer> = Vec::new();
    let mut customer_index: HashMap<String, usize> = HashMap::new();

    for order in orders {
        let amount = order.amount();
        revenue = revenue.saturating_add(amount);

        let day = by_date
            .entry(order.created_at.date_naive())
            .or_insert((0, Decimal::ZERO));
        day.0 += 1;
        day.1 = day.1.saturating_add(amount);

        let customer = order.customer.as_ref();
        let id = customer.and_then(|c| non_empty(c.id.as_deref()));
        let email = customer.and_then(|c| non_empty(c.email.as_deref()));
        let Some(key) = id.or(email) else {
            continue;
        };

        let index = *customer_index.entry(key.to_string()).or_insert_with(|| {
            let name = customer
                .and_then(|c| non_empty(c.display_name.as_deref()))
                .or(email)
                .unwrap_or("Unknown");
            customers.push(TopCustomer {
                id: key.to_string(),
                name: name.to_string(),
                email: email.unwrap_or_default().to_string(),
                total: Decimal::ZERO,
            });
            customers.len() - 1
        });
        if let Some(entry) = customers.get_mut(index) {
            entry.total = entry.total.saturating_add(amount);
        }
    }

    let totals = Totals {
        customers: customers.len(),
        orders: orders.len(),
        revenue: round_money(revenue),
    };

    let series = by_date
        .into_iter()
        .map(|(date, (orders, revenue))| SeriesPoint {
            date: format_date(date),
            orders,
            revenue,
        })
        .collect();

    // Stable: equal totals keep first-seen order.
    customers.sort_by(|a, b| b.total.cmp(&a.total));
    customers.truncate(TOP_CUSTOMERS);

    MetricsSummary {
        totals,
        series,
        top_customers: customers,
        range: RangeSummary {
            start: format_date(range.start),
            end: format_date(range.end),
        },
    }
}

/// Fetches orders for a window and aggregates them.
#[derive(Clone)]
pub struct MetricsAggregator {
    paginator: Paginator,
}

impl MetricsAggregator {
    #[must_use]
    pub const fn new(paginator: Paginator) -> Self {
        Self { paginator }
    }

    /// Compute metrics over the first [`METRICS_ORDER_LIMIT`] orders of the
    /// window, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if fetching orders fails after retries.
    #[instrument(skip(self), fields(start = %range.start, end = %range.end))]
    pub async fn compute(&self, range: &DateRange) -> Result<MetricsSummary, AdminShopifyError> {
        let orders = self
            .paginator
            .collect_all::<OrdersQuery>(range.order_filter(), METRICS_ORDER_LIMIT)
            .await?;
        tracing::debug!(orders = orders.len(), "Aggregating metrics");
        Ok(aggregate(&orders, range))
    }
}
