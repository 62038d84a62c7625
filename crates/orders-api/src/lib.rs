//! Typed Rust client for the internal order-of-record service.
//!
//! Internal-only API authenticated with a shared secret header. Covers
//! listing a user's orders and fetching one order by id.

mod types;

pub use types::*;

use std::time::Duration;

use uuid::Uuid;

const SECRET_HEADER: &str = "X-Internal-Secret";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("orders api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("orders api {endpoint} returned {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Client for the order-of-record REST API.
#[derive(Clone)]
pub struct OrdersClient {
    base_url: String,
    secret: String,
    http: reqwest::Client,
}

impl OrdersClient {
    pub fn new(
        base_url: impl Into<String>,
        secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.into(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn check(resp: reqwest::Response, endpoint: &'static str) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { endpoint, status, body });
        }
        Ok(resp)
    }

    // ── Orders ───────────────────────────────────────────────────────

    /// One page (1-based) of a user's orders in the given lifecycle status.
    pub async fn list_orders(
        &self,
        user_id: Uuid,
        status: OrderStatus,
        page: u32,
        limit: u32,
    ) -> Result<ListOrdersResponse> {
        let status = match status {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Active => "ACTIVE",
            OrderStatus::Suspended => "SUSPENDED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Expired => "EXPIRED",
            OrderStatus::Unknown => "UNKNOWN",
        };

        let resp = self
            .http
            .get(self.url("/internal/orders"))
            .header(SECRET_HEADER, &self.secret)
            .query(&[
                ("userId", user_id.to_string()),
                ("status", status.to_string()),
                ("page", page.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;

        let list: ListOrdersResponse = Self::check(resp, "list orders").await?.json().await?;
        Ok(list)
    }

    /// Fetch one order. A 404 is `Ok(None)`, not an error.
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderRecord>> {
        let resp = self
            .http
            .get(self.url(&format!("/internal/orders/{order_id}")))
            .header(SECRET_HEADER, &self.secret)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let order: OrderResponse = Self::check(resp, "get order").await?.json().await?;
        Ok(Some(order.data))
    }
}
