use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use orders_api::OrdersClient;
use tracing::{error, warn};
use uuid::Uuid;

use crate::types::{
    ExternalId, LifecycleStatus, LiveStatus, PlanSnapshot, ProvisioningRecord, ProvisioningStatus,
    ResourceRecord,
};
use crate::{OwnershipError, OwnershipResolver, Result, env_required, env_u64};

/// Upper bound on pages fetched for one owner listing.
const MAX_LIST_PAGES: u32 = 50;

/// Order-of-record service reached over its internal REST API.
pub struct HttpOwnershipResolver {
    client: OrdersClient,
    list_limit: u32,
}

impl HttpOwnershipResolver {
    /// Create from env vars:
    ///
    /// - `ORDERS_API_URL` (required)
    /// - `ORDERS_API_SECRET` (required)
    /// - `ORDERS_TIMEOUT_SECS` (default: `5`)
    /// - `LIST_FETCH_LIMIT` (default: `500`, page size for owner listings)
    pub fn from_env() -> Result<Self> {
        let base_url = env_required("ORDERS_API_URL")?;
        let secret = env_required("ORDERS_API_SECRET")?;
        let timeout = Duration::from_secs(env_u64("ORDERS_TIMEOUT_SECS", 5)?);
        let list_limit = u32::try_from(env_u64("LIST_FETCH_LIMIT", 500)?)
            .map_err(|_| crate::Error::InvalidEnv("LIST_FETCH_LIMIT".into()))?;

        Ok(Self::new(OrdersClient::new(base_url, secret, timeout)?, list_limit))
    }

    pub fn new(client: OrdersClient, list_limit: u32) -> Self {
        Self { client, list_limit }
    }

    fn unavailable(
        method: &'static str,
        context: BTreeMap<&'static str, String>,
        err: &orders_api::Error,
    ) -> OwnershipError {
        error!(method, ?context, error = %err, "order service call failed");
        OwnershipError::UpstreamUnavailable { method, context }
    }

    fn record(order: orders_api::OrderRecord) -> ResourceRecord {
        ResourceRecord {
            id: order.id,
            owner_id: order.user_id,
            lifecycle: match order.status {
                orders_api::OrderStatus::Pending => LifecycleStatus::Pending,
                orders_api::OrderStatus::Active => LifecycleStatus::Active,
                orders_api::OrderStatus::Suspended => LifecycleStatus::Suspended,
                orders_api::OrderStatus::Cancelled => LifecycleStatus::Cancelled,
                orders_api::OrderStatus::Expired => LifecycleStatus::Expired,
                orders_api::OrderStatus::Unknown => LifecycleStatus::Unknown,
            },
            provisioning: order.provisioning.map(|p| ProvisioningRecord {
                status: match p.status {
                    orders_api::ProvisioningStatus::Pending => ProvisioningStatus::Pending,
                    orders_api::ProvisioningStatus::InProgress => ProvisioningStatus::InProgress,
                    orders_api::ProvisioningStatus::Completed => ProvisioningStatus::Completed,
                    orders_api::ProvisioningStatus::Failed => ProvisioningStatus::Failed,
                    orders_api::ProvisioningStatus::Unknown => ProvisioningStatus::Unknown,
                },
                external_id: p.external_id.filter(|id| !id.is_empty()).map(ExternalId),
                public_address: p.public_ip,
                private_address: p.private_ip,
                region: p.region,
                last_known_status: p.last_known_status.as_deref().map(LiveStatus::parse),
                completed_at: p.completed_at,
            }),
            plan: order.plan.map(|p| PlanSnapshot {
                name: p.name,
                vcpus: p.cpu,
                memory_mb: p.memory,
                disk_gb: p.disk,
            }),
            image: order.image.map(|i| i.name),
            hostname: order.hostname,
            created_at: order.created_at,
        }
    }
}

#[async_trait]
impl OwnershipResolver for HttpOwnershipResolver {
    async fn list_active_resources(
        &self,
        owner_id: Uuid,
    ) -> std::result::Result<Vec<ResourceRecord>, OwnershipError> {
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let list = self
                .client
                .list_orders(owner_id, orders_api::OrderStatus::Active, page, self.list_limit)
                .await
                .map_err(|e| {
                    Self::unavailable(
                        "list_active_resources",
                        BTreeMap::from([
                            ("owner_id", owner_id.to_string()),
                            ("page", page.to_string()),
                        ]),
                        &e,
                    )
                })?;

            let before = records.len();
            for order in list.data {
                if seen.insert(order.id) {
                    records.push(Self::record(order));
                }
            }

            // Without a reported total the first page is the whole set.
            let Some(total) = list.meta.and_then(|m| m.total) else {
                break;
            };
            if records.len() as u64 >= total {
                break;
            }
            if records.len() == before || page >= MAX_LIST_PAGES {
                warn!(
                    %owner_id,
                    total,
                    fetched = records.len(),
                    pages = page,
                    "order service listed fewer orders than it reported"
                );
                break;
            }
            page += 1;
        }

        Ok(records)
    }

    async fn get_resource(&self, id: Uuid) -> std::result::Result<Option<ResourceRecord>, OwnershipError> {
        let order = self.client.get_order(id).await.map_err(|e| {
            Self::unavailable(
                "get_resource",
                BTreeMap::from([("resource_id", id.to_string())]),
                &e,
            )
        })?;

        Ok(order.map(Self::record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::Json;
    use axum::extract::Query;
    use axum::routing::get;
    use serde_json::json;

    fn order(value: serde_json::Value) -> orders_api::OrderRecord {
        serde_json::from_value(value).unwrap()
    }

    fn active_order(id: Uuid, user: Uuid) -> serde_json::Value {
        json!({
            "id": id,
            "userId": user,
            "status": "ACTIVE",
            "provisioning": { "status": "COMPLETED", "externalId": "1" },
            "createdAt": "2026-01-01T00:00:00Z"
        })
    }

    async fn serve(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Serves `pages(page)` for every list request and records requested pages.
    async fn list_server(
        pages: impl Fn(u32) -> serde_json::Value + Clone + Send + Sync + 'static,
    ) -> (HttpOwnershipResolver, Arc<Mutex<Vec<u32>>>) {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let log = requested.clone();
        let router = axum::Router::new().route(
            "/internal/orders",
            get(move |Query(q): Query<HashMap<String, String>>| {
                let log = log.clone();
                let pages = pages.clone();
                async move {
                    let page: u32 = q["page"].parse().unwrap();
                    log.lock().unwrap().push(page);
                    Json(pages(page))
                }
            }),
        );
        let base = serve(router).await;
        let client = OrdersClient::new(base, "s", Duration::from_secs(2)).unwrap();
        (HttpOwnershipResolver::new(client, 2), requested)
    }

    #[tokio::test]
    async fn listing_follows_pages_up_to_the_reported_total() {
        let user = Uuid::new_v4();
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let served = ids.clone();
        let (resolver, requested) = list_server(move |page| {
            let data: Vec<_> = match page {
                1 => served[..2].iter().map(|id| active_order(*id, user)).collect(),
                2 => served[2..].iter().map(|id| active_order(*id, user)).collect(),
                _ => Vec::new(),
            };
            json!({ "data": data, "meta": { "total": 3, "limit": 2 } })
        })
        .await;

        let records = resolver.list_active_resources(user).await.unwrap();
        let got: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        assert_eq!(got, ids);
        assert_eq!(*requested.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn listing_stops_when_pages_repeat_below_the_reported_total() {
        let user = Uuid::new_v4();
        let ids = [Uuid::new_v4(), Uuid::new_v4()];
        // Ignores `page` and always answers with the same two orders.
        let (resolver, requested) = list_server(move |_| {
            json!({
                "data": [active_order(ids[0], user), active_order(ids[1], user)],
                "meta": { "total": 5 }
            })
        })
        .await;

        let records = resolver.list_active_resources(user).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(*requested.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn listing_without_meta_is_a_single_page() {
        let user = Uuid::new_v4();
        let (resolver, requested) = list_server(move |_| {
            json!({ "data": [active_order(Uuid::new_v4(), user), active_order(Uuid::new_v4(), user)] })
        })
        .await;

        assert_eq!(resolver.list_active_resources(user).await.unwrap().len(), 2);
        assert_eq!(*requested.lock().unwrap(), vec![1]);
    }

    #[test]
    fn record_maps_provisioning_and_plan() {
        let id = Uuid::new_v4();
        let user = Uuid::new_v4();
        let rec = HttpOwnershipResolver::record(order(json!({
            "id": id,
            "userId": user,
            "status": "ACTIVE",
            "provisioning": {
                "status": "COMPLETED",
                "externalId": "12345678",
                "publicIp": "203.0.113.7",
                "region": "nyc3",
                "lastKnownStatus": "off"
            },
            "plan": { "name": "Basic", "cpu": 1, "memory": 1024, "disk": 25 },
            "image": { "name": "Ubuntu 24.04" },
            "createdAt": "2026-01-01T00:00:00Z"
        })));

        assert_eq!(rec.id, id);
        assert_eq!(rec.owner_id, user);
        assert_eq!(rec.lifecycle, LifecycleStatus::Active);
        let p = rec.provisioning.as_ref().unwrap();
        assert_eq!(p.last_known_status, Some(LiveStatus::Off));
        assert_eq!(p.public_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(rec.plan.as_ref().unwrap().disk_gb, 25);
        assert_eq!(rec.actionable_external_id(), Some(&ExternalId("12345678".into())));
    }

    #[test]
    fn blank_external_id_is_treated_as_absent() {
        let rec = HttpOwnershipResolver::record(order(json!({
            "id": Uuid::new_v4(),
            "userId": Uuid::new_v4(),
            "status": "ACTIVE",
            "provisioning": { "status": "COMPLETED", "externalId": "" },
            "createdAt": "2026-01-01T00:00:00Z"
        })));
        assert!(rec.actionable_external_id().is_none());
    }

    #[tokio::test]
    async fn unreachable_service_is_upstream_unavailable_with_context() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = OrdersClient::new(format!("http://{addr}"), "s", Duration::from_secs(2)).unwrap();
        let resolver = HttpOwnershipResolver::new(client, 10);
        let id = Uuid::new_v4();

        let err = resolver.get_resource(id).await.unwrap_err();
        let OwnershipError::UpstreamUnavailable { method, context } = err;
        assert_eq!(method, "get_resource");
        assert_eq!(context.get("resource_id"), Some(&id.to_string()));
    }
}
