//! Read endpoints for the dashboard's business data.
//!
//! Response shapes belong to the backend's analytics services, so these
//! return raw JSON. All of them go through the same gateway stages as the
//! auth calls; a 401 here ends the session like anywhere else.

use serde_json::Value;

use super::{ApiClient, ApiError};

/// Days of history the dashboard uses when the caller has no preference.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Bucket size for sales trends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        }
    }
}

/// Ranking measure for top products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankBy {
    #[default]
    Quantity,
    Revenue,
}

impl RankBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankBy::Quantity => "quantity",
            RankBy::Revenue => "revenue",
        }
    }
}

/// Reorder-point parameters for replenishment recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderPolicy {
    pub lead_time_days: u32,
    pub safety_stock_days: u32,
}

impl Default for ReorderPolicy {
    fn default() -> Self {
        Self {
            lead_time_days: 7,
            safety_stock_days: 3,
        }
    }
}

impl ApiClient {
    // ========================================================================
    // Dashboard
    // ========================================================================

    pub async fn dashboard_overview(&self) -> Result<Value, ApiError> {
        self.get("/dashboard/overview", &[]).await
    }

    pub async fn sales_trends(&self, period: Period, days: u32) -> Result<Value, ApiError> {
        self.get(
            "/dashboard/sales_trends",
            &[("period", period.as_str().to_string()), ("days", days.to_string())],
        )
        .await
    }

    pub async fn top_products(&self, rank_by: RankBy, days: u32, limit: u32) -> Result<Value, ApiError> {
        self.get(
            "/dashboard/top_products",
            &[
                ("metric", rank_by.as_str().to_string()),
                ("days", days.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    pub async fn stock_status(&self) -> Result<Value, ApiError> {
        self.get("/dashboard/stock_status", &[]).await
    }

    pub async fn abcxyz_summary(&self, days: u32) -> Result<Value, ApiError> {
        self.get("/dashboard/abcxyz_summary", &[("days", days.to_string())])
            .await
    }

    // ========================================================================
    // Inventory
    // ========================================================================

    /// List products. A `limit` of 0 asks for all of them.
    pub async fn products(&self, limit: u32) -> Result<Value, ApiError> {
        self.get("/products", &[("limit", limit.to_string())]).await
    }

    pub async fn product(&self, id: &str) -> Result<Value, ApiError> {
        self.get_item("/products", id, &[]).await
    }

    pub async fn stock_moves(&self, limit: u32) -> Result<Value, ApiError> {
        self.get("/inventory/moves", &[("limit", limit.to_string())])
            .await
    }

    // ========================================================================
    // AI
    // ========================================================================

    pub async fn forecast(&self, product_id: &str, horizon_days: u32, lookback_days: u32) -> Result<Value, ApiError> {
        self.get_item(
            "/ai/forecast",
            product_id,
            &[
                ("horizon_days", horizon_days.to_string()),
                ("lookback_days", lookback_days.to_string()),
            ],
        )
        .await
    }

    /// Replenishment recommendations, with reorder points when a policy is given.
    pub async fn replenishment(&self, policy: Option<ReorderPolicy>) -> Result<Value, ApiError> {
        match policy {
            Some(policy) => {
                self.get(
                    "/ai/replenishment/with_rop",
                    &[
                        ("default_lead_time_days", policy.lead_time_days.to_string()),
                        ("safety_stock_days", policy.safety_stock_days.to_string()),
                    ],
                )
                .await
            }
            None => self.get("/ai/replenishment/recommendations", &[]).await,
        }
    }

    pub async fn demand(&self, lookback_days: u32, limit: u32) -> Result<Value, ApiError> {
        self.get(
            "/ai/demand",
            &[("lookback_days", lookback_days.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    pub async fn segmentation(&self, days: u32) -> Result<Value, ApiError> {
        self.get("/ai/segmentation", &[("days", days.to_string())]).await
    }

    /// Demand anomalies whose z-score exceeds `z`.
    pub async fn anomalies(&self, days: u32, z: f64) -> Result<Value, ApiError> {
        self.get("/ai/anomalies", &[("days", days.to_string()), ("z", z.to_string())])
            .await
    }

    /// Stock and demand alerts, also shown as notifications.
    pub async fn alerts(&self) -> Result<Value, ApiError> {
        self.get("/ai/alerts", &[]).await
    }

    // ========================================================================
    // KPI
    // ========================================================================

    pub async fn kpi_metrics(&self, days: u32) -> Result<Value, ApiError> {
        self.get("/kpi/metrics", &[("days", days.to_string())]).await
    }

    pub async fn kpi_metric(&self, name: &str, days: u32) -> Result<Value, ApiError> {
        self.get_item("/kpi/metric", name, &[("days", days.to_string())])
            .await
    }

    pub async fn compare_products(&self, product_ids: &[u64], metrics: &[&str], days: u32) -> Result<Value, ApiError> {
        let ids: Vec<String> = product_ids.iter().map(|id| id.to_string()).collect();
        self.get(
            "/kpi/comparison",
            &[
                ("product_ids", ids.join(",")),
                ("metrics", metrics.join(",")),
                ("days", days.to_string()),
            ],
        )
        .await
    }

    pub async fn kpi_catalog(&self) -> Result<Value, ApiError> {
        self.get("/kpi/catalog", &[]).await
    }

    // ========================================================================
    // Health
    // ========================================================================

    pub async fn health_app(&self) -> Result<Value, ApiError> {
        self.get("/health/app", &[]).await
    }

    /// Reachability of the ERP the backend syncs from.
    pub async fn health_odoo(&self) -> Result<Value, ApiError> {
        self.get("/health/odoo", &[]).await
    }
}
