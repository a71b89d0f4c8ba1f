//! Admin dashboard counters and activity feed.

use std::sync::Arc;

use lampstand_core::{Activity, DashboardStats};
use tracing::instrument;

use super::ApiClient;
use super::params::ActivityParams;
use crate::cache::{QueryFamily, QueryKey};
use crate::error::{ApiError, Result};
use crate::gateway::ApiRequest;

impl ApiClient {
    /// Site-wide counters.
    ///
    /// # Errors
    ///
    /// Fails if the request fails.
    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> Result<Arc<DashboardStats>> {
        let key = QueryKey::new(QueryFamily::DashboardStats, &())?;
        let req = ApiRequest::get("/admin/dashboard/stats");
        self.query(key, self.gateway.fetch_data(&req)).await
    }

    /// Most recent activity, newest first.
    ///
    /// # Errors
    ///
    /// Fails if the request fails.
    #[instrument(skip(self))]
    pub async fn recent_activity(&self, params: &ActivityParams) -> Result<Arc<Vec<Activity>>> {
        let key = QueryKey::new(QueryFamily::RecentActivity, params)?;
        let req = ApiRequest::get("/admin/activity").with_query(params)?;
        self.query(key, async {
            Ok::<_, ApiError>(self.gateway.fetch_page::<Activity>(&req).await?.items)
        })
        .await
    }
}
