//! Admin dashboard.

use lampstand_client::{ActivityParams, ApiClient};
use lampstand_core::{Activity, DashboardStats};
use serde::Serialize;

use super::{CliError, print_json};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Dashboard<'a> {
    stats: &'a DashboardStats,
    recent_activity: &'a [Activity],
}

pub async fn show(client: &ApiClient, limit: u32) -> Result<(), CliError> {
    let params = ActivityParams { limit: Some(limit) };
    let (stats, activity) =
        tokio::try_join!(client.dashboard_stats(), client.recent_activity(&params))?;

    print_json(&Dashboard {
        stats: &stats,
        recent_activity: &activity,
    })
}
