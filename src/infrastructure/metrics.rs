// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

pub const QUEUE_ENQUEUED: &str = "harvest_queue_enqueued_total";
pub const QUEUE_DUPLICATES: &str = "harvest_queue_duplicates_total";
pub const QUEUE_CLAIMED: &str = "harvest_queue_claimed_total";
pub const QUEUE_COMPLETED: &str = "harvest_queue_completed_total";
pub const QUEUE_FAILED: &str = "harvest_queue_failed_total";
pub const QUEUE_REQUEUED: &str = "harvest_queue_requeued_total";
pub const HARVESTER_PAGES: &str = "harvester_pages_total";
pub const HARVESTER_SESSION_RESETS: &str = "harvester_session_resets_total";
pub const SCHEDULER_STARTS: &str = "scheduler_bot_starts_total";
pub const SCHEDULER_STOPS: &str = "scheduler_bot_stops_total";
pub const SCHEDULER_RUNNING: &str = "scheduler_bots_running";

/// 初始化指标系统
///
/// 未启用时只注册描述信息，计数仍然写入默认的空记录器
pub fn init_metrics(settings: &MetricsSettings) {
    if settings.enabled {
        match settings.listen_addr.parse::<SocketAddr>() {
            Ok(addr) => {
                // Ignore error if address is already in use (for development/testing)
                if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
                    warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
                } else {
                    info!("Metrics exporter listening on {}", addr);
                }
            }
            Err(e) => warn!("Invalid metrics address {}: {}", settings.listen_addr, e),
        }
    }

    describe_counter!(QUEUE_ENQUEUED, "URLs added to the harvest queue");
    describe_counter!(QUEUE_DUPLICATES, "URLs skipped because an open row already existed");
    describe_counter!(QUEUE_CLAIMED, "Queue items claimed by detail workers");
    describe_counter!(QUEUE_COMPLETED, "Queue items completed");
    describe_counter!(QUEUE_FAILED, "Queue items failed");
    describe_counter!(QUEUE_REQUEUED, "Stale processing items put back to pending");
    describe_counter!(HARVESTER_PAGES, "Listing pages harvested");
    describe_counter!(HARVESTER_SESSION_RESETS, "Fetch session resets performed by the harvester");
    describe_counter!(SCHEDULER_STARTS, "Bot processes started by the scheduler");
    describe_counter!(SCHEDULER_STOPS, "Bot processes stopped by the scheduler");
    describe_gauge!(SCHEDULER_RUNNING, "Bot processes observed running on the last tick");
}
