// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `spot-interruption`: one-shot handler for the spot reclamation warning.
//!
//! When the metadata service reports the instance as marked for removal,
//! drain the local workers so their jobs requeue cleanly. Exit 0 on success
//! or when no action was needed, 1 on failure.

use cm_adapters::cloud::imds;
use cm_adapters::{MjsAdapter, SchedulerPort};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let _guard = cm::logging::init("spot-interruption");

    info!("retrieving spot instance interruption status");
    if !imds::spot_instance_marked_for_removal().await {
        info!("no action needed, the instance is not flagged for removal");
        return;
    }

    info!("the instance is flagged for removal, stopping workers");
    let scheduler = MjsAdapter::new();
    if scheduler.stop_workers_locally().await {
        info!("stopped workers successfully");
    } else {
        error!("failed to stop workers");
        std::process::exit(1);
    }
}
