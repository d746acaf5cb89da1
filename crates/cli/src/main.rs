// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cluster-management`: one reconciliation pass, run by the system
//! scheduler roughly every 60 seconds.
//!
//! Exit codes: 0 success, 1 cloud issue, 2 cluster issue, 3 both,
//! 4 state-file read/write issue.

use cm_adapters::{AwsCloudAdapter, MjsAdapter};
use cm_core::{Status, SystemClock};
use cm_engine::orchestrator;
use cm_storage::{StateStore, SystemBootTime};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let _guard = cm::logging::init("cluster-management");
    info!("starting cluster management program");
    let status = run().await;
    info!(status, "finished cluster management program");
    std::process::exit(status);
}

async fn run() -> i32 {
    info!("reading the cluster management program data file");
    let data_path = cm::paths::state_document_path();
    let mut store = match StateStore::load(data_path, &SystemBootTime) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "failed to load the cluster management data file, exiting");
            return Status::InternalIo.code();
        }
    };

    info!("connecting to the cloud computing platform");
    let cloud = match AwsCloudAdapter::connect().await {
        Ok(cloud) => cloud,
        Err(e) => {
            error!(error = %e, "failed to connect to the cloud computing platform, exiting");
            return Status::Cloud.code();
        }
    };

    info!("connecting to the cluster");
    let scheduler = MjsAdapter::new();

    orchestrator::run_invocation(&cloud, &scheduler, &mut store, &SystemClock).await
}
