// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance metadata service (IMDS) probes.

use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const IMDS_URL: &str = "http://169.254.169.254";
const IMDS_TIMEOUT: Duration = Duration::from_secs(5);

/// Identity of the instance this program runs on.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityDocument {
    pub region: String,
    #[serde(rename = "instanceId")]
    pub instance_id: String,
}

/// Fetch the instance identity document, using the IMDSv2 token flow.
pub async fn identity_document() -> Result<IdentityDocument, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(IMDS_TIMEOUT).build()?;
    let token = client
        .put(format!("{IMDS_URL}/latest/api/token"))
        .header("X-aws-ec2-metadata-token-ttl-seconds", "60")
        .send()
        .await?
        .text()
        .await?;
    client
        .get(format!("{IMDS_URL}/latest/dynamic/instance-identity/document"))
        .header("X-aws-ec2-metadata-token", &token)
        .send()
        .await?
        .json()
        .await
}

/// Whether the provider has flagged this spot instance for reclamation.
///
/// The instance-action metadata entry only exists once the instance is
/// marked; an unreachable metadata service reads as "not marked".
pub async fn spot_instance_marked_for_removal() -> bool {
    let client = match reqwest::Client::builder().timeout(IMDS_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            debug!(error = %e, "failed to build the metadata client");
            return false;
        }
    };
    match client
        .head(format!("{IMDS_URL}/latest/meta-data/spot/instance-action"))
        .send()
        .await
    {
        Ok(response) => response.status() == reqwest::StatusCode::OK,
        Err(e) => {
            debug!(error = %e, "spot instance-action probe failed");
            false
        }
    }
}
