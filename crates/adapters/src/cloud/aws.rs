// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Amazon adapter: EC2 Auto Scaling group + head-node tags.
//!
//! The adapter is wired up from the head node itself: the instance identity
//! comes from IMDS, the Auto Scaling group name from the CloudFormation
//! stack outputs, and the workers-per-node figure from the stack parameters
//! (resolving `auto` through the instance type's default core count).

use super::{imds, CloudPort, HostSet};
use async_trait::async_trait;
use aws_sdk_autoscaling::types::{LifecycleState, Tag as AsgTag};
use aws_sdk_ec2::types::{InstanceStateName, InstanceType, Tag as Ec2Tag};
use chrono::Utc;
use cm_core::consts::{
    CLUSTER_TERMINATION_TAG, GRACE_PERIOD_MINUTES, IDLE_TIMEOUT_DEFAULT_MINUTES,
    IDLE_TIMEOUT_TAG, MW_STATE_TAG, PROTECTION_BATCH_LIMIT,
};
use cm_core::{CloudCapacity, MwState, TerminationPolicy};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Errors while wiring up the AWS adapter
#[derive(Debug, Error)]
pub enum CloudSetupError {
    #[error("instance metadata request failed: {0}")]
    Imds(#[from] reqwest::Error),
    #[error("cloud API call failed: {0}")]
    Api(String),
    #[error("{resource} is missing {field}")]
    Missing {
        resource: &'static str,
        field: String,
    },
}

impl CloudSetupError {
    fn missing(resource: &'static str, field: impl Into<String>) -> Self {
        CloudSetupError::Missing {
            resource,
            field: field.into(),
        }
    }
}

/// Cloud port backed by an EC2 Auto Scaling group.
#[derive(Clone)]
pub struct AwsCloudAdapter {
    asg: aws_sdk_autoscaling::Client,
    ec2: aws_sdk_ec2::Client,
    asg_name: String,
    headnode_id: String,
    workers_per_node: u32,
}

impl AwsCloudAdapter {
    /// Discover the scaling group from the head node's stack and build the
    /// adapter.
    pub async fn connect() -> Result<Self, CloudSetupError> {
        let identity = imds::identity_document().await?;
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(identity.region.clone()))
            .load()
            .await;
        let asg = aws_sdk_autoscaling::Client::new(&config);
        let ec2 = aws_sdk_ec2::Client::new(&config);
        let cfn = aws_sdk_cloudformation::Client::new(&config);

        let stack_name = headnode_tag(&ec2, &identity.instance_id, "aws:cloudformation:stack-name")
            .await
            .map_err(CloudSetupError::Api)?
            .ok_or_else(|| CloudSetupError::missing("head node", "the stack-name tag"))?;

        let stacks = cfn
            .describe_stacks()
            .stack_name(&stack_name)
            .send()
            .await
            .map_err(|e| CloudSetupError::Api(e.to_string()))?;
        let stack = stacks
            .stacks()
            .first()
            .ok_or_else(|| CloudSetupError::missing("CloudFormation", stack_name.clone()))?;

        let asg_name = stack
            .outputs()
            .iter()
            .find(|o| o.output_key() == Some("ASGName"))
            .and_then(|o| o.output_value())
            .ok_or_else(|| CloudSetupError::missing("stack outputs", "ASGName"))?
            .to_string();

        let parameter = |key: &str| {
            stack
                .parameters()
                .iter()
                .find(|p| p.parameter_key() == Some(key))
                .and_then(|p| p.parameter_value())
                .map(str::to_string)
        };
        let workers_per_node = resolve_workers_per_node(
            &ec2,
            parameter("NumWorkersPerNode")
                .ok_or_else(|| CloudSetupError::missing("stack parameters", "NumWorkersPerNode"))?,
            parameter("WorkerInstanceType"),
        )
        .await?;

        Ok(Self {
            asg,
            ec2,
            asg_name,
            headnode_id: identity.instance_id,
            workers_per_node,
        })
    }

    /// Current scaling group description, or `None` on an API failure.
    async fn asg_description(&self) -> Option<aws_sdk_autoscaling::types::AutoScalingGroup> {
        match self
            .asg
            .describe_auto_scaling_groups()
            .auto_scaling_group_names(&self.asg_name)
            .send()
            .await
        {
            Ok(output) => {
                let group = output.auto_scaling_groups().first().cloned();
                if group.is_none() {
                    error!(group = %self.asg_name, "scaling group not found");
                }
                group
            }
            Err(e) => {
                error!(error = %e, "failed to describe the scaling group");
                None
            }
        }
    }

    /// Map private DNS names to instance ids for every non-terminated
    /// instance in the group.
    async fn host_to_id(&self) -> HashMap<String, String> {
        let Some(group) = self.asg_description().await else {
            return HashMap::new();
        };
        let ids: Vec<String> = group
            .instances()
            .iter()
            .filter_map(|i| i.instance_id().map(str::to_string))
            .collect();
        if ids.is_empty() {
            return HashMap::new();
        }
        match self.ec2.describe_instances().set_instance_ids(Some(ids)).send().await {
            Ok(output) => output
                .reservations()
                .iter()
                .flat_map(|r| r.instances())
                .filter(|i| {
                    i.state().and_then(|s| s.name()) != Some(&InstanceStateName::Terminated)
                })
                .filter_map(|i| {
                    Some((i.private_dns_name()?.to_string(), i.instance_id()?.to_string()))
                })
                .collect(),
            Err(e) => {
                error!(error = %e, "failed to describe the group's instances");
                HashMap::new()
            }
        }
    }

    /// Read one tag off the head node.
    async fn headnode_tag(&self, key: &str) -> Option<String> {
        match headnode_tag(&self.ec2, &self.headnode_id, key).await {
            Ok(value) => value,
            Err(e) => {
                error!(error = %e, tag = key, "failed to read a head-node tag");
                None
            }
        }
    }

    /// Write one tag on the head node.
    async fn write_headnode_tag(&self, key: &str, value: &str) -> bool {
        let tag = Ec2Tag::builder().key(key).value(value).build();
        match self
            .ec2
            .create_tags()
            .resources(&self.headnode_id)
            .tags(tag)
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                error!(error = %e, tag = key, "failed to write a head-node tag");
                false
            }
        }
    }

    /// Put the idle-timeout tag back to its default.
    async fn reset_idle_timeout(&self) {
        debug!(
            tag = IDLE_TIMEOUT_TAG,
            default = IDLE_TIMEOUT_DEFAULT_MINUTES,
            "resetting the idle-timeout tag to its default"
        );
        let tag = AsgTag::builder()
            .resource_id(&self.asg_name)
            .resource_type("auto-scaling-group")
            .key(IDLE_TIMEOUT_TAG)
            .value(IDLE_TIMEOUT_DEFAULT_MINUTES.to_string())
            .propagate_at_launch(false)
            .build();
        match tag {
            Ok(tag) => {
                if let Err(e) = self.asg.create_or_update_tags().tags(tag).send().await {
                    warn!(error = %e, "failed to reset the idle-timeout tag");
                }
            }
            Err(e) => warn!(error = %e, "failed to build the idle-timeout tag"),
        }
    }
}

#[async_trait]
impl CloudPort for AwsCloudAdapter {
    async fn cloud_capacity(&self) -> Option<CloudCapacity> {
        let group = self.asg_description().await?;
        let current_nodes = group
            .instances()
            .iter()
            .filter(|i| {
                i.health_status() == Some("Healthy")
                    && matches!(
                        i.lifecycle_state(),
                        Some(LifecycleState::Pending | LifecycleState::InService)
                    )
            })
            .count() as u32;
        Some(CloudCapacity {
            desired_nodes: group.desired_capacity().unwrap_or(0).max(0) as u32,
            minimum_nodes: group.min_size().unwrap_or(0).max(0) as u32,
            maximum_nodes: group.max_size().unwrap_or(0).max(0) as u32,
            current_nodes,
            workers_per_node: self.workers_per_node,
        })
    }

    async fn idle_timeout_seconds(&self) -> u64 {
        if let Some(group) = self.asg_description().await {
            let raw = group
                .tags()
                .iter()
                .find(|t| t.key() == Some(IDLE_TIMEOUT_TAG))
                .and_then(|t| t.value());
            match raw {
                Some(minutes) => match minutes.parse::<f64>() {
                    Ok(m) if m >= 0.0 => return (m * 60.0) as u64,
                    Ok(_) => debug!(value = minutes, "idle-timeout tag is negative"),
                    Err(_) => debug!(value = minutes, "idle-timeout tag is not a number"),
                },
                None => debug!(tag = IDLE_TIMEOUT_TAG, "idle-timeout tag was not found"),
            }
            self.reset_idle_timeout().await;
        }
        IDLE_TIMEOUT_DEFAULT_MINUTES * 60
    }

    async fn worker_nodes(&self) -> Option<HostSet> {
        let group = self.asg_description().await?;
        let ids: Vec<String> = group
            .instances()
            .iter()
            .filter(|i| {
                matches!(i.lifecycle_state(), Some(LifecycleState::InService))
                    && i.health_status() == Some("Healthy")
                    && i.protected_from_scale_in() == Some(true)
            })
            .filter_map(|i| i.instance_id().map(str::to_string))
            .collect();
        if ids.is_empty() {
            return Some(HostSet::new());
        }

        let output = match self.ec2.describe_instances().set_instance_ids(Some(ids)).send().await {
            Ok(output) => output,
            Err(e) => {
                error!(error = %e, "failed to describe the group's instances");
                return None;
            }
        };
        // A node younger than the grace period may simply not have
        // registered with the scheduler yet; leave it out.
        let now = Utc::now().timestamp();
        let grace = (GRACE_PERIOD_MINUTES * 60) as i64;
        let hosts = output
            .reservations()
            .iter()
            .flat_map(|r| r.instances())
            .filter(|i| {
                i.launch_time()
                    .map(|t| now - t.secs() > grace)
                    .unwrap_or(false)
            })
            .filter_map(|i| i.private_dns_name().map(str::to_string))
            .collect();
        Some(hosts)
    }

    async fn set_cloud_capacity(&self, desired_nodes: u32) -> bool {
        match self
            .asg
            .set_desired_capacity()
            .auto_scaling_group_name(&self.asg_name)
            .desired_capacity(desired_nodes as i32)
            .honor_cooldown(false)
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                error!(error = %e, "failed to set the desired capacity of the cluster");
                false
            }
        }
    }

    async fn set_min_nodes(&self, nodes: u32) -> bool {
        match self
            .asg
            .update_auto_scaling_group()
            .auto_scaling_group_name(&self.asg_name)
            .min_size(nodes as i32)
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                error!(error = %e, "failed to update the minimum capacity of the cluster");
                false
            }
        }
    }

    async fn set_nodes_unhealthy(&self, hosts: &HostSet) -> bool {
        let host_to_id = self.host_to_id().await;
        let mut status = true;
        for host in hosts {
            let Some(id) = host_to_id.get(host) else {
                error!(%host, "unknown hostname");
                status = false;
                continue;
            };
            if let Err(e) = self
                .asg
                .set_instance_health()
                .instance_id(id)
                .health_status("Unhealthy")
                .send()
                .await
            {
                error!(error = %e, %host, "failed to set instance health");
                status = false;
            }
        }
        status
    }

    async fn set_nodes_protection(&self, hosts: &HostSet, protect: bool) -> HostSet {
        let host_to_id = self.host_to_id().await;
        let id_to_host: HashMap<&String, &String> =
            host_to_id.iter().map(|(h, i)| (i, h)).collect();
        let ids: Vec<String> = hosts.iter().filter_map(|h| host_to_id.get(h).cloned()).collect();

        let mut updated = HostSet::new();
        for chunk in ids.chunks(PROTECTION_BATCH_LIMIT) {
            match self
                .asg
                .set_instance_protection()
                .auto_scaling_group_name(&self.asg_name)
                .set_instance_ids(Some(chunk.to_vec()))
                .protected_from_scale_in(protect)
                .send()
                .await
            {
                Ok(_) => updated.extend(
                    chunk
                        .iter()
                        .filter_map(|id| id_to_host.get(id).map(|h| (*h).clone())),
                ),
                Err(e) => error!(error = %e, "failed to set instance protection"),
            }
        }
        updated
    }

    async fn termination_policy(&self) -> Option<TerminationPolicy> {
        let raw = self.headnode_tag(CLUSTER_TERMINATION_TAG).await?;
        let policy = TerminationPolicy::parse(&raw);
        if policy.is_none() {
            debug!(value = %raw, "invalid termination policy on the head node");
        }
        policy
    }

    async fn set_termination_policy(&self, policy: &TerminationPolicy) -> bool {
        self.write_headnode_tag(CLUSTER_TERMINATION_TAG, &policy.as_tag_value())
            .await
    }

    async fn set_mw_state(&self, state: MwState) -> bool {
        self.write_headnode_tag(MW_STATE_TAG, state.as_str()).await
    }

    async fn unprotect_all_nodes(&self) -> bool {
        let hosts: HostSet = self.host_to_id().await.into_keys().collect();
        if hosts.is_empty() {
            return true;
        }
        for host in &hosts {
            debug!(%host, "detected host to unprotect");
        }
        let unprotected = self.set_nodes_protection(&hosts, false).await;
        unprotected == hosts
    }
}

/// Read one tag from an instance, as `Ok(None)` when the tag is absent.
async fn headnode_tag(
    ec2: &aws_sdk_ec2::Client,
    instance_id: &str,
    key: &str,
) -> Result<Option<String>, String> {
    let output = ec2
        .describe_instances()
        .instance_ids(instance_id)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    Ok(output
        .reservations()
        .iter()
        .flat_map(|r| r.instances())
        .flat_map(|i| i.tags())
        .find(|t| t.key() == Some(key))
        .and_then(|t| t.value())
        .map(str::to_string))
}

/// Resolve the `NumWorkersPerNode` stack parameter; `auto` means one worker
/// per default core of the worker instance type.
async fn resolve_workers_per_node(
    ec2: &aws_sdk_ec2::Client,
    parameter: String,
    instance_type: Option<String>,
) -> Result<u32, CloudSetupError> {
    if parameter != "auto" {
        return parameter
            .parse()
            .map_err(|_| CloudSetupError::missing("stack parameters", "a numeric NumWorkersPerNode"));
    }
    let instance_type = instance_type
        .ok_or_else(|| CloudSetupError::missing("stack parameters", "WorkerInstanceType"))?;
    let output = ec2
        .describe_instance_types()
        .instance_types(InstanceType::from(instance_type.as_str()))
        .send()
        .await
        .map_err(|e| CloudSetupError::Api(e.to_string()))?;
    output
        .instance_types()
        .first()
        .and_then(|info| info.v_cpu_info())
        .and_then(|cpu| cpu.default_cores())
        .map(|cores| cores.max(1) as u32)
        .ok_or_else(|| CloudSetupError::missing("instance type", instance_type))
}
