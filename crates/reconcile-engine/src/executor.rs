//! Per-node reconciliation steps

use crate::evaluator::expected_state;
use crate::model::{AppliedState, Node, Parameter, Schedule, SwitchState};
use crate::scheduler::{pause, Pacing};
use chrono::NaiveTime;
use std::collections::BTreeMap;
use zwave_core::{Actuator, DeviceControl};

/// What a successful transition changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Configuration parameter rewritten
    Parameter { parameter: u32, from: u32, to: u32 },
    /// Scheduled node switched
    Switch { from: AppliedState, to: SwitchState },
}

/// A confirmed change applied to a node during a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub node_id: u32,
    pub description: String,
    pub change: Change,
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.change {
            Change::Parameter {
                parameter,
                from,
                to,
            } => write!(
                f,
                "node {} ({}) parameter {}: {} -> {}",
                self.node_id, self.description, parameter, from, to
            ),
            Change::Switch { from, to } => write!(
                f,
                "node {} ({}): {} -> {}",
                self.node_id, self.description, from, to
            ),
        }
    }
}

/// Outcome of one pass over all nodes
#[derive(Debug, Default, Clone)]
pub struct TickReport {
    /// Operations that failed during the pass
    pub failures: usize,
    /// Changes confirmed during the pass, in processing order
    pub transitions: Vec<Transition>,
}

impl TickReport {
    #[must_use]
    pub fn had_failures(&self) -> bool {
        self.failures > 0
    }

    fn record(&mut self, transition: Transition) {
        tracing::info!("Transitioned {}", transition);
        self.transitions.push(transition);
    }
}

/// Bring every configuration parameter of a node to its desired value
pub async fn reconcile_parameters<D>(
    control: &D,
    node: &Node,
    params: &BTreeMap<u32, Parameter>,
    pacing: &Pacing,
    report: &mut TickReport,
) where
    D: DeviceControl + ?Sized,
{
    for param in params.values() {
        reconcile_parameter(control, node, param, report).await;
        pause(pacing.parameter_delay).await;
    }
}

async fn reconcile_parameter<D>(
    control: &D,
    node: &Node,
    param: &Parameter,
    report: &mut TickReport,
) where
    D: DeviceControl + ?Sized,
{
    let current = match control.read_parameter(node.id, param.id).await {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(
                "Failed to obtain current value of parameter {} ({}) for node {} ({}): {}",
                param.id,
                param.label(),
                node.id,
                node.description,
                e
            );
            report.failures += 1;
            return;
        }
    };

    if current == param.value {
        tracing::debug!(
            "Node {} parameter {} already at {}",
            node.id,
            param.id,
            current
        );
        return;
    }

    tracing::debug!(
        "Set value of parameter {} ({}) for node {} ({}) to {}",
        param.id,
        param.label(),
        node.id,
        node.description,
        param.value
    );
    if let Err(e) = control.write_parameter(node.id, param.id, param.value).await {
        tracing::error!(
            "Failed to set value of parameter {} ({}) for node {} ({}): {}",
            param.id,
            param.label(),
            node.id,
            node.description,
            e
        );
        report.failures += 1;
        return;
    }

    report.record(Transition {
        node_id: node.id,
        description: node.description.clone(),
        change: Change::Parameter {
            parameter: param.id,
            from: current,
            to: param.value,
        },
    });
}

/// Drive a scheduled node toward the state its schedule prescribes at `now`.
///
/// `applied` is only updated once the node confirmed the switch, so a failed
/// attempt is retried on the next tick.
pub async fn reconcile_schedule<D>(
    control: &D,
    node: &Node,
    schedule: &Schedule,
    actuator: &Actuator,
    applied: &mut AppliedState,
    now: NaiveTime,
    report: &mut TickReport,
) where
    D: DeviceControl + ?Sized,
{
    let desired = expected_state(schedule, now);
    if *applied == desired {
        return;
    }

    match control.switch(node.id, actuator, desired.is_on()).await {
        Ok(()) => {
            let from = *applied;
            *applied = desired.into();
            report.record(Transition {
                node_id: node.id,
                description: node.description.clone(),
                change: Change::Switch { from, to: desired },
            });
        }
        Err(e) => {
            tracing::error!(
                "Failed to switch node {} ({}) {}: {}",
                node.id,
                node.description,
                desired,
                e
            );
            report.failures += 1;
        }
    }
}
