//! Reconciliation loop

use crate::executor::{reconcile_parameters, reconcile_schedule, TickReport};
use crate::model::{AppliedState, NodeMode, Roster};
use crate::scheduler::{pause, Pacing};
use chrono::{Local, NaiveTime};
use std::collections::HashMap;
use zwave_core::DeviceControl;

/// Converges every managed node toward its desired state
pub struct ReconcileEngine<D> {
    /// Device network used for reads and writes
    control: D,
    /// Managed nodes in ascending id order
    nodes: Roster,
    /// Last state confirmed on each scheduled node
    applied: HashMap<u32, AppliedState>,
    pacing: Pacing,
}

impl<D: DeviceControl> ReconcileEngine<D> {
    /// Create a new engine; every scheduled node starts in the unknown state
    pub fn new(control: D, nodes: Roster, pacing: Pacing) -> Self {
        let mut applied = HashMap::new();
        for node in nodes.values() {
            tracing::info!("Servicing node {} ({})", node.id, node.description);
            if matches!(node.mode, NodeMode::Schedule { .. }) {
                applied.insert(node.id, AppliedState::Unknown);
            }
        }

        Self {
            control,
            nodes,
            applied,
            pacing,
        }
    }

    /// Device network handle
    pub fn control(&self) -> &D {
        &self.control
    }

    /// Last confirmed state of a scheduled node
    pub fn applied_state(&self, node_id: u32) -> Option<AppliedState> {
        self.applied.get(&node_id).copied()
    }

    /// One pass over all nodes using the local time of day
    pub async fn tick(&mut self) -> TickReport {
        self.tick_at(Local::now().time()).await
    }

    /// One pass over all nodes evaluating schedules at `now`
    pub async fn tick_at(&mut self, now: NaiveTime) -> TickReport {
        let mut report = TickReport::default();

        for node in self.nodes.values() {
            match &node.mode {
                NodeMode::Parameters(params) => {
                    reconcile_parameters(&self.control, node, params, &self.pacing, &mut report)
                        .await;
                    pause(self.pacing.node_delay).await;
                }
                NodeMode::Schedule { schedule, actuator } => {
                    let applied = self.applied.entry(node.id).or_default();
                    reconcile_schedule(
                        &self.control,
                        node,
                        schedule,
                        actuator,
                        applied,
                        now,
                        &mut report,
                    )
                    .await;
                }
            }
        }

        report
    }

    /// Run ticks forever, pacing them by outcome
    pub async fn run(&mut self) {
        loop {
            let report = self.tick().await;
            let wait = self.pacing.after_tick(report.had_failures());
            tracing::info!(
                "Tick complete: {} transitions, {} failures; next pass in {:?}",
                report.transitions.len(),
                report.failures,
                wait
            );
            pause(wait).await;
        }
    }
}
