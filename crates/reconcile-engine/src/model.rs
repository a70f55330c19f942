//! Data models for the reconciliation engine

use chrono::NaiveTime;
use std::collections::BTreeMap;
use zwave_core::Actuator;

/// Target state of a scheduled node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchState {
    Off,
    On,
}

impl SwitchState {
    #[must_use]
    pub fn is_on(self) -> bool {
        self == SwitchState::On
    }
}

impl From<bool> for SwitchState {
    fn from(on: bool) -> Self {
        if on {
            SwitchState::On
        } else {
            SwitchState::Off
        }
    }
}

impl std::fmt::Display for SwitchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SwitchState::Off => "off",
            SwitchState::On => "on",
        })
    }
}

/// Last state the loop successfully pushed to a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppliedState {
    /// Nothing confirmed yet; forces convergence on the next tick
    #[default]
    Unknown,
    Off,
    On,
}

impl From<SwitchState> for AppliedState {
    fn from(state: SwitchState) -> Self {
        match state {
            SwitchState::Off => AppliedState::Off,
            SwitchState::On => AppliedState::On,
        }
    }
}

impl PartialEq<SwitchState> for AppliedState {
    fn eq(&self, other: &SwitchState) -> bool {
        *self == AppliedState::from(*other)
    }
}

impl std::fmt::Display for AppliedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AppliedState::Unknown => "unknown",
            AppliedState::Off => "off",
            AppliedState::On => "on",
        })
    }
}

/// One entry of a daily schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEvent {
    /// Time of day the state takes effect
    pub at: NaiveTime,
    pub state: SwitchState,
}

/// Non-empty daily schedule, sorted by time of day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    events: Vec<ScheduleEvent>,
}

impl Schedule {
    /// Build a schedule, sorting events by time of day.
    ///
    /// Returns `None` for an empty list. Events with equal times keep their
    /// original relative order.
    #[must_use]
    pub fn new(mut events: Vec<ScheduleEvent>) -> Option<Self> {
        if events.is_empty() {
            return None;
        }
        events.sort_by_key(|e| e.at);
        Some(Self { events })
    }

    #[must_use]
    pub fn events(&self) -> &[ScheduleEvent] {
        &self.events
    }

    /// State in effect from the last event until the first one of the next day
    #[must_use]
    pub fn overnight_state(&self) -> SwitchState {
        // Non-empty by construction
        self.events[self.events.len() - 1].state
    }
}

/// A configuration parameter with its desired value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub id: u32,
    pub description: Option<String>,
    pub value: u32,
}

impl Parameter {
    #[must_use]
    pub fn label(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// What the loop maintains on a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeMode {
    /// Fixed configuration parameters, keyed by parameter id
    Parameters(BTreeMap<u32, Parameter>),
    /// Daily on/off schedule
    Schedule {
        schedule: Schedule,
        actuator: Actuator,
    },
}

/// A managed node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: u32,
    pub description: String,
    pub mode: NodeMode,
}

/// All managed nodes, keyed by node id
pub type Roster = BTreeMap<u32, Node>;
