//! Finite-state lifecycles for crawlers and jobs.
//!
//! Neither crawlers nor jobs do real work: their state is a declarative tag
//! that gates start/stop calls. Allowed moves are listed in a transition
//! table; anything not in the table is rejected with `InvalidState`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operations that move a crawler or job between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrawlerState {
    Ready,
    Running,
    Stopping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Ready,
    Running,
}

/// `(from, action, to)` rows.
pub type TransitionTable<S> = &'static [(S, Action, S)];

pub const CRAWLER_TRANSITIONS: TransitionTable<CrawlerState> = &[
    (CrawlerState::Ready, Action::Start, CrawlerState::Running),
    (CrawlerState::Stopping, Action::Start, CrawlerState::Running),
    (CrawlerState::Running, Action::Stop, CrawlerState::Stopping),
];

pub const JOB_TRANSITIONS: TransitionTable<JobState> =
    &[(JobState::Ready, Action::Start, JobState::Running)];

/// Look up the target state for `action` taken from `from`.
pub fn next_state<S: Copy + PartialEq>(table: TransitionTable<S>, from: S, action: Action) -> Option<S> {
    table
        .iter()
        .find(|(state, a, _)| *state == from && *a == action)
        .map(|(_, _, to)| *to)
}

impl CrawlerState {
    pub fn as_str(self) -> &'static str {
        match self {
            CrawlerState::Ready => "READY",
            CrawlerState::Running => "RUNNING",
            CrawlerState::Stopping => "STOPPING",
        }
    }
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Ready => "READY",
            JobState::Running => "RUNNING",
        }
    }
}

impl fmt::Display for CrawlerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crawler_table() {
        use CrawlerState::*;
        assert_eq!(next_state(CRAWLER_TRANSITIONS, Ready, Action::Start), Some(Running));
        assert_eq!(next_state(CRAWLER_TRANSITIONS, Running, Action::Start), None);
        assert_eq!(next_state(CRAWLER_TRANSITIONS, Running, Action::Stop), Some(Stopping));
        assert_eq!(next_state(CRAWLER_TRANSITIONS, Stopping, Action::Stop), None);
        assert_eq!(next_state(CRAWLER_TRANSITIONS, Stopping, Action::Start), Some(Running));
        assert_eq!(next_state(CRAWLER_TRANSITIONS, Ready, Action::Stop), None);
    }

    #[test]
    fn job_table() {
        assert_eq!(
            next_state(JOB_TRANSITIONS, JobState::Ready, Action::Start),
            Some(JobState::Running)
        );
        assert_eq!(next_state(JOB_TRANSITIONS, JobState::Running, Action::Start), None);
    }

    #[test]
    fn state_wire_names() {
        assert_eq!(serde_json::to_string(&CrawlerState::Stopping).unwrap(), "\"STOPPING\"");
        assert_eq!(JobState::Running.to_string(), "RUNNING");
    }
}
