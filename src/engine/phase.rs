use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Intro,
    Choice,
    Transit,
    Resolution,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Intro, Phase::Choice, Phase::Transit, Phase::Resolution];

    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Intro => Some(Phase::Choice),
            Phase::Choice => Some(Phase::Transit),
            Phase::Transit => Some(Phase::Resolution),
            Phase::Resolution => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Intro => "intro",
            Phase::Choice => "choice",
            Phase::Transit => "transit",
            Phase::Resolution => "resolution",
        };
        f.write_str(name)
    }
}

/// The triggers that move the presentation forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    TypewriterCompleted,
    UserAdvanced,
    TimerElapsed,
}

/// The phase `event` leads to from `phase`, if it applies there at all.
pub fn transition(phase: Phase, event: PhaseEvent) -> Option<Phase> {
    match (phase, event) {
        (Phase::Intro, PhaseEvent::TypewriterCompleted) => Some(Phase::Choice),
        (Phase::Choice, PhaseEvent::UserAdvanced) => Some(Phase::Transit),
        (Phase::Transit, PhaseEvent::TimerElapsed) => Some(Phase::Resolution),
        _ => None,
    }
}
