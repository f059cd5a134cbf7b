//! Guided breathing patterns
//!
//! Each pattern is a fixed cycle of phases. A session repeats the cycle a
//! number of times; `schedule` lays the phases out on a timeline so a client
//! only has to follow the offsets.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Most cycles a single session or schedule may have
pub const MAX_CYCLES: u32 = 100;

/// Check that a requested cycle count is within `1..=MAX_CYCLES`
pub fn validate_cycles(cycles: u32) -> crate::Result<u32> {
    if cycles == 0 || cycles > MAX_CYCLES {
        return Err(crate::Error::InvalidData(format!(
            "cycles must be between 1 and {}",
            MAX_CYCLES
        )));
    }
    Ok(cycles)
}

/// Supported breathing patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreathingPattern {
    /// 4s in, 4s hold, 4s out, 4s hold
    Box,
    /// 4s in, 7s hold, 8s out
    FourSevenEight,
    /// 5.5s in, 5.5s out (about six breaths per minute)
    Coherent,
    /// 4s in, 6s out
    Relaxing,
}

/// What the user should be doing during a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Inhale,
    Hold,
    Exhale,
    /// Hold with empty lungs after exhaling
    HoldEmpty,
}

impl PhaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Inhale => "inhale",
            PhaseKind::Hold => "hold",
            PhaseKind::Exhale => "exhale",
            PhaseKind::HoldEmpty => "hold_empty",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathPhase {
    pub kind: PhaseKind,
    pub duration_ms: u32,
}

/// A phase placed on the session timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledPhase {
    /// Zero-based cycle number
    pub cycle: u32,
    pub kind: PhaseKind,
    /// Milliseconds from session start
    pub offset_ms: u64,
    pub duration_ms: u32,
}

const fn phase(kind: PhaseKind, duration_ms: u32) -> BreathPhase {
    BreathPhase { kind, duration_ms }
}

const BOX_PHASES: [BreathPhase; 4] = [
    phase(PhaseKind::Inhale, 4000),
    phase(PhaseKind::Hold, 4000),
    phase(PhaseKind::Exhale, 4000),
    phase(PhaseKind::HoldEmpty, 4000),
];

const FOUR_SEVEN_EIGHT_PHASES: [BreathPhase; 3] = [
    phase(PhaseKind::Inhale, 4000),
    phase(PhaseKind::Hold, 7000),
    phase(PhaseKind::Exhale, 8000),
];

const COHERENT_PHASES: [BreathPhase; 2] = [
    phase(PhaseKind::Inhale, 5500),
    phase(PhaseKind::Exhale, 5500),
];

const RELAXING_PHASES: [BreathPhase; 2] = [
    phase(PhaseKind::Inhale, 4000),
    phase(PhaseKind::Exhale, 6000),
];

impl BreathingPattern {
    pub const ALL: [BreathingPattern; 4] = [
        BreathingPattern::Box,
        BreathingPattern::FourSevenEight,
        BreathingPattern::Coherent,
        BreathingPattern::Relaxing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BreathingPattern::Box => "box",
            BreathingPattern::FourSevenEight => "four_seven_eight",
            BreathingPattern::Coherent => "coherent",
            BreathingPattern::Relaxing => "relaxing",
        }
    }

    /// Human-readable name
    pub fn title(&self) -> &'static str {
        match self {
            BreathingPattern::Box => "Box Breathing",
            BreathingPattern::FourSevenEight => "4-7-8 Breathing",
            BreathingPattern::Coherent => "Coherent Breathing",
            BreathingPattern::Relaxing => "Relaxing Breath",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BreathingPattern::Box => "Equal counts in, hold, out, hold. Steadies focus under stress.",
            BreathingPattern::FourSevenEight => {
                "Long hold and slow exhale. Often used to wind down before sleep."
            }
            BreathingPattern::Coherent => "Slow, even breathing at about six breaths per minute.",
            BreathingPattern::Relaxing => "Exhale longer than you inhale to calm the body.",
        }
    }

    /// Phases of one cycle, in order
    pub fn phases(&self) -> &'static [BreathPhase] {
        match self {
            BreathingPattern::Box => &BOX_PHASES,
            BreathingPattern::FourSevenEight => &FOUR_SEVEN_EIGHT_PHASES,
            BreathingPattern::Coherent => &COHERENT_PHASES,
            BreathingPattern::Relaxing => &RELAXING_PHASES,
        }
    }

    pub fn cycle_duration(&self) -> Duration {
        Duration::from_millis(self.cycle_ms())
    }

    fn cycle_ms(&self) -> u64 {
        self.phases().iter().map(|p| p.duration_ms as u64).sum()
    }

    /// Total length of a session with the given number of cycles
    pub fn session_duration(&self, cycles: u32) -> Duration {
        Duration::from_millis(self.cycle_ms() * cycles as u64)
    }

    /// Whole cycles that fit in `target`, between one and `MAX_CYCLES`
    pub fn cycles_for(&self, target: Duration) -> u32 {
        let cycles = target.as_millis() / self.cycle_ms() as u128;
        cycles.clamp(1, MAX_CYCLES as u128) as u32
    }

    /// Lay out `cycles` repetitions of the pattern on a timeline
    ///
    /// At most `MAX_CYCLES` cycles are laid out.
    pub fn schedule(&self, cycles: u32) -> Vec<ScheduledPhase> {
        let cycles = cycles.min(MAX_CYCLES);
        let phases = self.phases();
        let mut steps = Vec::with_capacity(phases.len() * cycles as usize);
        let mut offset_ms = 0u64;

        for cycle in 0..cycles {
            for p in phases {
                steps.push(ScheduledPhase {
                    cycle,
                    kind: p.kind,
                    offset_ms,
                    duration_ms: p.duration_ms,
                });
                offset_ms += p.duration_ms as u64;
            }
        }

        steps
    }
}

impl fmt::Display for BreathingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BreathingPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "box" => Ok(BreathingPattern::Box),
            "four_seven_eight" | "4_7_8" | "478" => Ok(BreathingPattern::FourSevenEight),
            "coherent" => Ok(BreathingPattern::Coherent),
            "relaxing" => Ok(BreathingPattern::Relaxing),
            _ => Err(format!("Unknown breathing pattern: {}", s)),
        }
    }
}
