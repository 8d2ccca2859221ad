//! Type definitions for the guided build wizard.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{Component, Slot};
use crate::rules::Warning;

// =============================================================================
// SIZE CLASSES
// =============================================================================

/// Frame size class, used only to narrow the frame list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    #[serde(rename = "micro")]
    Micro,
    #[serde(rename = "3inch")]
    ThreeInch,
    #[serde(rename = "5inch")]
    FiveInch,
    #[serde(rename = "7inch")]
    SevenInch,
    #[serde(rename = "heavy")]
    Heavy,
    #[serde(rename = "unknown")]
    Unknown,
}

impl SizeClass {
    /// Classes offered on the class selection screen.
    pub const SELECTABLE: [SizeClass; 5] = [
        SizeClass::Micro,
        SizeClass::ThreeInch,
        SizeClass::FiveInch,
        SizeClass::SevenInch,
        SizeClass::Heavy,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            SizeClass::Micro => "micro",
            SizeClass::ThreeInch => "3inch",
            SizeClass::FiveInch => "5inch",
            SizeClass::SevenInch => "7inch",
            SizeClass::Heavy => "heavy",
            SizeClass::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SizeClass::Micro => "Tiny Whoop / Micro",
            SizeClass::ThreeInch => "3\" Build",
            SizeClass::FiveInch => "5\" Freestyle / Racing",
            SizeClass::SevenInch => "7\" Long Range / Cine",
            SizeClass::Heavy => "X-Class / Cinelifter",
            SizeClass::Unknown => "Unknown",
        }
    }

    /// Prop size range hint shown under the label.
    pub fn prop_hint(&self) -> &'static str {
        match self {
            SizeClass::Micro => "1-2\" props",
            SizeClass::ThreeInch => "2.5-3.5\" props",
            SizeClass::FiveInch => "4-5.5\" props",
            SizeClass::SevenInch => "6-8\" props",
            SizeClass::Heavy => "10\"+ props",
            SizeClass::Unknown => "",
        }
    }

    /// Class from a max prop size in inches.
    pub fn from_prop_size(inches: f64) -> SizeClass {
        if inches <= 2.5 {
            SizeClass::Micro
        } else if inches <= 3.5 {
            SizeClass::ThreeInch
        } else if inches <= 5.5 {
            SizeClass::FiveInch
        } else if inches <= 8.0 {
            SizeClass::SevenInch
        } else {
            SizeClass::Heavy
        }
    }

    /// Class from a diagonal wheelbase in millimetres.
    pub fn from_wheelbase(mm: f64) -> SizeClass {
        if mm <= 100.0 {
            SizeClass::Micro
        } else if mm <= 150.0 {
            SizeClass::ThreeInch
        } else if mm <= 250.0 {
            SizeClass::FiveInch
        } else if mm <= 400.0 {
            SizeClass::SevenInch
        } else {
            SizeClass::Heavy
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// The class chosen at the start of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassFilter {
    All,
    Only(SizeClass),
}

impl ClassFilter {
    pub fn from_id(id: &str) -> Option<ClassFilter> {
        let class = match id.trim().to_lowercase().as_str() {
            "all" => return Some(ClassFilter::All),
            "micro" => SizeClass::Micro,
            "3inch" => SizeClass::ThreeInch,
            "5inch" => SizeClass::FiveInch,
            "7inch" => SizeClass::SevenInch,
            "heavy" => SizeClass::Heavy,
            _ => return None,
        };
        Some(ClassFilter::Only(class))
    }

    /// A frame passes when the filter is `all`, the classes match, or the
    /// frame's class could not be inferred.
    pub fn admits(&self, class: SizeClass) -> bool {
        match self {
            ClassFilter::All => true,
            ClassFilter::Only(wanted) => class == *wanted || class == SizeClass::Unknown,
        }
    }
}

impl fmt::Display for ClassFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassFilter::All => f.write_str("all"),
            ClassFilter::Only(class) => write!(f, "{}", class),
        }
    }
}

// =============================================================================
// STEPS AND PROGRESS
// =============================================================================

/// One category step of the wizard (loaded from configuration).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardStep {
    pub category: Slot,
    /// Short label for progress chips, e.g. "FC"
    pub name: String,
    /// Instruction shown while the step is active
    pub prompt: String,
    #[serde(default)]
    pub optional: bool,
}

/// Where the wizard is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "step", rename_all = "snake_case")]
pub enum WizardPhase {
    Idle,
    ClassSelection,
    Step(usize),
    Completed,
}

/// Result of asking the wizard to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    Started,
    /// The build has parts; starting would clear them.
    ConfirmationRequired { filled: usize },
    AlreadyActive,
}

/// New phase plus any notices raised on the way (e.g. skipped steps).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    pub phase: WizardPhase,
    pub notices: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Skipped,
    Current,
    Upcoming,
}

/// Progress chip for one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepProgress {
    pub category: Slot,
    pub name: String,
    pub status: StepStatus,
    pub optional: bool,
}

/// Returned when the wizard is left.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardSummary {
    pub completed: bool,
    pub filled_count: usize,
    pub total_steps: usize,
}

// =============================================================================
// CANDIDATE PARTITION
// =============================================================================

/// A candidate part with the warnings it would raise if chosen.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub component: Arc<Component>,
    pub warnings: Vec<Warning>,
}

/// Candidates for the current step, bucketed by compatibility.
#[derive(Debug, Clone, Serialize)]
pub struct CandidatePartition {
    pub category: Slot,
    /// No warnings; lightest first
    pub compatible: Vec<Candidate>,
    /// Advisory warnings only; fewest warnings first
    pub caution: Vec<Candidate>,
    /// At least one blocking warning; alphabetical
    pub incompatible: Vec<Candidate>,
}

impl CandidatePartition {
    pub fn total(&self) -> usize {
        self.compatible.len() + self.caution.len() + self.incompatible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
