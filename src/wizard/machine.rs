use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::build::BuildState;
use crate::catalog::{Component, Slot};
use crate::error::{DroneClearError, Result};
use crate::rules::Evaluator;

use super::partition::partition_candidates;
use super::types::*;

/// Guided build wizard.
///
/// `Idle -> ClassSelection -> Step(0) .. Step(n-1) -> Completed`. Flight
/// controller and ESC steps are passed over while a stack fills the build.
#[derive(Debug, Clone)]
pub struct Wizard {
    steps: Vec<WizardStep>,
    phase: WizardPhase,
    class_filter: ClassFilter,
    skipped: BTreeSet<usize>,
}

impl Wizard {
    pub fn new(steps: Vec<WizardStep>) -> Self {
        Self {
            steps,
            phase: WizardPhase::Idle,
            class_filter: ClassFilter::All,
            skipped: BTreeSet::new(),
        }
    }

    pub fn steps(&self) -> &[WizardStep] {
        &self.steps
    }

    pub fn phase(&self) -> WizardPhase {
        self.phase
    }

    pub fn class_filter(&self) -> ClassFilter {
        self.class_filter
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, WizardPhase::ClassSelection | WizardPhase::Step(_))
    }

    pub fn current_step(&self) -> Option<&WizardStep> {
        match self.phase {
            WizardPhase::Step(i) => self.steps.get(i),
            _ => None,
        }
    }

    /// Begin a wizard run. A non-empty build is only cleared once the caller
    /// has confirmed.
    pub fn start(&mut self, build: &mut BuildState, confirmed: bool) -> StartOutcome {
        if self.is_active() {
            return StartOutcome::AlreadyActive;
        }
        if !build.is_empty() && !confirmed {
            return StartOutcome::ConfirmationRequired {
                filled: build.filled_count(),
            };
        }

        build.clear_all();
        self.phase = WizardPhase::ClassSelection;
        self.class_filter = ClassFilter::All;
        self.skipped.clear();
        info!("Wizard started with {} steps", self.steps.len());
        StartOutcome::Started
    }

    /// Record the size class and enter the first step.
    pub fn choose_class(&mut self, filter: ClassFilter, build: &BuildState) -> Result<Transition> {
        if self.phase != WizardPhase::ClassSelection {
            return Err(DroneClearError::InvalidInput(
                "A drone class can only be chosen at the start of the wizard".to_string(),
            ));
        }
        self.class_filter = filter;
        debug!("Wizard class filter: {}", filter);
        Ok(self.enter_step(0, build))
    }

    /// Move to the next step, or complete past the last one.
    pub fn advance(&mut self, build: &BuildState) -> Result<Transition> {
        let WizardPhase::Step(i) = self.phase else {
            return Err(DroneClearError::InvalidInput(
                "The wizard is not on a category step".to_string(),
            ));
        };
        Ok(self.enter_step(i + 1, build))
    }

    /// Same as `advance`, without a selection for the current step.
    pub fn skip(&mut self, build: &BuildState) -> Result<Transition> {
        if let WizardPhase::Step(i) = self.phase {
            if self.steps.get(i).is_some_and(|step| !build.is_filled(step.category)) {
                self.skipped.insert(i);
            }
        }
        self.advance(build)
    }

    /// Leave the wizard. The build is left as it is.
    pub fn exit(&mut self, completed: bool, build: &BuildState) -> WizardSummary {
        self.phase = if completed {
            WizardPhase::Completed
        } else {
            WizardPhase::Idle
        };
        info!("Wizard exited (completed: {})", completed);
        WizardSummary {
            completed,
            filled_count: build.filled_count(),
            total_steps: self.steps.len(),
        }
    }

    /// Progress chips for every step.
    pub fn step_statuses(&self, build: &BuildState) -> Vec<StepProgress> {
        let current = match self.phase {
            WizardPhase::Step(i) => Some(i),
            _ => None,
        };

        self.steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let status = if current == Some(i) {
                    StepStatus::Current
                } else if build.is_filled(step.category) {
                    StepStatus::Completed
                } else if self.skipped.contains(&i) || covered_by_stack(step.category, build) {
                    StepStatus::Skipped
                } else {
                    StepStatus::Upcoming
                };
                StepProgress {
                    category: step.category,
                    name: step.name.clone(),
                    status,
                    optional: step.optional,
                }
            })
            .collect()
    }

    /// Candidates for the current step, bucketed against the build.
    /// `None` when no category step is active.
    pub fn candidate_partition(
        &self,
        build: &BuildState,
        components: &[Arc<Component>],
        evaluator: &Evaluator,
    ) -> Option<CandidatePartition> {
        let step = self.current_step()?;
        Some(partition_candidates(
            step.category,
            self.class_filter,
            build,
            components,
            evaluator,
        ))
    }

    fn enter_step(&mut self, from: usize, build: &BuildState) -> Transition {
        let mut notices = Vec::new();
        let mut i = from;

        while let Some(step) = self.steps.get(i) {
            if !covered_by_stack(step.category, build) {
                break;
            }
            notices.push(format!("Skipping {} — included in stack", step.name));
            self.skipped.insert(i);
            i += 1;
        }

        self.phase = if i < self.steps.len() {
            WizardPhase::Step(i)
        } else {
            WizardPhase::Completed
        };
        debug!("Wizard phase: {:?}", self.phase);
        Transition {
            phase: self.phase,
            notices,
        }
    }
}

/// A filled stack supplies the flight controller and ESC.
fn covered_by_stack(category: Slot, build: &BuildState) -> bool {
    matches!(category, Slot::FlightControllers | Slot::Escs) && build.is_filled(Slot::Stacks)
}
