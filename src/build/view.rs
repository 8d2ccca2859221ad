use crate::catalog::{Attributes, Component, Slot};

use super::state::BuildState;

/// The attributes a rule reads for one logical part.
///
/// For a standalone part this is the component itself; for a part supplied by
/// a stack it is the stack's nested `fc` / `esc` sub-object.
#[derive(Debug, Clone, Copy)]
pub struct PartView<'a> {
    pub name: &'a str,
    pub attributes: &'a Attributes,
    /// Slot the values come from (`Stacks` when merged from a stack)
    pub source: Slot,
}

impl<'a> PartView<'a> {
    pub fn of(component: &'a Component) -> Self {
        Self {
            name: &component.name,
            attributes: &component.attributes,
            source: component.category,
        }
    }
}

/// Read-only view of a build, optionally with one slot substituted.
///
/// Hypothetical evaluation runs against a view instead of a cloned build, so
/// the real build is never touched.
#[derive(Debug, Clone, Copy)]
pub struct BuildView<'a> {
    build: &'a BuildState,
    overlay: Option<(Slot, &'a Component)>,
}

impl<'a> BuildView<'a> {
    pub fn new(build: &'a BuildState) -> Self {
        Self { build, overlay: None }
    }

    pub fn with_candidate(build: &'a BuildState, slot: Slot, candidate: &'a Component) -> Self {
        Self {
            build,
            overlay: Some((slot, candidate)),
        }
    }

    pub fn get(&self, slot: Slot) -> Option<&'a Component> {
        match self.overlay {
            Some((overlay_slot, candidate)) if overlay_slot == slot => Some(candidate),
            _ => self.build.get(slot).map(|c| c.as_ref()),
        }
    }

    pub fn part(&self, slot: Slot) -> Option<PartView<'a>> {
        self.get(slot).map(PartView::of)
    }

    pub fn has(&self, slot: Slot) -> bool {
        self.get(slot).is_some()
    }

    /// Standalone flight controller, else the stack's `fc` sub-object.
    pub fn effective_flight_controller(&self) -> Option<PartView<'a>> {
        self.part(Slot::FlightControllers)
            .or_else(|| self.stack_part(Slot::FlightControllers))
    }

    /// Standalone ESC, else the stack's `esc` sub-object.
    pub fn effective_esc(&self) -> Option<PartView<'a>> {
        self.part(Slot::Escs).or_else(|| self.stack_part(Slot::Escs))
    }

    fn stack_part(&self, slot: Slot) -> Option<PartView<'a>> {
        let stack = self.get(Slot::Stacks)?;
        let attributes = match slot {
            Slot::FlightControllers => stack.attributes.fc()?,
            Slot::Escs => stack.attributes.esc()?,
            _ => return None,
        };
        Some(PartView {
            name: &stack.name,
            attributes,
            source: Slot::Stacks,
        })
    }
}
