//! The individual compatibility checks.
//!
//! Each check reads a borrowed build view and returns at most one warning.
//! A check is skipped (returns `None`) whenever one of the values it compares
//! is missing or unparseable on either side.

use crate::build::{BuildView, PartView};
use crate::catalog::{CompatField, CompatValue, Severity, Slot};

use super::types::{RuleId, Warning};

pub(crate) type Check = fn(&BuildView<'_>) -> Option<Warning>;

/// Checks in canonical order.
pub(crate) const CHECKS: [(RuleId, Check); 12] = [
    (RuleId::PropSize, prop_size),
    (RuleId::FcMountPattern, fc_mount_pattern),
    (RuleId::MotorMountSpacing, motor_mount_spacing),
    (RuleId::FcMountHoleSize, fc_mount_hole_size),
    (RuleId::MotorBoltSize, motor_bolt_size),
    (RuleId::EscMountPattern, esc_mount_pattern),
    (RuleId::BatteryConnector, battery_connector),
    (RuleId::BatteryVoltage, battery_voltage),
    (RuleId::MotorCellCount, motor_cell_count),
    (RuleId::EscCellCount, esc_cell_count),
    (RuleId::VideoSystem, video_system),
    (RuleId::EscCurrent, esc_current),
];

fn warning(
    rule: RuleId,
    severity: Severity,
    slots: [Slot; 2],
    title: &str,
    message: String,
) -> Option<Warning> {
    Some(Warning {
        rule,
        severity,
        title: title.to_string(),
        message,
        slots,
    })
}

/// Severity declared on `part` for `field`, defaulting to advisory.
fn declared(part: &PartView<'_>, field: CompatField) -> Severity {
    part.attributes.severities().severity_for(field.key())
}

/// Positive numbers held by a value (a scalar or any list members).
fn numbers(value: &CompatValue) -> Vec<f64> {
    value
        .values()
        .iter()
        .filter_map(|v| v.as_number())
        .filter(|n| *n > 0.0)
        .collect()
}

fn has_designator(value: &CompatValue) -> bool {
    value.values().iter().any(|v| !v.normalized().is_empty())
}

fn is_analog(system: &CompatValue) -> bool {
    system.values().iter().any(|v| {
        let text = v.normalized();
        text.contains("analog") || text.contains("cvbs")
    })
}

// 1
fn prop_size(view: &BuildView<'_>) -> Option<Warning> {
    let frame = view.part(Slot::Frames)?;
    let props = view.part(Slot::Propellers)?;
    let max = frame.attributes.positive(CompatField::PropSizeMaxIn)?;
    let diameter = props.attributes.positive(CompatField::DiameterIn)?;

    if diameter <= max {
        return None;
    }
    warning(
        RuleId::PropSize,
        declared(&frame, CompatField::PropSizeMaxIn),
        [Slot::Frames, Slot::Propellers],
        "Propeller Size Exceeds Frame Limits",
        format!(
            "The frame supports up to {}\" props, but you selected {}\" propellers.",
            max, diameter
        ),
    )
}

// 2
fn fc_mount_pattern(view: &BuildView<'_>) -> Option<Warning> {
    let frame = view.part(Slot::Frames)?;
    let fc = view.effective_flight_controller()?;
    let supported = frame.attributes.field(CompatField::FcMountingPatternsMm)?;
    let pattern = fc.attributes.field(CompatField::MountingPatternMm)?;
    if !has_designator(supported) || !has_designator(pattern) {
        return None;
    }

    if supported.overlaps(pattern) {
        return None;
    }
    warning(
        RuleId::FcMountPattern,
        declared(&frame, CompatField::FcMountingPatternsMm),
        [Slot::Frames, fc.source],
        "Flight Controller Mount Mismatch",
        format!(
            "The {}mm FC will not bolt onto this frame, which only supports: {}mm.",
            pattern, supported
        ),
    )
}

// 3
fn motor_mount_spacing(view: &BuildView<'_>) -> Option<Warning> {
    let frame = view.part(Slot::Frames)?;
    let motors = view.part(Slot::Motors)?;
    let frame_spacing = numbers(frame.attributes.field(CompatField::MotorMountHoleSpacingMm)?);
    let motor_spacing = numbers(motors.attributes.field(CompatField::MotorMountHoleSpacingMm)?);
    if frame_spacing.is_empty() || motor_spacing.is_empty() {
        return None;
    }

    let fits = motor_spacing
        .iter()
        .any(|m| frame_spacing.iter().any(|f| (m - f).abs() < 1e-9));
    if fits {
        return None;
    }
    warning(
        RuleId::MotorMountSpacing,
        declared(&frame, CompatField::MotorMountHoleSpacingMm),
        [Slot::Frames, Slot::Motors],
        "Motor Mount Mismatch",
        format!(
            "These motors use {}mm spacing. The frame uses {}mm.",
            join_numbers(&motor_spacing),
            join_numbers(&frame_spacing)
        ),
    )
}

// 4
fn fc_mount_hole_size(view: &BuildView<'_>) -> Option<Warning> {
    let frame = view.part(Slot::Frames)?;
    let fc = view.effective_flight_controller()?;
    let frame_size = frame.attributes.field(CompatField::FcMountHoleSize)?;
    let fc_size = fc.attributes.field(CompatField::MountHoleSize)?;
    if !has_designator(frame_size) || !has_designator(fc_size) || frame_size.overlaps(fc_size) {
        return None;
    }
    warning(
        RuleId::FcMountHoleSize,
        declared(&frame, CompatField::FcMountHoleSize),
        [Slot::Frames, fc.source],
        "FC Mounting Hole Size Mismatch",
        format!(
            "The flight controller takes {} hardware, but the frame's stack mount is drilled for {}.",
            fc_size, frame_size
        ),
    )
}

// 5
fn motor_bolt_size(view: &BuildView<'_>) -> Option<Warning> {
    let frame = view.part(Slot::Frames)?;
    let motors = view.part(Slot::Motors)?;
    let frame_bolt = frame.attributes.field(CompatField::MotorMountBoltSize)?;
    let motor_bolt = motors.attributes.field(CompatField::MotorMountBoltSize)?;
    if !has_designator(frame_bolt) || !has_designator(motor_bolt) || frame_bolt.overlaps(motor_bolt) {
        return None;
    }
    warning(
        RuleId::MotorBoltSize,
        declared(&frame, CompatField::MotorMountBoltSize),
        [Slot::Frames, Slot::Motors],
        "Motor Bolt Size Mismatch",
        format!(
            "These motors mount with {} bolts, but the frame arms are drilled for {}.",
            motor_bolt, frame_bolt
        ),
    )
}

// 6
fn esc_mount_pattern(view: &BuildView<'_>) -> Option<Warning> {
    if view.has(Slot::Stacks) {
        return None;
    }
    let frame = view.part(Slot::Frames)?;
    let esc = view.part(Slot::Escs)?;
    let supported = frame.attributes.field(CompatField::FcMountingPatternsMm)?;
    let pattern = esc.attributes.field(CompatField::MountingPatternMm)?;
    if !has_designator(supported) || !has_designator(pattern) || supported.overlaps(pattern) {
        return None;
    }
    warning(
        RuleId::EscMountPattern,
        declared(&frame, CompatField::FcMountingPatternsMm),
        [Slot::Frames, Slot::Escs],
        "ESC Mount Mismatch",
        format!(
            "The {}mm ESC will not fit this frame's stack mount, which only supports: {}mm.",
            pattern, supported
        ),
    )
}

// 7
fn battery_connector(view: &BuildView<'_>) -> Option<Warning> {
    let battery = view.part(Slot::Batteries)?;
    let esc = view.effective_esc()?;
    let connector = battery.attributes.field(CompatField::ConnectorType)?;
    let expected = esc.attributes.field(CompatField::BatteryConnector)?;
    if !has_designator(connector) || !has_designator(expected) || expected.overlaps(connector) {
        return None;
    }
    warning(
        RuleId::BatteryConnector,
        Severity::Error,
        [Slot::Batteries, esc.source],
        "Battery Connector Mismatch",
        format!(
            "The battery uses an {} connector, but the ESC lead is {}.",
            connector, expected
        ),
    )
}

// 8
fn battery_voltage(view: &BuildView<'_>) -> Option<Warning> {
    let battery = view.part(Slot::Batteries)?;
    let esc = view.effective_esc()?;
    let peak = battery.attributes.positive(CompatField::PeakVoltageV)?;
    let min = esc.attributes.positive(CompatField::VoltageMinV);
    let max = esc.attributes.positive(CompatField::VoltageMaxV);

    let message = match (min, max) {
        (_, Some(max)) if peak > max => format!(
            "A fully charged battery reaches {}V, above the ESC's {}V maximum.",
            peak, max
        ),
        (Some(min), _) if peak < min => format!(
            "The battery peaks at {}V, below the ESC's {}V minimum input.",
            peak, min
        ),
        _ => return None,
    };
    warning(
        RuleId::BatteryVoltage,
        Severity::Warning,
        [Slot::Batteries, esc.source],
        "Battery Voltage Outside ESC Range",
        message,
    )
}

// 9
fn motor_cell_count(view: &BuildView<'_>) -> Option<Warning> {
    let battery = view.part(Slot::Batteries)?;
    let motors = view.part(Slot::Motors)?;
    let cells = battery.attributes.positive(CompatField::CellCount)?;
    let motor_max = motors.attributes.positive(CompatField::CellCountMax)?;

    if cells <= motor_max {
        return None;
    }
    warning(
        RuleId::MotorCellCount,
        Severity::Warning,
        [Slot::Batteries, Slot::Motors],
        "Battery Voltage High for Motors",
        format!(
            "These motors are rated for up to {}S, but you chose a {}S battery.",
            motor_max, cells
        ),
    )
}

// 10
fn esc_cell_count(view: &BuildView<'_>) -> Option<Warning> {
    let battery = view.part(Slot::Batteries)?;
    let esc = view.effective_esc()?;
    let cells = battery.attributes.positive(CompatField::CellCount)?;
    let severities = esc.attributes.severities();

    if let Some(max) = esc.attributes.positive(CompatField::CellCountMax) {
        if cells > max {
            // Overvoltage is blocking unless the part marks it soft.
            let severity = severities
                .explicit(CompatField::CellCountMax.key())
                .unwrap_or(Severity::Error);
            return warning(
                RuleId::EscCellCount,
                severity,
                [Slot::Batteries, esc.source],
                "ESC Overvoltage Risk",
                format!(
                    "The ESC max rating is {}S. A {}S battery will likely fry it.",
                    max, cells
                ),
            );
        }
    }

    let min = esc.attributes.positive(CompatField::CellCountMin)?;
    if cells >= min {
        return None;
    }
    warning(
        RuleId::EscCellCount,
        severities.severity_for(CompatField::CellCountMin.key()),
        [Slot::Batteries, esc.source],
        "Low Battery Voltage",
        format!(
            "The ESC expects at least {}S. A {}S battery may not power it properly.",
            min, cells
        ),
    )
}

// 11
fn video_system(view: &BuildView<'_>) -> Option<Warning> {
    let vtx = view.part(Slot::VideoTransmitters)?;
    let camera = view.part(Slot::FpvCameras)?;
    let vtx_system = vtx.attributes.field(CompatField::VideoSystem)?;
    if !has_designator(vtx_system) {
        return None;
    }
    let camera_system = camera
        .attributes
        .field(CompatField::VideoSystem)
        .filter(|s| has_designator(s));

    if is_analog(vtx_system) {
        let camera_system = camera_system?;
        if is_analog(camera_system) {
            return None;
        }
        return warning(
            RuleId::VideoSystem,
            Severity::Warning,
            [Slot::FpvCameras, Slot::VideoTransmitters],
            "Video System Mismatch",
            format!(
                "This VTX takes an analog signal, but the camera outputs {}.",
                camera_system
            ),
        );
    }

    if camera_system.is_some_and(is_analog) {
        return None;
    }
    let vtx_digital = vtx.attributes.field(CompatField::DigitalSystem)?;
    let camera_digital = camera.attributes.field(CompatField::DigitalSystem)?;
    if !has_designator(vtx_digital) || !has_designator(camera_digital) || vtx_digital.overlaps(camera_digital) {
        return None;
    }
    warning(
        RuleId::VideoSystem,
        Severity::Warning,
        [Slot::FpvCameras, Slot::VideoTransmitters],
        "Digital System Mismatch",
        format!(
            "The camera is built for {}, but the VTX runs {}.",
            camera_digital, vtx_digital
        ),
    )
}

// 12
fn esc_current(view: &BuildView<'_>) -> Option<Warning> {
    let motors = view.part(Slot::Motors)?;
    let esc = view.effective_esc()?;
    let required = motors.attributes.positive(CompatField::MinEscCurrentA)?;
    let rating = esc.attributes.positive(CompatField::ContinuousCurrentPerMotorA)?;

    if required <= rating {
        return None;
    }
    warning(
        RuleId::EscCurrent,
        Severity::Warning,
        [Slot::Motors, esc.source],
        "ESC Current Rating Too Low",
        format!(
            "These motors need at least {}A per motor, but the ESC is rated for {}A continuous.",
            required, rating
        ),
    )
}

fn join_numbers(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
