//! Type definitions for the compatibility rule set.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{Severity, Slot};

// =============================================================================
// RULE IDENTIFIERS
// =============================================================================

/// The twelve pairwise compatibility checks, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    /// Frame max prop size vs propeller diameter
    PropSize,
    /// Frame FC mount patterns vs FC mounting pattern
    FcMountPattern,
    /// Frame vs motor mount hole spacing
    MotorMountSpacing,
    /// Frame FC hole size vs FC hole size
    FcMountHoleSize,
    /// Frame vs motor bolt size
    MotorBoltSize,
    /// Standalone ESC mounting pattern vs frame (no stack)
    EscMountPattern,
    /// Battery connector vs ESC input connector
    BatteryConnector,
    /// Battery peak voltage vs ESC voltage window
    BatteryVoltage,
    /// Battery cells vs motor max cells
    MotorCellCount,
    /// Battery cells vs ESC min/max cells
    EscCellCount,
    /// Camera vs VTX video system
    VideoSystem,
    /// Motor minimum current vs ESC per-motor rating
    EscCurrent,
}

impl RuleId {
    pub const ALL: [RuleId; 12] = [
        RuleId::PropSize,
        RuleId::FcMountPattern,
        RuleId::MotorMountSpacing,
        RuleId::FcMountHoleSize,
        RuleId::MotorBoltSize,
        RuleId::EscMountPattern,
        RuleId::BatteryConnector,
        RuleId::BatteryVoltage,
        RuleId::MotorCellCount,
        RuleId::EscCellCount,
        RuleId::VideoSystem,
        RuleId::EscCurrent,
    ];

    /// 1-based position in the canonical rule list.
    pub fn number(&self) -> u8 {
        RuleId::ALL
            .iter()
            .position(|r| r == self)
            .map_or(0, |i| i as u8 + 1)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleId::PropSize => "prop_size",
            RuleId::FcMountPattern => "fc_mount_pattern",
            RuleId::MotorMountSpacing => "motor_mount_spacing",
            RuleId::FcMountHoleSize => "fc_mount_hole_size",
            RuleId::MotorBoltSize => "motor_bolt_size",
            RuleId::EscMountPattern => "esc_mount_pattern",
            RuleId::BatteryConnector => "battery_connector",
            RuleId::BatteryVoltage => "battery_voltage",
            RuleId::MotorCellCount => "motor_cell_count",
            RuleId::EscCellCount => "esc_cell_count",
            RuleId::VideoSystem => "video_system",
            RuleId::EscCurrent => "esc_current",
        };
        f.write_str(name)
    }
}

// =============================================================================
// OUTPUT TYPES
// =============================================================================

/// A violated compatibility rule. Transient; recomputed on every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub rule: RuleId,
    pub severity: Severity,
    pub title: String,
    /// Explanation quoting the offending values
    pub message: String,
    /// The two slots involved, for highlighting
    pub slots: [Slot; 2],
}

impl Warning {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// True if any warning is blocking.
pub fn has_errors(warnings: &[Warning]) -> bool {
    warnings.iter().any(Warning::is_error)
}
