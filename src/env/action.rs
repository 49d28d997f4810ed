//! Action vector layout and normalized-to-physical mapping.

use crate::config::ScenarioConfig;

/// Number of controllable action components.
pub const ACTION_DIM: usize = 4;

/// Index of the battery power component (symbolic range `[-1, 1]`).
pub const ACTION_BATTERY: usize = 0;
/// Index of the grid setpoint component (symbolic range `[-1, 1]`).
pub const ACTION_GRID: usize = 1;
/// Index of the aggregate EV charging component (symbolic range `[0, 1]`).
pub const ACTION_EV: usize = 2;
/// Index of the renewable curtailment component (symbolic range `[0, 1]`).
pub const ACTION_CURTAIL: usize = 3;

/// A proposed control action in physical units, before safety clipping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalAction {
    /// Battery power (kW; positive = charge, negative = discharge).
    pub battery_kw: f32,
    /// Grid setpoint (kW; positive = import, negative = export).
    pub grid_kw: f32,
    /// Aggregate EV charging power (kW, intended >= 0).
    pub ev_charge_kw: f32,
    /// Renewable curtailment fraction (intended in [0, 1]).
    pub curtailment_frac: f32,
}

/// A fixed affine map from a symbolic range to physical units.
///
/// The map extrapolates rather than clips: an out-of-range normalized
/// input produces an out-of-range physical request, which the safety
/// supervisor then clips and records. Clipping here would silently hide
/// violations.
#[derive(Debug, Clone, Copy)]
struct Affine {
    sym_lo: f32,
    sym_hi: f32,
    phys_lo: f32,
    phys_hi: f32,
}

impl Affine {
    fn map(&self, x: f32) -> f32 {
        let span = self.sym_hi - self.sym_lo;
        self.phys_lo + (x - self.sym_lo) * (self.phys_hi - self.phys_lo) / span
    }
}

/// Maps normalized action vectors to physical units.
///
/// The per-component affine maps are fixed at construction from
/// configuration and never change at runtime.
#[derive(Debug, Clone)]
pub struct ActionMapper {
    battery: Affine,
    grid: Affine,
    ev: Affine,
    curtail: Affine,
}

impl ActionMapper {
    /// Builds the mapper from scenario configuration.
    pub fn new(config: &ScenarioConfig) -> Self {
        Self {
            battery: Affine {
                sym_lo: -1.0,
                sym_hi: 1.0,
                phys_lo: -config.battery.max_discharge_kw,
                phys_hi: config.battery.max_charge_kw,
            },
            grid: Affine {
                sym_lo: -1.0,
                sym_hi: 1.0,
                phys_lo: -config.grid.max_export_kw,
                phys_hi: config.grid.max_import_kw,
            },
            ev: Affine {
                sym_lo: 0.0,
                sym_hi: 1.0,
                phys_lo: 0.0,
                phys_hi: config.ev.max_total_kw,
            },
            curtail: Affine {
                sym_lo: 0.0,
                sym_hi: 1.0,
                phys_lo: 0.0,
                phys_hi: 1.0,
            },
        }
    }

    /// Maps a normalized action vector to physical units.
    ///
    /// # Panics
    ///
    /// Panics when the vector is not exactly [`ACTION_DIM`] long — a
    /// caller contract breach, not a recoverable condition.
    pub fn map(&self, raw: &[f32]) -> PhysicalAction {
        assert_eq!(
            raw.len(),
            ACTION_DIM,
            "action vector must have {ACTION_DIM} components, got {}",
            raw.len()
        );
        PhysicalAction {
            battery_kw: self.battery.map(raw[ACTION_BATTERY]),
            grid_kw: self.grid.map(raw[ACTION_GRID]),
            ev_charge_kw: self.ev.map(raw[ACTION_EV]),
            curtailment_frac: self.curtail.map(raw[ACTION_CURTAIL]),
        }
    }
}
