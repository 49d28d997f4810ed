//! Safety supervisor: clips proposed actions into feasible ranges.
//!
//! The policy is always "do the nearest safe thing": a proposed action is
//! never rejected or substituted, only clipped component-wise into the
//! currently valid operating range of each asset. Every clip beyond
//! tolerance is recorded as a structured violation with a configured
//! penalty magnitude.

use std::fmt;

use crate::assets::battery::Battery;
use crate::assets::ev_fleet::EvFleet;
use crate::assets::grid::GridTie;
use crate::assets::AssetId;
use crate::config::SafetyConfig;
use crate::env::action::PhysicalAction;

/// The limit a clipped component ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// Battery charge command above the rated charge power.
    BatteryChargeRate,
    /// Battery discharge command above the rated discharge power.
    BatteryDischargeRate,
    /// Battery charge command the SoC ceiling cannot absorb.
    BatterySocCeiling,
    /// Battery discharge command the SoC floor cannot supply.
    BatterySocFloor,
    /// Grid import above the interconnection limit.
    GridImportLimit,
    /// Grid export above the interconnection limit.
    GridExportLimit,
    /// EV charging command outside the fleet's feasible range.
    EvChargeLimit,
    /// Curtailment fraction outside [0, 1].
    CurtailmentRange,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViolationKind::BatteryChargeRate => "battery_charge_rate",
            ViolationKind::BatteryDischargeRate => "battery_discharge_rate",
            ViolationKind::BatterySocCeiling => "battery_soc_ceiling",
            ViolationKind::BatterySocFloor => "battery_soc_floor",
            ViolationKind::GridImportLimit => "grid_import_limit",
            ViolationKind::GridExportLimit => "grid_export_limit",
            ViolationKind::EvChargeLimit => "ev_charge_limit",
            ViolationKind::CurtailmentRange => "curtailment_range",
        };
        write!(f, "{name}")
    }
}

/// One clipped action component.
#[derive(Debug, Clone, Copy)]
pub struct Violation {
    /// Asset whose limit was hit.
    pub asset: AssetId,
    /// Limit that was hit.
    pub kind: ViolationKind,
    /// Value the action requested.
    pub requested: f32,
    /// Value the supervisor substituted.
    pub clipped: f32,
}

/// Ordered set of violations produced during one step.
///
/// Lives only for the step; episode-level counters are aggregated by the
/// caller.
#[derive(Debug, Clone, Default)]
pub struct ViolationRecord {
    /// Entries in action-component order.
    pub entries: Vec<Violation>,
}

impl ViolationRecord {
    /// Number of violations recorded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing was clipped beyond tolerance.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Clips proposed actions into feasible ranges and prices the clips.
///
/// Pure over asset snapshots: given identical inputs the output is
/// bit-identical. Holds only configuration (tolerance and the penalty
/// table), never state.
#[derive(Debug, Clone)]
pub struct SafetySupervisor {
    tolerance: f32,
    penalty_battery_power: f32,
    penalty_battery_soc: f32,
    penalty_grid_limit: f32,
    penalty_ev_limit: f32,
    penalty_curtailment: f32,
}

impl SafetySupervisor {
    /// Creates a supervisor from validated configuration.
    pub fn new(config: &SafetyConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            penalty_battery_power: config.penalty_battery_power,
            penalty_battery_soc: config.penalty_battery_soc,
            penalty_grid_limit: config.penalty_grid_limit,
            penalty_ev_limit: config.penalty_ev_limit,
            penalty_curtailment: config.penalty_curtailment,
        }
    }

    /// Configured penalty magnitude for a violation kind.
    pub fn penalty_for(&self, kind: ViolationKind) -> f32 {
        match kind {
            ViolationKind::BatteryChargeRate | ViolationKind::BatteryDischargeRate => {
                self.penalty_battery_power
            }
            ViolationKind::BatterySocCeiling | ViolationKind::BatterySocFloor => {
                self.penalty_battery_soc
            }
            ViolationKind::GridImportLimit | ViolationKind::GridExportLimit => {
                self.penalty_grid_limit
            }
            ViolationKind::EvChargeLimit => self.penalty_ev_limit,
            ViolationKind::CurtailmentRange => self.penalty_curtailment,
        }
    }

    /// Clips the proposed action into the feasible range of every asset.
    ///
    /// Returns the safe action, one violation entry per component that was
    /// clipped beyond tolerance (zero to N per step), and the summed
    /// penalty. The penalty flows into the reward calculator as an input
    /// term — it is the single source of truth for the cost of unsafety.
    pub fn check_and_clip(
        &self,
        raw: &PhysicalAction,
        battery: &Battery,
        fleet: &EvFleet,
        grid: &GridTie,
    ) -> (PhysicalAction, ViolationRecord, f32) {
        let mut record = ViolationRecord::default();

        // Battery: rated power limits tightened by SoC headroom.
        let charge_hi = battery.charge_limit_kw();
        let discharge_lo = -battery.discharge_limit_kw();
        let battery_kw = raw.battery_kw.clamp(discharge_lo, charge_hi);
        if raw.battery_kw > charge_hi + self.tolerance {
            let kind = if battery.soc_charge_limit_kw() < battery.max_charge_kw {
                ViolationKind::BatterySocCeiling
            } else {
                ViolationKind::BatteryChargeRate
            };
            record.entries.push(Violation {
                asset: AssetId::Battery,
                kind,
                requested: raw.battery_kw,
                clipped: battery_kw,
            });
        } else if raw.battery_kw < discharge_lo - self.tolerance {
            let kind = if battery.soc_discharge_limit_kw() < battery.max_discharge_kw {
                ViolationKind::BatterySocFloor
            } else {
                ViolationKind::BatteryDischargeRate
            };
            record.entries.push(Violation {
                asset: AssetId::Battery,
                kind,
                requested: raw.battery_kw,
                clipped: battery_kw,
            });
        }

        // Grid: interconnection limits.
        let grid_kw = raw.grid_kw.clamp(-grid.max_export_kw(), grid.max_import_kw());
        if raw.grid_kw > grid.max_import_kw() + self.tolerance {
            record.entries.push(Violation {
                asset: AssetId::Grid,
                kind: ViolationKind::GridImportLimit,
                requested: raw.grid_kw,
                clipped: grid_kw,
            });
        } else if raw.grid_kw < -grid.max_export_kw() - self.tolerance {
            record.entries.push(Violation {
                asset: AssetId::Grid,
                kind: ViolationKind::GridExportLimit,
                requested: raw.grid_kw,
                clipped: grid_kw,
            });
        }

        // EV fleet: non-negative, bounded by connected sessions.
        let ev_hi = fleet.charge_limit_kw();
        let ev_charge_kw = raw.ev_charge_kw.clamp(0.0, ev_hi);
        if (raw.ev_charge_kw - ev_charge_kw).abs() > self.tolerance {
            record.entries.push(Violation {
                asset: AssetId::EvFleet,
                kind: ViolationKind::EvChargeLimit,
                requested: raw.ev_charge_kw,
                clipped: ev_charge_kw,
            });
        }

        // Curtailment: a fraction by definition.
        let curtailment_frac = raw.curtailment_frac.clamp(0.0, 1.0);
        if (raw.curtailment_frac - curtailment_frac).abs() > self.tolerance {
            record.entries.push(Violation {
                asset: AssetId::Renewable,
                kind: ViolationKind::CurtailmentRange,
                requested: raw.curtailment_frac,
                clipped: curtailment_frac,
            });
        }

        let penalty = record
            .entries
            .iter()
            .map(|v| self.penalty_for(v.kind))
            .sum();

        (
            PhysicalAction {
                battery_kw,
                grid_kw,
                ev_charge_kw,
                curtailment_frac,
            },
            record,
            penalty,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BatteryConfig, EvFleetConfig, GridConfig, SafetyConfig, ScenarioConfig};
    use crate::exogenous::EvArrival;

    fn supervisor() -> SafetySupervisor {
        SafetySupervisor::new(&SafetyConfig::default())
    }

    fn battery_at(soc: f32) -> Battery {
        let cfg = BatteryConfig {
            initial_soc: soc,
            ..BatteryConfig::default()
        };
        Battery::new(&cfg, 0.25)
    }

    fn empty_fleet() -> EvFleet {
        EvFleet::new(&EvFleetConfig::default(), 0.25)
    }

    fn grid() -> GridTie {
        GridTie::new(&GridConfig::default(), 0.25)
    }

    fn feasible_action() -> PhysicalAction {
        PhysicalAction {
            battery_kw: 10.0,
            grid_kw: 20.0,
            ev_charge_kw: 0.0,
            curtailment_frac: 0.0,
        }
    }

    #[test]
    fn feasible_action_passes_unchanged() {
        let sup = supervisor();
        let (safe, record, penalty) =
            sup.check_and_clip(&feasible_action(), &battery_at(0.5), &empty_fleet(), &grid());
        assert_eq!(safe, feasible_action());
        assert!(record.is_empty());
        assert_eq!(penalty, 0.0);
    }

    #[test]
    fn full_battery_rejects_further_charge_as_soc_ceiling() {
        let sup = supervisor();
        let battery = battery_at(0.9);
        let raw = PhysicalAction {
            battery_kw: battery.max_charge_kw,
            ..feasible_action()
        };
        let (safe, record, penalty) =
            sup.check_and_clip(&raw, &battery, &empty_fleet(), &grid());

        assert!(safe.battery_kw <= 0.0, "no further charge at the ceiling");
        assert_eq!(record.len(), 1);
        assert_eq!(record.entries[0].kind, ViolationKind::BatterySocCeiling);
        assert_eq!(record.entries[0].asset, AssetId::Battery);
        assert_eq!(penalty, SafetyConfig::default().penalty_battery_soc);
    }

    #[test]
    fn empty_battery_rejects_discharge_as_soc_floor() {
        let sup = supervisor();
        let battery = battery_at(0.1);
        let raw = PhysicalAction {
            battery_kw: -battery.max_discharge_kw,
            ..feasible_action()
        };
        let (safe, record, _) = sup.check_and_clip(&raw, &battery, &empty_fleet(), &grid());
        assert!(safe.battery_kw >= 0.0);
        assert_eq!(record.entries[0].kind, ViolationKind::BatterySocFloor);
    }

    #[test]
    fn overrated_charge_at_mid_soc_is_a_rate_violation() {
        let sup = supervisor();
        let battery = battery_at(0.5);
        let raw = PhysicalAction {
            battery_kw: battery.max_charge_kw * 2.0,
            ..feasible_action()
        };
        let (safe, record, _) = sup.check_and_clip(&raw, &battery, &empty_fleet(), &grid());
        assert_eq!(safe.battery_kw, battery.max_charge_kw);
        assert_eq!(record.entries[0].kind, ViolationKind::BatteryChargeRate);
    }

    #[test]
    fn grid_import_clips_exactly_to_limit() {
        let sup = supervisor();
        let g = grid();
        let raw = PhysicalAction {
            grid_kw: 1.5 * g.max_import_kw(),
            ..feasible_action()
        };
        let (safe, record, penalty) =
            sup.check_and_clip(&raw, &battery_at(0.5), &empty_fleet(), &g);
        assert_eq!(safe.grid_kw, g.max_import_kw());
        assert_eq!(record.len(), 1);
        assert_eq!(record.entries[0].kind, ViolationKind::GridImportLimit);
        assert_eq!(penalty, SafetyConfig::default().penalty_grid_limit);
    }

    #[test]
    fn ev_charge_with_no_sessions_clips_to_zero() {
        let sup = supervisor();
        let raw = PhysicalAction {
            ev_charge_kw: 20.0,
            ..feasible_action()
        };
        let (safe, record, _) =
            sup.check_and_clip(&raw, &battery_at(0.5), &empty_fleet(), &grid());
        assert_eq!(safe.ev_charge_kw, 0.0);
        assert_eq!(record.entries[0].kind, ViolationKind::EvChargeLimit);
    }

    #[test]
    fn ev_charge_within_session_capacity_passes() {
        let sup = supervisor();
        let mut fleet = empty_fleet();
        fleet.admit(
            &[EvArrival {
                vehicle_id: 0,
                energy_kwh: 20.0,
                max_charge_kw: 11.0,
                dwell_steps: 10,
            }],
            0,
        );
        let raw = PhysicalAction {
            ev_charge_kw: 10.0,
            ..feasible_action()
        };
        let (safe, record, _) = sup.check_and_clip(&raw, &battery_at(0.5), &fleet, &grid());
        assert_eq!(safe.ev_charge_kw, 10.0);
        assert!(record.is_empty());
    }

    #[test]
    fn concurrent_violations_are_all_recorded() {
        let sup = supervisor();
        let g = grid();
        let raw = PhysicalAction {
            battery_kw: 500.0,
            grid_kw: 500.0,
            ev_charge_kw: 500.0,
            curtailment_frac: 2.0,
        };
        let (_, record, penalty) = sup.check_and_clip(&raw, &battery_at(0.5), &empty_fleet(), &g);
        assert_eq!(record.len(), 4, "one entry per clipped dimension");

        let expected: f32 = record.entries.iter().map(|v| sup.penalty_for(v.kind)).sum();
        assert_eq!(penalty, expected);
    }

    #[test]
    fn clip_within_tolerance_records_nothing() {
        let cfg = SafetyConfig {
            tolerance: 0.5,
            ..SafetyConfig::default()
        };
        let sup = SafetySupervisor::new(&cfg);
        let g = grid();
        let raw = PhysicalAction {
            grid_kw: g.max_import_kw() + 0.4,
            ..feasible_action()
        };
        let (safe, record, penalty) =
            sup.check_and_clip(&raw, &battery_at(0.5), &empty_fleet(), &g);
        assert_eq!(safe.grid_kw, g.max_import_kw());
        assert!(record.is_empty());
        assert_eq!(penalty, 0.0);
    }

    #[test]
    fn identical_inputs_give_identical_outputs() {
        let sup = supervisor();
        let battery = battery_at(0.42);
        let raw = PhysicalAction {
            battery_kw: 90.0,
            grid_kw: -70.0,
            ev_charge_kw: 3.0,
            curtailment_frac: 0.3,
        };
        let a = sup.check_and_clip(&raw, &battery, &empty_fleet(), &grid());
        let b = sup.check_and_clip(&raw, &battery, &empty_fleet(), &grid());
        assert_eq!(a.0, b.0);
        assert_eq!(a.2, b.2);
        assert_eq!(a.1.len(), b.1.len());
    }

    #[test]
    fn curtailment_below_zero_is_clipped_and_recorded() {
        let sup = supervisor();
        let raw = PhysicalAction {
            curtailment_frac: -0.5,
            ..feasible_action()
        };
        let (safe, record, _) =
            sup.check_and_clip(&raw, &battery_at(0.5), &empty_fleet(), &grid());
        assert_eq!(safe.curtailment_frac, 0.0);
        assert_eq!(record.entries[0].kind, ViolationKind::CurtailmentRange);
        assert_eq!(record.entries[0].asset, AssetId::Renewable);
    }

    #[test]
    fn scenario_config_penalties_flow_through() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.safety.penalty_grid_limit = 9.0;
        let sup = SafetySupervisor::new(&cfg.safety);
        assert_eq!(sup.penalty_for(ViolationKind::GridImportLimit), 9.0);
    }
}
