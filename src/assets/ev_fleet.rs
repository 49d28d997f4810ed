use crate::config::EvFleetConfig;
use crate::exogenous::EvArrival;

/// One active charging session.
///
/// Created when an exogenous arrival event fires, mutated every step
/// charging power is allocated to it, and retired when its deadline is
/// reached or its energy requirement is met — whichever comes first.
#[derive(Debug, Clone)]
pub struct EvSession {
    /// Stable vehicle identifier from the arrival event.
    pub vehicle_id: u32,
    /// Step the session was admitted.
    pub arrival_step: usize,
    /// Step the vehicle departs (exclusive; no charging at or after it).
    pub deadline_step: usize,
    /// Energy the session must receive (kWh).
    pub required_kwh: f32,
    /// Energy delivered so far (kWh).
    pub delivered_kwh: f32,
    /// Per-session charger rating (kW).
    pub max_charge_kw: f32,
}

impl EvSession {
    /// Energy still owed to this session (kWh, >= 0).
    pub fn remaining_kwh(&self) -> f32 {
        (self.required_kwh - self.delivered_kwh).max(0.0)
    }
}

/// Retirement record for a session that ended this step.
#[derive(Debug, Clone, Copy)]
pub struct SessionClose {
    /// Vehicle whose session ended.
    pub vehicle_id: u32,
    /// `true` when the energy requirement was met before departure.
    pub satisfied: bool,
    /// Energy still owed at departure (kWh; 0 when satisfied).
    pub unmet_kwh: f32,
}

/// Realized fleet quantities for one step.
#[derive(Debug, Clone, Default)]
pub struct FleetOutcome {
    /// Aggregate charging power actually drawn (kW, >= 0).
    pub charge_kw: f32,
    /// Sessions retired this step.
    pub closed: Vec<SessionClose>,
    /// Sessions retired this step with unmet energy.
    pub unmet_sessions: usize,
    /// Total energy owed by sessions retired unmet this step (kWh).
    pub unmet_kwh: f32,
}

/// Compact fleet state for observations and reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct FleetSummary {
    /// Number of currently connected sessions.
    pub active_sessions: usize,
    /// Total energy owed across active sessions (kWh).
    pub remaining_kwh: f32,
    /// Deadline-aware power the fleet asks for right now (kW).
    pub requested_kw: f32,
    /// Steps until the tightest active deadline (0 when none active).
    pub min_slack_steps: f32,
}

/// The EV charging fleet.
///
/// Allocates a commanded aggregate charging power across active sessions
/// earliest-deadline-first with deterministic tie-breaking (arrival step,
/// then vehicle id). Arrivals come only from the exogenous feed.
#[derive(Debug, Clone)]
pub struct EvFleet {
    /// Aggregate charging power limit across all bays (kW).
    pub max_total_kw: f32,

    /// Sessions retired satisfied over the episode so far.
    pub sessions_completed: usize,

    /// Sessions retired with unmet energy over the episode so far.
    pub sessions_unmet: usize,

    sessions: Vec<EvSession>,
    dt_hours: f32,
}

impl EvFleet {
    /// Creates an empty fleet from validated configuration.
    ///
    /// # Panics
    ///
    /// Panics if `dt_hours` is not positive.
    pub fn new(config: &EvFleetConfig, dt_hours: f32) -> Self {
        assert!(dt_hours > 0.0, "dt_hours must be > 0");
        Self {
            max_total_kw: config.max_total_kw.max(0.0),
            sessions_completed: 0,
            sessions_unmet: 0,
            sessions: Vec::new(),
            dt_hours,
        }
    }

    /// Admits arrival events firing at `step`.
    ///
    /// Must be called before the safety supervisor inspects the fleet so
    /// the charging range reflects the vehicles actually present.
    pub fn admit(&mut self, arrivals: &[EvArrival], step: usize) {
        for a in arrivals {
            self.sessions.push(EvSession {
                vehicle_id: a.vehicle_id,
                arrival_step: step,
                deadline_step: step + a.dwell_steps,
                required_kwh: a.energy_kwh.max(0.0),
                delivered_kwh: 0.0,
                max_charge_kw: a.max_charge_kw.max(0.0),
            });
        }
        // EDF order with deterministic tie-break.
        self.sessions.sort_by(|a, b| {
            (a.deadline_step, a.arrival_step, a.vehicle_id)
                .cmp(&(b.deadline_step, b.arrival_step, b.vehicle_id))
        });
    }

    /// Power one session can absorb this step (kW).
    fn session_cap_kw(&self, s: &EvSession) -> f32 {
        s.max_charge_kw.min(s.remaining_kwh() / self.dt_hours)
    }

    /// Currently valid aggregate charging upper bound (kW).
    ///
    /// Zero when no session is connected: any positive command is then
    /// infeasible and gets clipped by the supervisor.
    pub fn charge_limit_kw(&self) -> f32 {
        let session_sum: f32 = self.sessions.iter().map(|s| self.session_cap_kw(s)).sum();
        self.max_total_kw.min(session_sum)
    }

    /// Deadline-aware power the fleet asks for at `step` (kW).
    ///
    /// Each session requests the minimum rate that still meets its
    /// remaining energy by its deadline, capped at its charger rating.
    pub fn requested_kw(&self, step: usize) -> f32 {
        self.sessions
            .iter()
            .map(|s| {
                let slack_steps = s.deadline_step.saturating_sub(step);
                if slack_steps == 0 {
                    return 0.0;
                }
                let needed = s.remaining_kwh() / (slack_steps as f32 * self.dt_hours);
                needed.min(s.max_charge_kw).max(0.0)
            })
            .sum()
    }

    /// Compact state snapshot at `step`.
    pub fn summary(&self, step: usize) -> FleetSummary {
        let min_slack = self
            .sessions
            .iter()
            .map(|s| s.deadline_step.saturating_sub(step))
            .min()
            .unwrap_or(0);
        FleetSummary {
            active_sessions: self.sessions.len(),
            remaining_kwh: self.sessions.iter().map(EvSession::remaining_kwh).sum(),
            requested_kw: self.requested_kw(step),
            min_slack_steps: min_slack as f32,
        }
    }

    /// Active sessions in allocation order.
    pub fn sessions(&self) -> &[EvSession] {
        &self.sessions
    }

    /// Allocates the (already safety-clipped) aggregate power and retires
    /// finished sessions.
    ///
    /// Allocation is earliest-deadline-first: each session in order takes
    /// the lesser of its charger rating, its remaining energy, and the
    /// remaining budget. Sessions whose deadline elapses with unmet energy
    /// are counted and reported; sessions that reach their requirement are
    /// retired satisfied.
    pub fn advance(&mut self, total_kw: f32, step: usize) -> FleetOutcome {
        let mut budget_kw = total_kw.max(0.0).min(self.charge_limit_kw());
        let mut charge_kw = 0.0;

        for s in &mut self.sessions {
            if budget_kw <= 0.0 {
                break;
            }
            let cap = s.max_charge_kw.min(s.remaining_kwh() / self.dt_hours);
            let alloc = budget_kw.min(cap).max(0.0);
            s.delivered_kwh += alloc * self.dt_hours;
            budget_kw -= alloc;
            charge_kw += alloc;
        }

        let dep_tolerance_kwh = 1e-4;
        let mut closed = Vec::new();
        let mut unmet_sessions = 0;
        let mut unmet_kwh = 0.0;
        self.sessions.retain(|s| {
            let complete = s.remaining_kwh() <= dep_tolerance_kwh;
            let departed = step + 1 >= s.deadline_step;
            if complete {
                closed.push(SessionClose {
                    vehicle_id: s.vehicle_id,
                    satisfied: true,
                    unmet_kwh: 0.0,
                });
                return false;
            }
            if departed {
                let owed = s.remaining_kwh();
                closed.push(SessionClose {
                    vehicle_id: s.vehicle_id,
                    satisfied: false,
                    unmet_kwh: owed,
                });
                unmet_sessions += 1;
                unmet_kwh += owed;
                return false;
            }
            true
        });

        self.sessions_completed += closed.iter().filter(|c| c.satisfied).count();
        self.sessions_unmet += unmet_sessions;

        FleetOutcome {
            charge_kw,
            closed,
            unmet_sessions,
            unmet_kwh,
        }
    }
}
