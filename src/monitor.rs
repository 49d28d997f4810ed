//! Health and anomaly monitoring over rolling per-asset statistics.
//!
//! Strictly observability: the monitor watches measurements the
//! environment hands it and emits alerts, but has no path back into
//! actions, rewards, or asset state. Duplicate alerts for a condition
//! that is still active are suppressed until the condition clears.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::assets::AssetId;
use crate::config::MonitorConfig;

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational.
    Info,
    /// Degraded but operable.
    Warning,
    /// Requires intervention.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        write!(f, "{name}")
    }
}

/// Threshold condition an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    /// Battery cell temperature above the configured maximum.
    BatteryOverTemperature,
    /// Battery state of health below the configured floor.
    BatteryHealthLow,
    /// PV performance ratio below minimum for N consecutive steps.
    PvUnderperformance,
    /// Mean violations per step above the configured ceiling.
    FrequentViolations,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertKind::BatteryOverTemperature => "battery_over_temperature",
            AlertKind::BatteryHealthLow => "battery_health_low",
            AlertKind::PvUnderperformance => "pv_underperformance",
            AlertKind::FrequentViolations => "frequent_violations",
        };
        write!(f, "{name}")
    }
}

/// One emitted alert. Append-only and timestamped by step index.
#[derive(Debug, Clone)]
pub struct Alert {
    /// Step the condition was first detected.
    pub step: usize,
    /// Alert severity.
    pub severity: Severity,
    /// Asset the condition is attributed to.
    pub component: AssetId,
    /// Threshold condition.
    pub kind: AlertKind,
    /// Human-readable description with the measured value.
    pub description: String,
    /// Suggested operator response.
    pub recommended_action: &'static str,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] step {} {} / {}: {} — {}",
            self.severity, self.step, self.component, self.kind, self.description,
            self.recommended_action
        )
    }
}

/// Fixed-capacity rolling window of measurements.
#[derive(Debug, Clone)]
struct RollingWindow {
    cap: usize,
    values: VecDeque<f32>,
}

impl RollingWindow {
    fn new(cap: usize) -> Self {
        assert!(cap > 0, "window capacity must be > 0");
        Self {
            cap,
            values: VecDeque::new(),
        }
    }

    fn push(&mut self, value: f32) {
        self.values.push_back(value);
        if self.values.len() > self.cap {
            self.values.pop_front();
        }
    }

    fn mean(&self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f32>() / self.values.len() as f32
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

/// Per-step measurements the environment hands the monitor.
#[derive(Debug, Clone, Copy)]
pub struct MonitorSample {
    /// Battery cell temperature (°C).
    pub battery_temp_c: f32,
    /// Battery state of health.
    pub battery_soh: f32,
    /// PV performance ratio, `None` outside daylight.
    pub pv_ratio: Option<f32>,
    /// Violations recorded this step.
    pub violation_count: usize,
    /// Sessions retired satisfied so far this episode.
    pub sessions_completed: usize,
    /// Sessions retired unmet so far this episode.
    pub sessions_unmet: usize,
}

/// Read-only health snapshot.
#[derive(Debug, Clone)]
pub struct HealthSummary {
    /// Mean of the per-component indices (0.0–1.0).
    pub overall_health: f32,
    /// Per-component health index (0.0–1.0) in [`AssetId::ALL`] order.
    pub component_health: Vec<(AssetId, f32)>,
    /// Conditions currently active.
    pub active_alert_count: usize,
    /// Alerts emitted over the episode.
    pub total_alert_count: usize,
}

/// Rolling-statistics health monitor with threshold alerts.
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    config: MonitorConfig,
    temp: RollingWindow,
    soh: RollingWindow,
    pv_ratio: RollingWindow,
    violations: RollingWindow,
    pv_low_run: usize,
    last_sample: Option<MonitorSample>,
    alerts: Vec<Alert>,
    active: HashMap<(AssetId, AlertKind), usize>,
}

impl HealthMonitor {
    /// Creates a monitor from validated configuration.
    pub fn new(config: &MonitorConfig) -> Self {
        let cap = config.window_steps;
        Self {
            config: config.clone(),
            temp: RollingWindow::new(cap),
            soh: RollingWindow::new(cap),
            pv_ratio: RollingWindow::new(cap),
            violations: RollingWindow::new(cap),
            pv_low_run: 0,
            last_sample: None,
            alerts: Vec::new(),
            active: HashMap::new(),
        }
    }

    /// Clears all windows and active conditions (episode start). Emitted
    /// alerts are dropped with the episode.
    pub fn reset(&mut self) {
        self.temp.clear();
        self.soh.clear();
        self.pv_ratio.clear();
        self.violations.clear();
        self.pv_low_run = 0;
        self.last_sample = None;
        self.alerts.clear();
        self.active.clear();
    }

    /// Ingests one step of measurements and re-evaluates all conditions.
    pub fn update(&mut self, step: usize, sample: MonitorSample) {
        self.temp.push(sample.battery_temp_c);
        self.soh.push(sample.battery_soh);
        self.violations.push(sample.violation_count as f32);

        match sample.pv_ratio {
            Some(r) => {
                self.pv_ratio.push(r);
                if r < self.config.pv_ratio_min {
                    self.pv_low_run += 1;
                } else {
                    self.pv_low_run = 0;
                }
            }
            // Outside daylight the condition is unobservable; restart the run.
            None => self.pv_low_run = 0,
        }
        self.last_sample = Some(sample);

        self.evaluate(
            step,
            AssetId::Battery,
            AlertKind::BatteryOverTemperature,
            Severity::Critical,
            sample.battery_temp_c > self.config.battery_temp_max_c,
            format!(
                "cell temperature {:.1} °C above limit {:.1} °C",
                sample.battery_temp_c, self.config.battery_temp_max_c
            ),
            "reduce battery power until the cell cools",
        );

        self.evaluate(
            step,
            AssetId::Battery,
            AlertKind::BatteryHealthLow,
            Severity::Warning,
            sample.battery_soh < self.config.soh_alert_min,
            format!(
                "state of health {:.3} below floor {:.3}",
                sample.battery_soh, self.config.soh_alert_min
            ),
            "schedule battery replacement",
        );

        self.evaluate(
            step,
            AssetId::Renewable,
            AlertKind::PvUnderperformance,
            Severity::Warning,
            self.pv_low_run >= self.config.pv_low_steps,
            format!(
                "PV performance ratio below {:.2} for {} consecutive steps",
                self.config.pv_ratio_min, self.pv_low_run
            ),
            "inspect the array for soiling or shading",
        );

        self.evaluate(
            step,
            AssetId::Grid,
            AlertKind::FrequentViolations,
            Severity::Warning,
            self.violations.mean() > self.config.violation_rate_max,
            format!(
                "mean {:.2} violations/step over the window",
                self.violations.mean()
            ),
            "review the controlling policy's action ranges",
        );
    }

    #[expect(clippy::too_many_arguments)]
    fn evaluate(
        &mut self,
        step: usize,
        component: AssetId,
        kind: AlertKind,
        severity: Severity,
        active_now: bool,
        description: String,
        recommended_action: &'static str,
    ) {
        let key = (component, kind);
        if active_now {
            if !self.active.contains_key(&key) {
                self.alerts.push(Alert {
                    step,
                    severity,
                    component,
                    kind,
                    description,
                    recommended_action,
                });
                self.active.insert(key, self.alerts.len() - 1);
            }
        } else {
            self.active.remove(&key);
        }
    }

    /// Alerts whose condition is still active.
    pub fn active_alerts(&self) -> Vec<Alert> {
        let mut indices: Vec<usize> = self.active.values().copied().collect();
        indices.sort_unstable();
        indices.iter().map(|&i| self.alerts[i].clone()).collect()
    }

    /// Every alert emitted this episode, in emission order.
    pub fn all_alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Computes the read-only health snapshot.
    pub fn health_summary(&self) -> HealthSummary {
        let sample = self.last_sample;

        let battery = sample
            .map(|s| {
                let over_c = (s.battery_temp_c - self.config.battery_temp_max_c).max(0.0);
                let temp_factor = (1.0 - over_c / 20.0).clamp(0.0, 1.0);
                (s.battery_soh * temp_factor).clamp(0.0, 1.0)
            })
            .unwrap_or(1.0);

        let renewable = if self.pv_ratio.values.is_empty() {
            1.0
        } else {
            self.pv_ratio.mean().clamp(0.0, 1.0)
        };

        let ev_fleet = sample
            .map(|s| {
                let total = s.sessions_completed + s.sessions_unmet;
                if total == 0 {
                    1.0
                } else {
                    s.sessions_completed as f32 / total as f32
                }
            })
            .unwrap_or(1.0);

        let grid = (1.0 - self.violations.mean() / 4.0).clamp(0.0, 1.0);

        let component_health = vec![
            (AssetId::Battery, battery),
            (AssetId::EvFleet, ev_fleet),
            (AssetId::Grid, grid),
            (AssetId::Renewable, renewable),
        ];
        let overall_health = component_health.iter().map(|(_, h)| h).sum::<f32>()
            / component_health.len() as f32;

        HealthSummary {
            overall_health,
            component_health,
            active_alert_count: self.active.len(),
            total_alert_count: self.alerts.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;

    fn monitor() -> HealthMonitor {
        HealthMonitor::new(&MonitorConfig::default())
    }

    fn healthy_sample() -> MonitorSample {
        MonitorSample {
            battery_temp_c: 25.0,
            battery_soh: 1.0,
            pv_ratio: Some(0.95),
            violation_count: 0,
            sessions_completed: 0,
            sessions_unmet: 0,
        }
    }

    #[test]
    fn fresh_monitor_reports_full_health() {
        let m = monitor();
        let s = m.health_summary();
        assert_eq!(s.overall_health, 1.0);
        assert_eq!(s.active_alert_count, 0);
        assert_eq!(s.total_alert_count, 0);
    }

    #[test]
    fn over_temperature_raises_critical_alert() {
        let mut m = monitor();
        m.update(
            5,
            MonitorSample {
                battery_temp_c: 50.0,
                ..healthy_sample()
            },
        );
        let active = m.active_alerts();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].kind, AlertKind::BatteryOverTemperature);
        assert_eq!(active[0].severity, Severity::Critical);
        assert_eq!(active[0].step, 5);
        assert_eq!(active[0].component, AssetId::Battery);
    }

    #[test]
    fn duplicate_alerts_suppressed_while_active() {
        let mut m = monitor();
        for step in 0..10 {
            m.update(
                step,
                MonitorSample {
                    battery_temp_c: 50.0,
                    ..healthy_sample()
                },
            );
        }
        assert_eq!(m.all_alerts().len(), 1);
    }

    #[test]
    fn cleared_condition_can_fire_again() {
        let mut m = monitor();
        let hot = MonitorSample {
            battery_temp_c: 50.0,
            ..healthy_sample()
        };
        m.update(0, hot);
        m.update(1, healthy_sample());
        assert!(m.active_alerts().is_empty());
        m.update(2, hot);
        assert_eq!(m.all_alerts().len(), 2);
        assert_eq!(m.active_alerts().len(), 1);
    }

    #[test]
    fn pv_alert_requires_consecutive_low_steps() {
        let mut m = monitor();
        let low = MonitorSample {
            pv_ratio: Some(0.3),
            ..healthy_sample()
        };
        for step in 0..7 {
            m.update(step, low);
        }
        assert!(m.active_alerts().is_empty(), "7 of 8 required steps");
        m.update(7, low);
        let active = m.active_alerts();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].kind, AlertKind::PvUnderperformance);
    }

    #[test]
    fn night_gap_restarts_pv_run() {
        let mut m = monitor();
        let low = MonitorSample {
            pv_ratio: Some(0.3),
            ..healthy_sample()
        };
        let night = MonitorSample {
            pv_ratio: None,
            ..healthy_sample()
        };
        for step in 0..7 {
            m.update(step, low);
        }
        m.update(7, night);
        m.update(8, low);
        assert!(m.active_alerts().is_empty());
    }

    #[test]
    fn sustained_violations_raise_grid_alert() {
        let mut m = monitor();
        for step in 0..16 {
            m.update(
                step,
                MonitorSample {
                    violation_count: 2,
                    ..healthy_sample()
                },
            );
        }
        assert!(
            m.active_alerts()
                .iter()
                .any(|a| a.kind == AlertKind::FrequentViolations)
        );
    }

    #[test]
    fn unmet_sessions_lower_fleet_health() {
        let mut m = monitor();
        m.update(
            0,
            MonitorSample {
                sessions_completed: 1,
                sessions_unmet: 3,
                ..healthy_sample()
            },
        );
        let s = m.health_summary();
        let fleet = s
            .component_health
            .iter()
            .find(|(c, _)| *c == AssetId::EvFleet)
            .map(|(_, h)| *h);
        assert_eq!(fleet, Some(0.25));
        assert!(s.overall_health < 1.0);
    }

    #[test]
    fn reset_clears_alerts_and_windows() {
        let mut m = monitor();
        m.update(
            0,
            MonitorSample {
                battery_temp_c: 50.0,
                ..healthy_sample()
            },
        );
        m.reset();
        assert!(m.all_alerts().is_empty());
        assert!(m.active_alerts().is_empty());
        assert_eq!(m.health_summary().overall_health, 1.0);
    }
}
