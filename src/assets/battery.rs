use crate::config::BatteryConfig;

/// A battery energy storage system with electrochemical aging.
///
/// Tracks state of charge, state of health, and cell temperature. The
/// power command passed to [`Battery::advance`] must already be
/// safety-clipped; the model integrates it with asymmetric charge and
/// discharge efficiencies and accrues aging from throughput,
/// depth-of-discharge stress, and temperature stress.
///
/// # Power Convention
/// - Positive power: charging (consumption)
/// - Negative power: discharging (generation)
#[derive(Debug, Clone)]
pub struct Battery {
    /// Nameplate capacity in kilowatt-hours.
    pub capacity_kwh: f32,

    /// Operational state-of-charge floor (fraction).
    pub soc_min: f32,

    /// Operational state-of-charge ceiling (fraction).
    pub soc_max: f32,

    /// Maximum charge power in kilowatts (positive value).
    pub max_charge_kw: f32,

    /// Maximum discharge power in kilowatts (positive value).
    pub max_discharge_kw: f32,

    /// Charging efficiency (0..1.0).
    pub eta_charge: f32,

    /// Discharging efficiency (0..1.0).
    pub eta_discharge: f32,

    /// State of charge as a fraction of usable capacity.
    pub soc: f32,

    /// State of health (fraction of nameplate capacity remaining).
    pub soh: f32,

    /// Cell temperature (°C).
    pub temperature_c: f32,

    /// Cumulative terminal throughput (kWh, charge plus discharge).
    pub throughput_kwh: f32,

    replacement_cost: f32,
    cycle_life: f32,
    dod_stress_factor: f32,
    temp_stress_ref_c: f32,
    temp_stress_factor: f32,
    thermal_alpha: f32,
    heating_c_at_rated: f32,
    dt_hours: f32,
}

/// Realized battery quantities for one step.
#[derive(Debug, Clone, Copy)]
pub struct BatteryOutcome {
    /// Power actually integrated (kW; positive = charge).
    pub power_kw: f32,
    /// State-of-health lost this step (fraction, >= 0).
    pub soh_loss: f32,
    /// Monetary value of the health lost this step (>= 0).
    pub degradation_cost: f32,
}

impl Battery {
    /// Creates a battery from validated configuration.
    ///
    /// # Panics
    ///
    /// Panics on contract breaches the scenario validation should have
    /// caught (non-positive capacity, inverted SoC bounds, invalid
    /// efficiencies).
    pub fn new(config: &BatteryConfig, dt_hours: f32) -> Self {
        assert!(config.capacity_kwh > 0.0, "capacity_kwh must be > 0");
        assert!(
            config.soc_min < config.soc_max,
            "soc_min must be < soc_max"
        );
        assert!(config.eta_charge > 0.0 && config.eta_charge <= 1.0);
        assert!(config.eta_discharge > 0.0 && config.eta_discharge <= 1.0);
        assert!(dt_hours > 0.0, "dt_hours must be > 0");

        Self {
            capacity_kwh: config.capacity_kwh,
            soc_min: config.soc_min,
            soc_max: config.soc_max,
            max_charge_kw: config.max_charge_kw,
            max_discharge_kw: config.max_discharge_kw,
            eta_charge: config.eta_charge,
            eta_discharge: config.eta_discharge,
            soc: config.initial_soc,
            soh: config.initial_soh,
            temperature_c: config.initial_temp_c,
            throughput_kwh: 0.0,
            replacement_cost: config.replacement_cost,
            cycle_life: config.cycle_life,
            dod_stress_factor: config.dod_stress_factor,
            temp_stress_ref_c: config.temp_stress_ref_c,
            temp_stress_factor: config.temp_stress_factor,
            thermal_alpha: config.thermal_alpha,
            heating_c_at_rated: config.heating_c_at_rated,
            dt_hours,
        }
    }

    /// Capacity currently usable at the present state of health (kWh).
    pub fn usable_capacity_kwh(&self) -> f32 {
        self.capacity_kwh * self.soh
    }

    /// Charge power the SoC headroom can absorb this step (kW).
    pub fn soc_charge_limit_kw(&self) -> f32 {
        let headroom_kwh = (self.soc_max - self.soc).max(0.0) * self.usable_capacity_kwh();
        headroom_kwh / (self.eta_charge * self.dt_hours)
    }

    /// Discharge power the SoC floor allows this step (kW, positive).
    pub fn soc_discharge_limit_kw(&self) -> f32 {
        let available_kwh = (self.soc - self.soc_min).max(0.0) * self.usable_capacity_kwh();
        available_kwh * self.eta_discharge / self.dt_hours
    }

    /// Currently valid charge limit: rated power and SoC headroom (kW).
    pub fn charge_limit_kw(&self) -> f32 {
        self.max_charge_kw.min(self.soc_charge_limit_kw()).max(0.0)
    }

    /// Currently valid discharge limit: rated power and SoC floor (kW, positive).
    pub fn discharge_limit_kw(&self) -> f32 {
        self.max_discharge_kw
            .min(self.soc_discharge_limit_kw())
            .max(0.0)
    }

    /// Equivalent full cycles accumulated so far.
    pub fn equivalent_cycles(&self) -> f32 {
        self.throughput_kwh / (2.0 * self.capacity_kwh)
    }

    /// Integrates one step of the (already safety-clipped) power command.
    ///
    /// Updates SoC with asymmetric efficiencies, advances the first-order
    /// thermal state toward ambient plus self-heating, and decrements SoH
    /// by cycle fade scaled with depth-of-discharge and temperature
    /// stress. SoH never increases; the returned degradation cost is
    /// never negative.
    ///
    /// # Panics
    ///
    /// Panics if any resulting state field is non-finite.
    pub fn advance(&mut self, power_kw: f32, ambient_temp_c: f32) -> BatteryOutcome {
        // Defensive clamp against float drift in the supervisor's clip.
        let power_kw = power_kw.clamp(-self.discharge_limit_kw(), self.charge_limit_kw());

        let usable = self.usable_capacity_kwh();
        let soc_before = self.soc;

        if power_kw > 0.0 {
            self.soc += power_kw * self.dt_hours * self.eta_charge / usable;
        } else if power_kw < 0.0 {
            self.soc += power_kw * self.dt_hours / (self.eta_discharge * usable);
        }
        self.soc = self.soc.clamp(self.soc_min, self.soc_max);

        let step_throughput_kwh = power_kw.abs() * self.dt_hours;
        self.throughput_kwh += step_throughput_kwh;

        // Thermal lag toward ambient, plus self-heating scaled by power fraction.
        let rated_kw = self.max_charge_kw.max(self.max_discharge_kw).max(1e-6);
        let heat_c = self.heating_c_at_rated * (power_kw.abs() / rated_kw);
        self.temperature_c += self.thermal_alpha * (ambient_temp_c - self.temperature_c) + heat_c;

        // Aging: cycle fade scaled by depth-of-discharge and temperature stress.
        let cycle_fade = step_throughput_kwh / (2.0 * self.capacity_kwh * self.cycle_life);
        let soc_mid = (soc_before + self.soc) * 0.5;
        let dod_stress = 1.0 + self.dod_stress_factor * (2.0 * (soc_mid - 0.5).abs());
        let temp_stress = 1.0
            + self.temp_stress_factor * (self.temperature_c - self.temp_stress_ref_c).max(0.0);
        let soh_loss = (cycle_fade * dod_stress * temp_stress).max(0.0);
        self.soh = (self.soh - soh_loss).max(0.0);

        assert!(
            self.soc.is_finite() && self.soh.is_finite() && self.temperature_c.is_finite(),
            "battery state became non-finite (soc={}, soh={}, temp={})",
            self.soc,
            self.soh,
            self.temperature_c
        );

        BatteryOutcome {
            power_kw,
            soh_loss,
            degradation_cost: soh_loss * self.replacement_cost,
        }
    }
}
