use std::fmt;

use crate::config::GridConfig;

/// Time-of-use tariff band, selected by a fixed calendar rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouBand {
    /// Overnight band.
    OffPeak,
    /// Shoulder band.
    Base,
    /// Evening peak band.
    Peak,
}

impl TouBand {
    /// Band for an hour of day under the configured calendar rule.
    ///
    /// Off-peak overnight, peak in the configured evening window, base
    /// everywhere else. The rule is fixed configuration, never learned.
    pub fn for_hour(config: &GridConfig, hour: f32) -> Self {
        let hour = hour.rem_euclid(24.0);
        if hour < config.offpeak_end_hour || hour >= config.offpeak_start_hour {
            TouBand::OffPeak
        } else if (config.peak_start_hour..config.peak_end_hour).contains(&hour) {
            TouBand::Peak
        } else {
            TouBand::Base
        }
    }

    /// Grid emission intensity for this band (kg CO2 per kWh imported).
    pub fn emission_kg_per_kwh(&self, config: &GridConfig) -> f32 {
        match self {
            TouBand::OffPeak => config.emission_offpeak_kg_per_kwh,
            TouBand::Base => config.emission_base_kg_per_kwh,
            TouBand::Peak => config.emission_peak_kg_per_kwh,
        }
    }
}

impl fmt::Display for TouBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TouBand::OffPeak => "off-peak",
            TouBand::Base => "base",
            TouBand::Peak => "peak",
        };
        write!(f, "{name}")
    }
}

/// Grid interconnection point.
///
/// Realized exchange equals the safety-clipped grid command; the model
/// only prices it and attributes emissions by tariff band.
///
/// # Power Convention
/// - Positive power: import from the grid
/// - Negative power: export to the grid
#[derive(Debug, Clone)]
pub struct GridTie {
    config: GridConfig,
    dt_hours: f32,
}

/// Realized grid quantities for one step.
#[derive(Debug, Clone, Copy)]
pub struct GridOutcome {
    /// Import power (kW, >= 0).
    pub import_kw: f32,
    /// Export power (kW, >= 0).
    pub export_kw: f32,
    /// Net energy cost: import spend minus export revenue.
    pub energy_cost: f32,
    /// Emissions from imported energy (kg CO2, >= 0).
    pub emissions_kg: f32,
}

impl GridTie {
    /// Creates the grid tie from validated configuration.
    ///
    /// # Panics
    ///
    /// Panics if `dt_hours` is not positive.
    pub fn new(config: &GridConfig, dt_hours: f32) -> Self {
        assert!(dt_hours > 0.0, "dt_hours must be > 0");
        Self {
            config: config.clone(),
            dt_hours,
        }
    }

    /// Maximum import power (kW).
    pub fn max_import_kw(&self) -> f32 {
        self.config.max_import_kw
    }

    /// Maximum export power (kW, positive magnitude).
    pub fn max_export_kw(&self) -> f32 {
        self.config.max_export_kw
    }

    /// Tariff band at the given hour of day.
    pub fn band_at(&self, hour: f32) -> TouBand {
        TouBand::for_hour(&self.config, hour)
    }

    /// Prices the (already safety-clipped) grid command for one step.
    ///
    /// Cost is import energy times the step tariff minus export energy
    /// times the export tariff (a fixed fraction of the import tariff);
    /// emissions are import energy times the band intensity.
    pub fn advance(&self, grid_kw: f32, price_per_kwh: f32, hour: f32) -> GridOutcome {
        let import_kw = grid_kw.max(0.0);
        let export_kw = (-grid_kw).max(0.0);

        let import_kwh = import_kw * self.dt_hours;
        let export_kwh = export_kw * self.dt_hours;
        let export_price = price_per_kwh * self.config.export_price_factor;
        let energy_cost = import_kwh * price_per_kwh - export_kwh * export_price;

        let band = self.band_at(hour);
        let emissions_kg = import_kwh * band.emission_kg_per_kwh(&self.config);

        GridOutcome {
            import_kw,
            export_kw,
            energy_cost,
            emissions_kg,
        }
    }
}
