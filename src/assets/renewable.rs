use crate::config::{SolarConfig, WindConfig};
use crate::exogenous::daylight_frac;

/// Aggregated renewable generation (solar plus wind) with curtailment.
///
/// Available power comes from the exogenous feed; the only control input
/// is the curtailment fraction. Curtailed energy is logged for reporting
/// and never enters a cost term.
#[derive(Debug, Clone)]
pub struct Renewable {
    /// Rated PV peak output (kW), used for performance-ratio monitoring.
    pub solar_kw_peak: f32,

    /// Rated wind output (kW).
    pub wind_kw_rated: f32,

    /// Cumulative curtailed energy over the episode (kWh).
    pub curtailed_kwh: f32,

    sunrise_hour: f32,
    sunset_hour: f32,
    dt_hours: f32,
}

/// Realized renewable quantities for one step.
#[derive(Debug, Clone, Copy)]
pub struct RenewableOutcome {
    /// Power delivered to the bus after curtailment (kW).
    pub generation_kw: f32,
    /// Power deliberately discarded (kW).
    pub curtailed_kw: f32,
}

impl Renewable {
    /// Creates the renewable aggregate from validated configuration.
    ///
    /// # Panics
    ///
    /// Panics if `dt_hours` is not positive.
    pub fn new(solar: &SolarConfig, wind: &WindConfig, dt_hours: f32) -> Self {
        assert!(dt_hours > 0.0, "dt_hours must be > 0");
        Self {
            solar_kw_peak: solar.kw_peak.max(0.0),
            wind_kw_rated: wind.kw_rated.max(0.0),
            curtailed_kwh: 0.0,
            sunrise_hour: solar.sunrise_hour,
            sunset_hour: solar.sunset_hour,
            dt_hours,
        }
    }

    /// Clear-sky PV expectation at the given hour of day (kW).
    pub fn expected_solar_kw(&self, hour: f32) -> f32 {
        self.solar_kw_peak * daylight_frac(hour, self.sunrise_hour, self.sunset_hour)
    }

    /// PV performance ratio: available over clear-sky expectation.
    ///
    /// Returns `None` outside daylight (expectation too small to compare
    /// against).
    pub fn performance_ratio(&self, available_solar_kw: f32, hour: f32) -> Option<f32> {
        let expected = self.expected_solar_kw(hour);
        if expected < 1e-3 {
            return None;
        }
        Some((available_solar_kw / expected).max(0.0))
    }

    /// Applies the (already safety-clipped) curtailment fraction to the
    /// available power and logs the discarded energy.
    pub fn advance(
        &mut self,
        curtailment_frac: f32,
        solar_kw: f32,
        wind_kw: f32,
    ) -> RenewableOutcome {
        let available_kw = (solar_kw + wind_kw).max(0.0);
        let frac = curtailment_frac.clamp(0.0, 1.0);
        let curtailed_kw = available_kw * frac;
        self.curtailed_kwh += curtailed_kw * self.dt_hours;

        RenewableOutcome {
            generation_kw: available_kw - curtailed_kw,
            curtailed_kw,
        }
    }
}
