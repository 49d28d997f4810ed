//! Physical asset models for the microgrid.

/// Stationary battery storage with aging and thermal state.
pub mod battery;
/// EV charging fleet with session lifecycle management.
pub mod ev_fleet;
/// Grid interconnection with time-of-use tariffs and emissions.
pub mod grid;
/// Aggregated solar and wind generation with curtailment.
pub mod renewable;

// Re-export the main types for convenience
pub use battery::Battery;
pub use ev_fleet::EvFleet;
pub use grid::GridTie;
pub use renewable::Renewable;

use std::fmt;

/// Closed, tagged set of asset identities.
///
/// Every violation, alert, and health index is attributed to exactly one
/// of these; there is no open-ended device registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetId {
    /// Stationary battery storage.
    Battery,
    /// EV charging fleet.
    EvFleet,
    /// Grid interconnection.
    Grid,
    /// Aggregated renewable generation.
    Renewable,
}

impl AssetId {
    /// All asset identities in display order.
    pub const ALL: [AssetId; 4] = [
        AssetId::Battery,
        AssetId::EvFleet,
        AssetId::Grid,
        AssetId::Renewable,
    ];
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetId::Battery => "battery",
            AssetId::EvFleet => "ev_fleet",
            AssetId::Grid => "grid",
            AssetId::Renewable => "renewable",
        };
        write!(f, "{name}")
    }
}
