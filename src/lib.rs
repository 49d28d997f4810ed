//! Microgrid control environment for sequential decision-making agents.
//!
//! Models a small grid (solar, wind, battery, grid tie, EV chargers) as a
//! discrete-time environment stepped every 15 simulated minutes. Every
//! proposed control action passes through a safety supervisor before it can
//! touch physical state; each step yields a multi-objective reward with a
//! full per-term breakdown.

pub mod assets;
pub mod config;
/// Environment step controller, safety supervisor, and reward modules.
pub mod env;
pub mod exogenous;
pub mod monitor;
pub mod policy;
pub mod telemetry;
