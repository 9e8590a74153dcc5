//! Pure computation core: scoring, classification, planning and simulation.
//!
//! Nothing here performs I/O. Degraded inputs produce neutral results rather
//! than errors; `error` only covers the loading and configuration surface.

pub mod bar;
pub mod series;
pub mod score;
pub mod pivot;
pub mod divergence;
pub mod patterns;
pub mod chips;
pub mod factor;
pub mod scorer;
pub mod scenario;
pub mod action_plan;
pub mod checklist;
pub mod backtest;
pub mod optimizer;
pub mod analysis;
pub mod config;
pub mod error;
