//! Congested dynamic optimal transport on triangulated surfaces.
//!
//! Computes the time-dependent interpolation between two probability measures
//! on a surface that minimizes kinetic energy plus a quadratic congestion
//! penalty, using ADMM on a staggered space-time discretization.
//!
//! Pipeline: validate → build operators → factorize → iterate
//! {projection → prox → dual update → monitor}.

extern crate nalgebra as na;

pub mod config;
pub mod error;
pub mod field;
pub mod geodesic;
pub mod layout;
pub mod measure;
pub mod monitor;
pub mod operators;
pub mod projection;
pub mod prox;
pub mod state;

pub use config::SolverConfig;
pub use error::{GeodesicError, Stage};
pub use field::TimeCellField;
pub use geodesic::{geodesic, Geodesic, GeodesicSolver, Phase};
pub use measure::MeasureRole;
pub use monitor::Diagnostics;
