//! Spectral colorimetry for print colour management.
//!
//! * [`colorimetry`] – ASTM E308 weighting tables, spectral → Lab, LCh, ΔE
//! * [`adapt`] – moving a tint ramp from one substrate to another
//! * [`cgats`] – reading and writing CGATS measurement files
//! * [`data`] – core types and file loaders

pub mod adapt;
pub mod cgats;
pub mod colorimetry;
pub mod config;
pub mod data;
pub mod error;
