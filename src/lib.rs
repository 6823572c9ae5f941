//! Charting core: technical indicators, freehand drawings and the session
//! that routes chart input between them.

pub mod chart;
pub mod config;
pub mod dataset;
pub mod drawing;
pub mod error;
pub mod indicator;
pub mod model;
pub mod registry;
pub mod session;
