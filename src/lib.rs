//! Align irregular, multi-source measurement streams (CGM, insulin, meals,
//! activity, heart rate, ...) onto a fixed-minute grid and join them into one
//! table keyed by grid timestamp.

pub mod align;
pub mod config;
pub mod data;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod series;

pub use error::AlignError;
