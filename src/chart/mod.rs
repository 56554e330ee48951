//! Chart specifications: the wire form produced by the model and the typed,
//! validated form the renderer consumes.

pub mod demo;
pub mod spec;

pub use demo::*;
pub use spec::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Unsupported chart type: {0}")]
    UnsupportedChartType(String),

    #[error("Chart type '{chart_type}' requires data key '{key}'")]
    MissingKey {
        chart_type: &'static str,
        key: &'static str,
    },

    #[error("Invalid field '{key}': {reason}")]
    InvalidField { key: String, reason: String },
}
