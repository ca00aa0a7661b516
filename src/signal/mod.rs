//! Channel selection for physical links.

pub mod range_model;
pub mod resolver;

pub use range_model::{
    AdditiveRangeModel, ConfiguredRangeModel, PathLossParameters, PathLossRangeModel, RangeModel, ScaledMinRangeModel, StandardRangeModel,
};
pub use resolver::LinkColorResolver;
