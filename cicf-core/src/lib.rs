pub mod assemble;
pub mod compare;
pub mod counterfactual;
pub mod engine;
pub mod errors;
pub mod interpolate;
pub mod normalize;
pub mod standard_variables;
pub mod timeseries;
pub mod units;
mod validation;
