//! Classification and validation results for the routing strategy.

pub mod classification;
pub mod validation;

pub use classification::{Classification, parse_classification};
pub use validation::{ValidationResult, parse_validation};
