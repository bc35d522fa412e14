// scry-common -- shared data types for the scry console pipeline.

pub mod error;
pub mod settings;
pub mod span;
pub mod token;
pub mod value;
pub mod vars;
