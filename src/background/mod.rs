pub mod loads;

pub use loads::{LoadOutcome, LoadRequest, PhotoLoadQueue};
