pub mod audit;
pub mod calc;
pub mod change;
pub mod config;
pub mod error;
pub mod factors;
pub mod field;
pub mod pipeline;
pub mod profile;
pub mod quota;
pub mod record;
pub mod results;
pub mod store;
pub mod types;
pub mod utils;
pub mod validation;

pub use error::{PipelineError, StoreError};
pub use pipeline::{Alert, ChangeOutcome, Pipeline};
