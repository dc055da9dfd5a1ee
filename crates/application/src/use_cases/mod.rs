//! Application use cases (resolution orchestration).

mod evaluate_value;
mod process_request;

pub use evaluate_value::*;
pub use process_request::*;
