//! Expression evaluator adapters

mod concat;

pub use concat::ConcatEvaluator;
