//! Variable provider adapters

mod json_file;
mod static_provider;

pub use json_file::JsonFileVariableProvider;
pub use static_provider::StaticVariableProvider;
