//! Workflow files.
//!
//! - `definition` -- JSON/YAML parsing, validation, and loading from disk

pub mod definition;

pub use definition::{
    DefinitionError, load_workflow_file, parse_workflow_json, parse_workflow_yaml,
    validate_definition,
};
