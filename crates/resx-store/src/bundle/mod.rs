//! Transaction bundle files
//!
//! Two layouts are accepted, in YAML or JSON:
//! - the plain `entries:` layout (`format`), one mutation per entry
//! - a FHIR-style `Bundle` with `entry[].request`

pub mod format;
pub mod parser;

pub use parser::{parse_bundle_file, parse_bundle_str};
