//! Parsing of structured model output.
//!
//! Tolerates transport wrapping (code fences, BOM, prose around the payload,
//! trailing commas). Content that is still not JSON is an error; schema
//! conformance is checked by the caller.

mod json_extract;

pub use json_extract::{JsonExtractor, extract_json_from_response};
