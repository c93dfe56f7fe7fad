//! Data transformation nodes

pub mod aggregate;
pub mod csv;
pub mod filter;
pub mod find_replace;
pub mod json;
pub mod merge;
pub mod transform;

pub use aggregate::AggregateNode;
pub use csv::CsvNode;
pub use filter::FilterNode;
pub use find_replace::FindReplaceNode;
pub use json::JsonNode;
pub use merge::MergeNode;
pub use transform::TransformNode;
