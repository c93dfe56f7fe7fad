//! Source nodes

pub mod text;

pub use text::TextNode;
