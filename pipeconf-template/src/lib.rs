pub mod grammar;
pub mod parser;
pub mod render;
pub mod set;

pub use parser::{parse_template, FieldPath, Segment, Template};
pub use render::render;
pub use set::TemplateSet;
