//! Dashboard views

pub mod result;
pub mod source;

pub use result::{render_result_view, ResultAction};
pub use source::render_source_view;
