mod command;
mod document;
mod engine;
mod html;
mod normalize;
mod ops;
mod selection;
mod value;

pub use crate::command::*;
pub use crate::document::*;
pub use crate::engine::{EditorConfig, EditorEngine};
pub use crate::html::{create_empty_document, document_from_html, document_to_html};
pub use crate::ops::Applied;
pub use crate::selection::*;
pub use crate::value::*;
