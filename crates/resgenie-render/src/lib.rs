//! HTML rendering for bound resume documents.

mod error;
mod html;

pub use error::RenderError;
pub use html::{
    escape_attribute, escape_html, render, HtmlDocument, RenderOptions, DEFAULT_STYLESHEET,
};
