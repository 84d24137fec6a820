//! Resume templates.
//!
//! A template is Markdown with `{{key}}` placeholders and block tags:
//!
//! * `{{#collection}} … {{/collection}}` repeats its body for each element of
//!   `sections`, `section.entries`, `entry.bullets`, `entry.details`,
//!   `contact.links` or `skills`.
//! * `{{#field}} … {{/field}}` renders its body once when an optional field
//!   (`contact.phone`, `summary`, `entry.organization`, …) is present.
//! * `{{?key}} … {{/key}}` renders its body once when a collection is
//!   non-empty or an optional field is present.
//!
//! A block tag alone on its line consumes the whole line. Binding a
//! [`Template`] to a [`Resume`](resgenie_schema::Resume) yields the Markdown
//! text and its [`DocumentTree`].

mod bind;
mod builtin;
mod error;
mod escape;
mod parse;
mod placeholder;
pub mod tree;

pub use bind::{bind, BindOptions, BoundDocument};
pub use builtin::{builtin, builtin_names, builtin_source};
pub use error::TemplateError;
pub use escape::escape_markdown;
pub use parse::Template;
pub use placeholder::{Collection, Placeholder, Scope};
pub use tree::DocumentTree;
