//! `mailweave_core` is the core library for the mailweave mail-merge
//! tool. It turns one markdown body with embedded named sub-templates
//! into personalized multipart e-mail messages.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Composite body (markdown + directives)
//!   → global template pass (minijinja, sender variables)
//!   → Stitcher (state machine: prose / subject line / template references)
//!   → canonical plain + HTML documents
//!   → per recipient: variable substitution ($KEY / ${KEY})
//!   → Image Inliner (local <img> references become cid: resources)
//!   → OutgoingEmail (multipart/alternative + multipart/related)
//! ```
//!
//! ## Modules
//!
//! - [`config`] — runtime configuration loaded from a `key=value` file.
//! - [`contacts`] — CSV contact loading and validation.
//! - [`stitcher`] — the document stitching state machine.
//! - [`inline`] — image discovery and `cid:` rewriting.
//!
//! ## Key Types
//!
//! - [`Stitcher`] — stitches a composite body into per-format documents.
//! - [`TemplateStore`] — resolves named sub-templates per output format.
//! - [`Format`] — the output formats (`plain`, `html`) with their
//!   template-path metadata.
//! - [`CidResource`] — an embedded image resource with a per-message
//!   content id.
//! - [`OutgoingEmail`] — one recipient's assembled message.
//! - [`Config`] — runtime configuration, constructed once at startup.

pub use config::*;
pub use contacts::*;
pub use convert::*;
pub use engine::*;
pub use error::*;
pub use inline::*;
pub use literal::*;
pub use message::*;
pub use stitcher::*;
pub use substitute::*;
pub use templates::*;

pub mod config;
pub mod contacts;
mod convert;
mod engine;
mod error;
pub mod inline;
mod literal;
mod message;
pub mod stitcher;
mod substitute;
mod templates;

#[cfg(test)]
mod __fixtures;
