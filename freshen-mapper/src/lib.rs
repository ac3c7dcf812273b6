//! # freshen-mapper
//!
//! Tera-based destination naming. A [`TemplateMapper`] plugs into the
//! freshness engine wherever a [`freshen_core::DestinationMapper`] is
//! accepted.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use freshen_mapper::TemplateMapper;
//!
//! fn show(template: &str) {
//!     if let Ok(mapper) = TemplateMapper::new(template) {
//!         if let Ok(dest) = mapper.render(Path::new("styles/site.scss")) {
//!             println!("{}", dest.display());
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::PathContext;
pub use engine::TemplateMapper;
pub use error::MapperError;
