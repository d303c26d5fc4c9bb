// src/fetch/mod.rs
// =============================================================================
// Concrete expanders for the traversal core.
//
// - http: fetches real pages and follows their links
// - canned: a fixed in-memory site for demos and tests
// =============================================================================

mod canned;
mod http;

pub use canned::{canned_site, CANNED_ROOT};
pub use http::{HttpConfig, HttpExpander, Page};
