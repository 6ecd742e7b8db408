//! URL handling module
//!
//! This module provides URL normalization, relative link resolution and
//! domain comparison. Everything here is a pure function.

mod domain;
mod normalize;

pub use domain::{extract_domain, is_same_domain, resolve_url};
pub use normalize::normalize_url;
