//! Sitemap retrieval and extraction.
//!
//! One source location goes through four stages, each of which degrades
//! instead of failing:
//!
//! | Stage | Module | On failure |
//! |-------|--------|------------|
//! | Download | [`fetch`] | empty record set |
//! | Gunzip | [`decode`] | use the raw bytes |
//! | Parse | [`document`] | skip malformed fragments; salvage `<loc>` entries if no root survives |
//! | Extract | [`extract`] | skip entries without a location |
//!
//! Documents follow the sitemaps.org protocol
//! (`http://www.sitemaps.org/schemas/sitemap/0.9`), optionally with Google
//! image extensions (`http://www.google.com/schemas/sitemap-image/1.1`).

pub mod decode;
pub mod document;
pub mod extract;
pub mod fetch;
