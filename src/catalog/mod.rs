//! Catalog data model and aggregation.
//!
//! `model` mirrors the on-disk JSON (app metadata, category config),
//! `identity` holds the small value types (slugs, category kinds),
//! `repository` exposes the configured categories, and `index` groups
//! validated entries into sorted categories.

pub mod identity;
pub mod index;
pub mod model;
pub mod repository;

pub use identity::{CategoryKind, Slug, slugify};
pub use index::{CatalogApp, CategoryGroup, CategoryIndex, locale_cmp};
pub use model::{AppEntry, CategoryConfig, CategorySpec, REQUIRED_FIELDS, load_category_config};
pub use repository::CategoryRegistry;
