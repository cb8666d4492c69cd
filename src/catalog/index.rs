//! Category index built from validated entries.
//!
//! Grouping is keyed by the exact category string. Ordering is deterministic
//! regardless of directory listing order: categories and the apps inside them
//! sort by name with [`locale_cmp`], and ties fall back to stable keys.

use crate::catalog::identity::{Slug, slugify};
use crate::catalog::model::AppEntry;
use crate::loader::LoadedEntry;
use crate::timestamps::TimestampResolver;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::warn;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

#[derive(Clone, Debug)]
/// A validated entry plus where it came from and when it last changed.
pub struct CatalogApp {
    pub entry: AppEntry,
    /// Repo-relative path of the `metadata.json` file.
    pub source: PathBuf,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
/// All apps sharing one category string.
pub struct CategoryGroup {
    pub name: String,
    pub slug: Slug,
    pub apps: Vec<CatalogApp>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl CategoryGroup {
    pub fn count(&self) -> usize {
        self.apps.len()
    }

    /// Latest member timestamp, ignoring members not yet resolved.
    pub fn latest_member_update(&self) -> Option<DateTime<Utc>> {
        self.apps.iter().filter_map(|app| app.last_updated).max()
    }
}

#[derive(Debug, Default)]
/// Sorted categories with unique slugs.
pub struct CategoryIndex {
    groups: Vec<CategoryGroup>,
}

impl CategoryIndex {
    /// Group entries by category, sort everything, and assign slugs.
    pub fn build(entries: Vec<LoadedEntry>) -> Self {
        let mut by_name: BTreeMap<String, Vec<CatalogApp>> = BTreeMap::new();
        for loaded in entries {
            by_name
                .entry(loaded.entry.category.clone())
                .or_default()
                .push(CatalogApp {
                    entry: loaded.entry,
                    source: loaded.source,
                    last_updated: None,
                });
        }

        let mut groups: Vec<CategoryGroup> = by_name
            .into_iter()
            .map(|(name, mut apps)| {
                apps.sort_by(compare_apps);
                CategoryGroup {
                    slug: slugify(&name),
                    name,
                    apps,
                    last_updated: None,
                }
            })
            .collect();
        groups.sort_by(|a, b| locale_cmp(&a.name, &b.name));
        assign_unique_slugs(&mut groups);
        Self { groups }
    }

    pub fn groups(&self) -> &[CategoryGroup] {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut [CategoryGroup] {
        &mut self.groups
    }

    pub fn total_apps(&self) -> usize {
        self.groups.iter().map(CategoryGroup::count).sum()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn slugs(&self) -> BTreeSet<Slug> {
        self.groups.iter().map(|group| group.slug.clone()).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.name.as_str())
    }

    /// Resolve every app's metadata file timestamp and roll each category up
    /// to the newest of its members.
    pub fn attach_timestamps(&mut self, resolver: &TimestampResolver) {
        for group in &mut self.groups {
            for app in &mut group.apps {
                app.last_updated = Some(resolver.resolve(&app.source));
            }
            group.last_updated = group.latest_member_update();
        }
    }
}

/// Locale-style string ordering.
///
/// Letters compare by their base form first, so accented and plain letters
/// interleave ("Ångström" sorts with the a's). Ties are broken by accents,
/// then by case with lowercase first, then by the raw string.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| lowercase(a).cmp(lowercase(b)))
        .then_with(|| {
            a.chars()
                .map(|c| (c.is_uppercase(), c))
                .cmp(b.chars().map(|c| (c.is_uppercase(), c)))
        })
        .then_with(|| a.cmp(b))
}

// Canonical decomposition with combining marks dropped, lowercased.
fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn lowercase(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase)
}

fn compare_apps(a: &CatalogApp, b: &CatalogApp) -> Ordering {
    locale_cmp(&a.entry.name, &b.entry.name)
        .then_with(|| a.entry.release_slug().cmp(&b.entry.release_slug()))
        .then_with(|| a.source.cmp(&b.source))
}

// Distinct names can slugify identically ("Tools & Misc" vs "Tools/Misc").
// Later groups in sorted order get numeric suffixes so release files never
// overwrite each other.
fn assign_unique_slugs(groups: &mut [CategoryGroup]) {
    let mut taken: BTreeSet<Slug> = BTreeSet::new();
    for group in groups.iter_mut() {
        if taken.insert(group.slug.clone()) {
            continue;
        }
        let base = group.slug.clone();
        let mut suffix = 2;
        let unique = loop {
            let candidate = Slug(format!("{base}-{suffix}"));
            if !taken.contains(&candidate) {
                break candidate;
            }
            suffix += 1;
        };
        warn!(
            category = %group.name,
            slug = %base,
            assigned = %unique,
            "category slug collides with another category"
        );
        taken.insert(unique.clone());
        group.slug = unique;
    }
}
