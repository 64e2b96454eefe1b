//! Category name to dense class id mapping.

use std::collections::HashMap;

use super::ids::{CategoryId, ClassId};
use super::model::CategoryRecord;

/// Dense, zero-based class ids keyed by category name.
///
/// Ids are handed out in the order category names first appear. Several
/// source categories with the same name collapse onto one class id. The map
/// is built once per run and never mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassMap {
    names: Vec<String>,
    by_name: HashMap<String, ClassId>,
    by_category: HashMap<CategoryId, ClassId>,
}

impl ClassMap {
    /// Build the mapping from a manifest's category list.
    ///
    /// When a source category id is listed twice, its first entry decides
    /// the class.
    pub fn from_categories(categories: &[CategoryRecord]) -> Self {
        let mut map = Self::default();
        for category in categories {
            let class_id = map.intern(&category.name);
            map.by_category.entry(category.id).or_insert(class_id);
        }
        map
    }

    /// Build a mapping from an already ordered list of names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = Self::default();
        for name in names {
            map.intern(name.as_ref());
        }
        map
    }

    fn intern(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = ClassId(self.names.len());
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Dense class for a source category id.
    pub fn class_for(&self, category_id: CategoryId) -> Option<ClassId> {
        self.by_category.get(&category_id).copied()
    }

    /// Class names indexed by dense id.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
