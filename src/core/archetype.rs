//! Archetype identifiers and the host's archetype table
//!
//! An archetype is the class/kind of a pooled object and the key every pool is
//! partitioned by. The table records the single-inheritance hierarchy between
//! archetypes so that factory lookup can fall back to the nearest ancestor, and
//! optionally a constructor used by the generic object factory.

use std::borrow::Cow;
use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::pool::ObjectRef;

// ============================================================================
// Archetype
// ============================================================================

/// Name of an object archetype.
///
/// Two archetypes are equal when their names are equal, regardless of whether the
/// name is static or owned. The empty name is reserved for [`Archetype::NONE`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Archetype(Cow<'static, str>);

impl Archetype {
    /// The unset archetype. Never valid.
    pub const NONE: Self = Self::from_static("");

    /// Root of every hierarchy, served by the generic object factory.
    pub const OBJECT: Self = Self::from_static("Object");

    /// Root of the actor family.
    pub const ACTOR: Self = Self::from_static("Actor");

    /// Root of the UI panel family.
    pub const WIDGET: Self = Self::from_static("Widget");

    /// Create an archetype from a static name.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Create an archetype from an owned name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Get the archetype name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Returns true if the archetype is set.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }
}

impl Default for Archetype {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            f.write_str(&self.0)
        } else {
            f.write_str("<none>")
        }
    }
}

impl From<&'static str> for Archetype {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

// ============================================================================
// Archetype Table
// ============================================================================

/// Builds a fresh instance of the given archetype.
pub type Constructor = Box<dyn Fn(&Archetype) -> ObjectRef>;

struct ArchetypeEntry {
    parent: Option<Archetype>,
    constructor: Option<Constructor>,
}

/// The archetype hierarchy supplied by the host.
///
/// Every archetype has to be declared under an already declared parent, so the
/// hierarchy is always a tree rooted at [`Archetype::OBJECT`]. The table starts
/// out with the root and the built-in `Actor` and `Widget` families.
pub struct Archetypes {
    entries: FxHashMap<Archetype, ArchetypeEntry>,
}

impl Archetypes {
    /// Create a table containing the root and the built-in families.
    #[must_use]
    pub fn new() -> Self {
        let mut entries = FxHashMap::default();
        entries.insert(
            Archetype::OBJECT,
            ArchetypeEntry {
                parent: None,
                constructor: None,
            },
        );

        let mut table = Self { entries };
        table.declare(Archetype::ACTOR, Archetype::OBJECT);
        table.declare(Archetype::WIDGET, Archetype::OBJECT);
        table
    }

    /// Declare `archetype` as a direct child of `parent`.
    ///
    /// Returns false if the archetype is unset, already declared, or the parent
    /// is unknown.
    pub fn declare(&mut self, archetype: Archetype, parent: Archetype) -> bool {
        self.insert(archetype, parent, None)
    }

    /// Declare `archetype` under `parent` together with its constructor.
    pub fn declare_with(
        &mut self,
        archetype: Archetype,
        parent: Archetype,
        constructor: impl Fn(&Archetype) -> ObjectRef + 'static,
    ) -> bool {
        self.insert(archetype, parent, Some(Box::new(constructor)))
    }

    fn insert(
        &mut self,
        archetype: Archetype,
        parent: Archetype,
        constructor: Option<Constructor>,
    ) -> bool {
        if !archetype.is_valid() {
            log::warn!("Cannot declare an unset archetype");
            return false;
        }
        if self.entries.contains_key(&archetype) {
            log::warn!("Archetype '{archetype}' is already declared");
            return false;
        }
        if !self.entries.contains_key(&parent) {
            log::warn!("Cannot declare '{archetype}': parent '{parent}' is unknown");
            return false;
        }

        self.entries.insert(
            archetype,
            ArchetypeEntry {
                parent: Some(parent),
                constructor,
            },
        );
        true
    }

    /// Replace the constructor of a declared archetype.
    pub fn set_constructor(
        &mut self,
        archetype: &Archetype,
        constructor: impl Fn(&Archetype) -> ObjectRef + 'static,
    ) -> bool {
        match self.entries.get_mut(archetype) {
            Some(entry) => {
                entry.constructor = Some(Box::new(constructor));
                true
            }
            None => false,
        }
    }

    /// Check if an archetype is declared.
    #[must_use]
    pub fn contains(&self, archetype: &Archetype) -> bool {
        self.entries.contains_key(archetype)
    }

    /// Get the direct parent of an archetype.
    #[must_use]
    pub fn parent_of(&self, archetype: &Archetype) -> Option<&Archetype> {
        self.entries
            .get(archetype)
            .and_then(|entry| entry.parent.as_ref())
    }

    /// Get the archetype followed by all of its ancestors, root last.
    ///
    /// Empty if the archetype is not declared.
    #[must_use]
    pub fn ancestors(&self, archetype: &Archetype) -> SmallVec<[Archetype; 4]> {
        let mut chain = SmallVec::new();
        if !self.contains(archetype) {
            return chain;
        }

        let mut current = Some(archetype);
        while let Some(it) = current {
            chain.push(it.clone());
            current = self.parent_of(it);
        }
        chain
    }

    /// Returns true if `archetype` is `ancestor` or derives from it.
    #[must_use]
    pub fn is_a(&self, archetype: &Archetype, ancestor: &Archetype) -> bool {
        self.ancestors(archetype).iter().any(|it| it == ancestor)
    }

    /// Check if the archetype has its own constructor.
    #[must_use]
    pub fn has_constructor(&self, archetype: &Archetype) -> bool {
        self.entries
            .get(archetype)
            .is_some_and(|entry| entry.constructor.is_some())
    }

    /// Build an instance with the archetype's own constructor.
    #[must_use]
    pub fn construct(&self, archetype: &Archetype) -> Option<ObjectRef> {
        self.entries
            .get(archetype)
            .and_then(|entry| entry.constructor.as_ref())
            .map(|constructor| constructor(archetype))
    }

    /// Number of declared archetypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The table always contains at least the root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Archetypes {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Archetypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(archetype, entry)| (archetype, &entry.parent)),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_families() {
        let table = Archetypes::new();

        assert!(table.contains(&Archetype::OBJECT));
        assert_eq!(table.parent_of(&Archetype::ACTOR), Some(&Archetype::OBJECT));
        assert_eq!(table.parent_of(&Archetype::WIDGET), Some(&Archetype::OBJECT));
        assert_eq!(table.parent_of(&Archetype::OBJECT), None);
    }

    #[test]
    fn test_static_and_owned_names_are_equal() {
        assert_eq!(Archetype::new("Actor"), Archetype::ACTOR);
        assert!(!Archetype::NONE.is_valid());
        assert_eq!(Archetype::NONE.to_string(), "<none>");
    }

    #[test]
    fn test_ancestors_walk_to_root() {
        let mut table = Archetypes::new();
        assert!(table.declare("Projectile".into(), Archetype::ACTOR));
        assert!(table.declare("Rocket".into(), "Projectile".into()));

        let chain = table.ancestors(&"Rocket".into());
        let names: Vec<&str> = chain.iter().map(Archetype::name).collect();
        assert_eq!(names, vec!["Rocket", "Projectile", "Actor", "Object"]);

        assert!(table.is_a(&"Rocket".into(), &Archetype::ACTOR));
        assert!(!table.is_a(&"Rocket".into(), &Archetype::WIDGET));
    }

    #[test]
    fn test_declare_rejects_bad_input() {
        let mut table = Archetypes::new();

        assert!(!table.declare(Archetype::NONE, Archetype::OBJECT));
        assert!(!table.declare("Orphan".into(), "Missing".into()));
        assert!(table.declare("Spark".into(), Archetype::OBJECT));
        assert!(!table.declare("Spark".into(), Archetype::ACTOR));
        assert!(table.ancestors(&"Missing".into()).is_empty());
    }
}
