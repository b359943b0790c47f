//! Resource identities and the corpus collaborator trait.
//!
//! The search core never decodes bytes itself. It asks a [`ResourceSource`]
//! which resources of a type exist, loads their record trees, and looks up
//! search aliases. [`MemorySource`] is the in-memory implementation used by
//! tests and by callers that decode their corpus up front.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{Result, SearchError};
use crate::record::RecordTree;

/// Name of a resource, e.g. `AR0602.ARE`.
///
/// Resource names are case-insensitive: equality, ordering and hashing all
/// ignore ASCII case.
#[derive(Debug, Clone)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(name: impl Into<String>) -> Self {
        ResourceId(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Upper-cased extension, e.g. `ARE`. Empty when the name has none.
    pub fn type_tag(&self) -> String {
        self.0
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_uppercase())
            .unwrap_or_default()
    }

    /// Returns `true` if the resource belongs to the given type tag.
    pub fn is_type(&self, type_tag: &str) -> bool {
        self.type_tag().eq_ignore_ascii_case(type_tag)
    }
}

impl PartialEq for ResourceId {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for ResourceId {}

impl Hash for ResourceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl PartialOrd for ResourceId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResourceId {
    fn cmp(&self, other: &Self) -> Ordering {
        let a = self.0.bytes().map(|b| b.to_ascii_lowercase());
        let b = other.0.bytes().map(|b| b.to_ascii_lowercase());
        a.cmp(b)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(name: &str) -> Self {
        ResourceId::new(name)
    }
}

impl From<String> for ResourceId {
    fn from(name: String) -> Self {
        ResourceId::new(name)
    }
}

/// Access to a resource corpus.
///
/// Implementations must be shareable across worker threads. `load` is
/// called once per resource per search, concurrently from several workers.
///
/// # Manual Implementation
///
/// ```
/// use std::sync::Arc;
/// use structseek::{RecordTree, RecordTreeBuilder, ResourceId, ResourceSource};
///
/// struct Single(Arc<RecordTree>);
///
/// impl ResourceSource for Single {
///     fn resources_of_type(&self, type_tag: &str) -> Vec<ResourceId> {
///         let id = ResourceId::new("ONLY.ITM");
///         if id.is_type(type_tag) { vec![id] } else { Vec::new() }
///     }
///
///     fn load(&self, _id: &ResourceId) -> structseek::Result<Option<Arc<RecordTree>>> {
///         Ok(Some(Arc::clone(&self.0)))
///     }
/// }
///
/// let source = Single(Arc::new(RecordTreeBuilder::new("ONLY.ITM", "ITM").build()));
/// assert_eq!(source.resources_of_type("itm").len(), 1);
/// assert_eq!(source.alias(&ResourceId::new("ONLY.ITM")), None);
/// ```
pub trait ResourceSource: Send + Sync {
    /// Identities of every resource of the given type tag.
    fn resources_of_type(&self, type_tag: &str) -> Vec<ResourceId>;

    /// Loads the record tree of a resource.
    ///
    /// Returns `Ok(None)` for resources that are not structured records;
    /// the scheduler skips them silently. Errors are contained per resource.
    fn load(&self, id: &ResourceId) -> Result<Option<Arc<RecordTree>>>;

    /// Search alias of a resource (e.g. a creature's display name).
    fn alias(&self, _id: &ResourceId) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone)]
enum Content {
    Tree(Arc<RecordTree>),
    Opaque,
    Broken(String),
}

#[derive(Debug, Clone)]
struct Entry {
    content: Content,
    alias: Option<String>,
}

/// In-memory corpus.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: BTreeMap<ResourceId, Entry>,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource::default()
    }

    /// Adds (or replaces) a structured resource.
    pub fn insert(&mut self, id: impl Into<ResourceId>, tree: impl Into<Arc<RecordTree>>) {
        self.put(id.into(), Content::Tree(tree.into()));
    }

    /// Adds a resource that is not a structured record (it is listed but
    /// never searched).
    pub fn insert_opaque(&mut self, id: impl Into<ResourceId>) {
        self.put(id.into(), Content::Opaque);
    }

    /// Adds a resource whose decoding fails with `message`.
    pub fn insert_broken(&mut self, id: impl Into<ResourceId>, message: impl Into<String>) {
        self.put(id.into(), Content::Broken(message.into()));
    }

    /// Sets the search alias of a resource already inserted.
    ///
    /// Returns `false` if the resource is unknown.
    pub fn set_alias(&mut self, id: &ResourceId, alias: impl Into<String>) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.alias = Some(alias.into());
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn put(&mut self, id: ResourceId, content: Content) {
        let alias = self.entries.remove(&id).and_then(|entry| entry.alias);
        self.entries.insert(id, Entry { content, alias });
    }
}

impl ResourceSource for MemorySource {
    fn resources_of_type(&self, type_tag: &str) -> Vec<ResourceId> {
        self.entries
            .keys()
            .filter(|id| id.is_type(type_tag))
            .cloned()
            .collect()
    }

    fn load(&self, id: &ResourceId) -> Result<Option<Arc<RecordTree>>> {
        match self.entries.get(id).map(|entry| &entry.content) {
            Some(Content::Tree(tree)) => Ok(Some(Arc::clone(tree))),
            Some(Content::Opaque) => Ok(None),
            Some(Content::Broken(message)) => Err(SearchError::Load {
                resource: id.to_string(),
                message: message.clone(),
            }),
            None => Err(SearchError::Load {
                resource: id.to_string(),
                message: "resource not found".to_string(),
            }),
        }
    }

    fn alias(&self, id: &ResourceId) -> Option<String> {
        self.entries.get(id).and_then(|entry| entry.alias.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordTreeBuilder;
    use std::collections::HashSet;

    #[test]
    fn resource_id_ignores_case() {
        assert_eq!(ResourceId::new("ar0602.are"), ResourceId::new("AR0602.ARE"));
        let set: HashSet<ResourceId> = ["a.itm", "A.ITM"].into_iter().map(ResourceId::new).collect();
        assert_eq!(set.len(), 1);
        assert!(ResourceId::new("abc.cre") < ResourceId::new("ABD.CRE"));
    }

    #[test]
    fn type_tag_is_uppercase_extension() {
        assert_eq!(ResourceId::new("sw1h01.itm").type_tag(), "ITM");
        assert_eq!(ResourceId::new("NOEXT").type_tag(), "");
        assert!(ResourceId::new("x.Cre").is_type("CRE"));
    }

    #[test]
    fn memory_source_filters_by_type() {
        let mut source = MemorySource::new();
        source.insert("A.ITM", RecordTreeBuilder::new("A.ITM", "ITM").build());
        source.insert("B.CRE", RecordTreeBuilder::new("B.CRE", "CRE").build());
        source.insert_opaque("C.ITM");

        let items = source.resources_of_type("ITM");
        assert_eq!(items, vec![ResourceId::new("A.ITM"), ResourceId::new("C.ITM")]);
        assert!(source.load(&ResourceId::new("C.ITM")).unwrap().is_none());
        assert!(source.load(&ResourceId::new("A.ITM")).unwrap().is_some());
    }

    #[test]
    fn broken_and_missing_resources_fail_to_load() {
        let mut source = MemorySource::new();
        source.insert_broken("BAD.ITM", "truncated header");
        let err = source.load(&ResourceId::new("BAD.ITM")).unwrap_err();
        assert!(err.to_string().contains("truncated header"));
        assert!(source.load(&ResourceId::new("GONE.ITM")).is_err());
    }

    #[test]
    fn alias_survives_reinsert() {
        let mut source = MemorySource::new();
        let id = ResourceId::new("IMOEN.CRE");
        source.insert_opaque(id.clone());
        assert!(source.set_alias(&id, "Imoen"));
        source.insert(id.clone(), RecordTreeBuilder::new("IMOEN.CRE", "CRE").build());
        assert_eq!(source.alias(&id).as_deref(), Some("Imoen"));
        assert!(!source.set_alias(&ResourceId::new("NOBODY.CRE"), "x"));
    }
}
