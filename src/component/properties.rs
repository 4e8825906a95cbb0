//! Property bags, change records and accessor overrides.
//!
//! [`Properties`] is the incoming side of `set_properties`: an ordered bag of
//! key/value pairs, plus the out-of-band view-context link. [`ChangeSet`] is
//! what the diff engine produces and the repaint pipeline consumes.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::instance::Component;
use crate::context::ViewContext;
use crate::value::Value;

/// Keys that establish identity rather than visual state. They are applied
/// only while a component is still `NEW` and never diffed.
pub const RESERVED_KEYS: [&str; 3] = ["id", "group", "skin"];

/// Whether `name` is one of [`RESERVED_KEYS`].
pub fn is_reserved(name: &str) -> bool {
    RESERVED_KEYS.contains(&name)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// An ordered bag of incoming property values.
///
/// Setting a key twice keeps its first position and the last value.
#[derive(Clone, Default)]
pub struct Properties {
    entries: Vec<(String, Value)>,
    context: Option<Option<ViewContext>>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value (builder).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Link the component to `context` (or unlink with `None`) as part of this
    /// update (builder).
    pub fn with_view_context(mut self, context: Option<&ViewContext>) -> Self {
        self.context = Some(context.cloned());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Overlay `other` on top of `self`; `other` wins on conflicts.
    pub fn merge(&mut self, other: Properties) {
        for (name, value) in other.entries {
            self.insert(name, value);
        }
        if other.context.is_some() {
            self.context = other.context;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.context.is_none()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub(crate) fn take_view_context(&mut self) -> Option<Option<ViewContext>> {
        self.context.take()
    }

    pub(crate) fn into_entries(self) -> Vec<(String, Value)> {
        self.entries
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Properties::new();
        for (name, value) in iter {
            properties.insert(name, value);
        }
        properties
    }
}

impl fmt::Debug for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.entries {
            map.entry(key, value);
        }
        if let Some(context) = &self.context {
            map.entry(&"<viewContext>", &context.as_ref().map(ViewContext::id));
        }
        map.finish()
    }
}

// ---------------------------------------------------------------------------
// ChangeRecord / ChangeSet
// ---------------------------------------------------------------------------

/// One property whose value changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub name: String,
    pub old: Value,
    pub new: Value,
}

impl ChangeRecord {
    pub fn new(name: impl Into<String>, old: Value, new: Value) -> Self {
        Self {
            name: name.into(),
            old,
            new,
        }
    }
}

/// Ordered change records, indexed by property name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    records: Vec<ChangeRecord>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, replacing any earlier record for the same name.
    pub fn push(&mut self, record: ChangeRecord) {
        match self.records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ChangeRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<ChangeRecord> {
        let index = self.records.iter().position(|r| r.name == name)?;
        Some(self.records.remove(index))
    }

    pub fn names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChangeRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<ChangeRecord> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = ChangeRecord>>(iter: I) -> Self {
        let mut set = ChangeSet::new();
        for record in iter {
            set.push(record);
        }
        set
    }
}

impl IntoIterator for ChangeSet {
    type Item = ChangeRecord;
    type IntoIter = std::vec::IntoIter<ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a ChangeRecord;
    type IntoIter = std::slice::Iter<'a, ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ---------------------------------------------------------------------------
// Accessor overrides
// ---------------------------------------------------------------------------

/// Reads a computed property.
pub type Getter = Rc<dyn Fn(&Component) -> Value>;
/// Stores a property somewhere other than the bag.
pub type Setter = Rc<dyn Fn(&Component, Value)>;

/// Per-instance override for reading and/or storing one property.
#[derive(Clone, Default)]
pub struct Accessor {
    pub get: Option<Getter>,
    pub set: Option<Setter>,
}

impl Accessor {
    pub fn getter(get: impl Fn(&Component) -> Value + 'static) -> Self {
        Self {
            get: Some(Rc::new(get)),
            set: None,
        }
    }

    pub fn setter(set: impl Fn(&Component, Value) + 'static) -> Self {
        Self {
            get: None,
            set: Some(Rc::new(set)),
        }
    }

    /// Add a setter to an accessor (builder).
    pub fn with_setter(mut self, set: impl Fn(&Component, Value) + 'static) -> Self {
        self.set = Some(Rc::new(set));
        self
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("get", &self.get.is_some())
            .field("set", &self.set.is_some())
            .finish()
    }
}

/// The stored property values of one component.
#[derive(Debug, Default)]
pub(crate) struct PropertyBag {
    values: HashMap<String, Value>,
}

impl PropertyBag {
    pub(crate) fn get(&self, name: &str) -> Value {
        self.values.get(name).cloned().unwrap_or_default()
    }

    pub(crate) fn insert(&mut self, name: String, value: Value) {
        self.values.insert(name, value);
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn properties_keep_first_position_last_value() {
        let props = Properties::new().with("a", 1).with("b", 2).with("a", 3);
        let entries: Vec<(&str, &Value)> = props.iter().collect();
        assert_eq!(entries, vec![("a", &Value::from(3)), ("b", &Value::from(2))]);
    }

    #[test]
    fn properties_merge_overrides() {
        let mut base: Properties = [("a", 1), ("b", 2)].into_iter().collect();
        base.merge(Properties::new().with("b", 20).with("c", 30));
        assert_eq!(base.get("b"), Some(&Value::from(20)));
        assert_eq!(base.len(), 3);
        assert_eq!(base.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn properties_remove() {
        let mut props = Properties::new().with("id", "x").with("title", "t");
        assert_eq!(props.remove("id"), Some(Value::from("x")));
        assert_eq!(props.remove("id"), None);
        assert!(!props.contains("id"));
        assert!(props.contains("title"));
    }

    #[test]
    fn empty_properties_with_context_is_not_empty() {
        let props = Properties::new().with_view_context(None);
        assert!(!props.is_empty());
        assert_eq!(props.len(), 0);
    }

    #[test]
    fn reserved_keys() {
        assert!(is_reserved("id"));
        assert!(is_reserved("group"));
        assert!(is_reserved("skin"));
        assert!(!is_reserved("title"));
    }

    #[test]
    fn change_set_index() {
        let mut changes = ChangeSet::new();
        changes.push(ChangeRecord::new("x", Value::Null, Value::from(1)));
        changes.push(ChangeRecord::new("y", Value::Null, Value::from(2)));
        changes.push(ChangeRecord::new("x", Value::from(1), Value::from(5)));
        assert_eq!(changes.len(), 2);
        assert_eq!(changes.names(), vec!["x", "y"]);
        assert_eq!(changes.get("x").unwrap().new, Value::from(5));
        assert!(changes.remove("y").is_some());
        assert!(!changes.contains("y"));
    }

    #[test]
    fn bag_defaults_to_null() {
        let mut bag = PropertyBag::default();
        assert_eq!(bag.get("missing"), Value::Null);
        bag.insert("k".into(), Value::from(true));
        assert_eq!(bag.get("k"), Value::from(true));
    }
}
