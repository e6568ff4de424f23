//! Interning context: canonical storage for attributes and types.
//!
//! Every attribute and type lives exactly once in an [`InternContext`].
//! Interning an equal payload twice yields the same ref, so equality of
//! interned values is a `u32` comparison.
//!
//! Each table is guarded by its own `RwLock`. Lookup-or-insert takes an
//! upgradable read and only upgrades on a miss; resolving an existing entry
//! takes a plain (recursive) read. Entries are never evicted.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, LazyLock};

use cranelift_entity::{EntityRef, PrimaryMap};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};

use crate::attribute::AttributeData;
use crate::refs::{AttrRef, TypeRef};
use crate::types::TypeData;

static GLOBAL: LazyLock<Arc<InternContext>> = LazyLock::new(|| Arc::new(InternContext::new()));

// ============================================================================
// Uniquer
// ============================================================================

/// Deduplicating table. Same data always yields the same ref.
struct Uniquer<K: EntityRef, V> {
    entries: PrimaryMap<K, V>,
    dedup: HashMap<V, K>,
}

impl<K: EntityRef, V: Clone + Eq + Hash> Uniquer<K, V> {
    fn new() -> Self {
        Self {
            entries: PrimaryMap::new(),
            dedup: HashMap::default(),
        }
    }

    fn lookup(&self, data: &V) -> Option<K> {
        self.dedup.get(data).copied()
    }

    fn insert(&mut self, data: V) -> K {
        // Another writer may have won the race between our read and upgrade.
        if let Some(existing) = self.lookup(&data) {
            return existing;
        }
        let r = self.entries.push(data.clone());
        self.dedup.insert(data, r);
        r
    }

    fn get(&self, r: K) -> &V {
        assert!(
            self.entries.is_valid(r),
            "interned ref #{} does not belong to this context ({} entries)",
            r.index(),
            self.entries.len(),
        );
        &self.entries[r]
    }
}

fn intern_in<K, V>(table: &RwLock<Uniquer<K, V>>, data: V, kind: &'static str) -> K
where
    K: EntityRef,
    V: Clone + Eq + Hash,
{
    let lock = table.upgradable_read();
    if let Some(existing) = lock.lookup(&data) {
        return existing;
    }
    let mut lock = RwLockUpgradableReadGuard::upgrade(lock);
    let r = lock.insert(data);
    tracing::debug!("interned new {kind} #{} ({} total)", r.index(), lock.entries.len());
    r
}

// ============================================================================
// InternContext
// ============================================================================

/// Registry owning every interned attribute and type.
///
/// Refs handed out by one context are meaningless in another.
pub struct InternContext {
    attrs: RwLock<Uniquer<AttrRef, AttributeData>>,
    types: RwLock<Uniquer<TypeRef, TypeData>>,
}

impl InternContext {
    /// Create an isolated, empty registry.
    pub fn new() -> Self {
        Self {
            attrs: RwLock::new(Uniquer::new()),
            types: RwLock::new(Uniquer::new()),
        }
    }

    /// The process-wide registry, created on first use.
    pub fn global() -> Arc<InternContext> {
        Arc::clone(&GLOBAL)
    }

    /// Intern an attribute, returning an existing ref if the data matches.
    pub fn intern_attr(&self, data: AttributeData) -> AttrRef {
        let kind = data.kind_name();
        intern_in(&self.attrs, data, kind)
    }

    /// Intern a type, returning an existing ref if the data matches.
    ///
    /// This does not validate the payload; use the typed constructors in
    /// [`crate::types`] for that.
    pub fn intern_type(&self, data: TypeData) -> TypeRef {
        let kind = data.kind_name();
        intern_in(&self.types, data, kind)
    }

    /// Attribute payload by value.
    pub fn attr_data(&self, r: AttrRef) -> AttributeData {
        self.with_attr(r, Clone::clone)
    }

    /// Type payload by value.
    pub fn type_data(&self, r: TypeRef) -> TypeData {
        self.with_type(r, Clone::clone)
    }

    /// Borrow an attribute payload for the duration of `f`.
    pub fn with_attr<R>(&self, r: AttrRef, f: impl FnOnce(&AttributeData) -> R) -> R {
        let attrs = self.attrs.read_recursive();
        f(attrs.get(r))
    }

    /// Borrow a type payload for the duration of `f`.
    pub fn with_type<R>(&self, r: TypeRef, f: impl FnOnce(&TypeData) -> R) -> R {
        let types = self.types.read_recursive();
        f(types.get(r))
    }

    /// Whether `r` is a handle issued by this context.
    pub fn owns_attr(&self, r: AttrRef) -> bool {
        self.attrs.read_recursive().entries.is_valid(r)
    }

    pub fn owns_type(&self, r: TypeRef) -> bool {
        self.types.read_recursive().entries.is_valid(r)
    }

    /// Number of distinct attributes interned so far.
    pub fn attr_count(&self) -> usize {
        self.attrs.read().entries.len()
    }

    /// Number of distinct types interned so far.
    pub fn type_count(&self) -> usize {
        self.types.read().entries.len()
    }
}

impl Default for InternContext {
    fn default() -> Self {
        Self::new()
    }
}
