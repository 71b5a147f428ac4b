use crate::{
    model::{
        Entity, EntityConstructor, EntityRef, ModelError, NavigationAccessor, NavigationKind,
        downcast,
    },
    value::Value,
};
use parking_lot::Mutex;
use std::{
    any::Any,
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};

///
/// Record
///
/// Dynamic entity: an entity path, named field values in binding order, and
/// navigation slots filled in by stitching. Lets callers build shape plans
/// without declaring Rust types per entity.
///
/// Inverse fixup stores strong handles in both directions, so a stitched
/// owner/related pair forms a reference cycle.
///

pub struct Record {
    entity_path: &'static str,
    fields: Vec<(&'static str, Value)>,
    state: Mutex<RecordState>,
}

#[derive(Default)]
struct RecordState {
    slots: BTreeMap<&'static str, Slot>,
    loaded: BTreeSet<&'static str>,
}

enum Slot {
    Collection(Vec<EntityRef>),
    Reference(EntityRef),
}

impl Record {
    #[must_use]
    pub fn new(entity_path: &'static str, fields: Vec<(&'static str, Value)>) -> Self {
        Self {
            entity_path,
            fields,
            state: Mutex::new(RecordState::default()),
        }
    }

    /// Constructor that zips bound values with `field_names`.
    #[must_use]
    pub fn constructor(
        entity_path: &'static str,
        field_names: &'static [&'static str],
    ) -> Arc<dyn EntityConstructor> {
        Arc::new(move |values: Vec<Value>| -> Result<EntityRef, ModelError> {
            if values.len() != field_names.len() {
                return Err(ModelError::Arity {
                    entity_path,
                    expected: field_names.len(),
                    found: values.len(),
                });
            }

            let fields = field_names.iter().copied().zip(values).collect();

            Ok(Arc::new(Self::new(entity_path, fields)))
        })
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find_map(|(field, value)| (*field == name).then_some(value))
    }

    #[must_use]
    pub fn fields(&self) -> &[(&'static str, Value)] {
        &self.fields
    }

    /// Related entity for a reference navigation, if assigned.
    #[must_use]
    pub fn reference(&self, navigation: &str) -> Option<EntityRef> {
        match self.state.lock().slots.get(navigation) {
            Some(Slot::Reference(related)) => Some(Arc::clone(related)),
            _ => None,
        }
    }

    /// Related entities for a collection navigation.
    ///
    /// `None` means the collection was never initialized, which is distinct
    /// from an initialized empty collection.
    #[must_use]
    pub fn collection(&self, navigation: &str) -> Option<Vec<EntityRef>> {
        match self.state.lock().slots.get(navigation) {
            Some(Slot::Collection(items)) => Some(items.clone()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_loaded(&self, navigation: &str) -> bool {
        self.state.lock().loaded.contains(navigation)
    }

    fn set_reference(&self, navigation: &'static str, related: EntityRef) {
        self.state
            .lock()
            .slots
            .insert(navigation, Slot::Reference(related));
    }

    fn push_related(&self, navigation: &'static str, related: EntityRef) -> Result<(), ModelError> {
        let mut state = self.state.lock();
        match state
            .slots
            .entry(navigation)
            .or_insert_with(|| Slot::Collection(Vec::new()))
        {
            Slot::Collection(items) => {
                items.push(related);
                Ok(())
            }
            Slot::Reference(_) => Err(self.slot_mismatch(navigation, NavigationKind::Reference)),
        }
    }

    fn ensure_collection(&self, navigation: &'static str) -> Result<(), ModelError> {
        let mut state = self.state.lock();
        match state
            .slots
            .entry(navigation)
            .or_insert_with(|| Slot::Collection(Vec::new()))
        {
            Slot::Collection(_) => Ok(()),
            Slot::Reference(_) => Err(self.slot_mismatch(navigation, NavigationKind::Reference)),
        }
    }

    fn mark_loaded(&self, navigation: &'static str) {
        self.state.lock().loaded.insert(navigation);
    }

    const fn slot_mismatch(&self, navigation: &'static str, actual: NavigationKind) -> ModelError {
        ModelError::SlotKindMismatch {
            navigation,
            entity_path: self.entity_path,
            actual,
        }
    }
}

impl Entity for Record {
    fn entity_path(&self) -> &'static str {
        self.entity_path
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// Navigation slots are summarized, never followed: stitched graphs are cyclic.
impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        let slots: Vec<String> = state
            .slots
            .iter()
            .map(|(name, slot)| match slot {
                Slot::Collection(items) => format!("{name}[{}]", items.len()),
                Slot::Reference(related) => format!("{name}->{}", related.entity_path()),
            })
            .collect();

        f.debug_struct("Record")
            .field("entity_path", &self.entity_path)
            .field("fields", &self.fields)
            .field("navigations", &slots)
            .finish()
    }
}

///
/// RecordNavigation
///
/// Navigation accessor over `Record` slots, keyed by navigation name.
///

#[derive(Clone, Copy, Debug)]
pub struct RecordNavigation {
    name: &'static str,
}

impl RecordNavigation {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    #[must_use]
    pub fn shared(name: &'static str) -> Arc<dyn NavigationAccessor> {
        Arc::new(Self::new(name))
    }

    fn record<'a>(&self, entity: &'a EntityRef) -> Result<&'a Record, ModelError> {
        downcast::<Record>(entity).ok_or_else(|| ModelError::EntityTypeMismatch {
            navigation: self.name,
            entity_path: entity.entity_path(),
        })
    }
}

impl NavigationAccessor for RecordNavigation {
    fn set_reference(&self, owner: &EntityRef, related: &EntityRef) -> Result<(), ModelError> {
        self.record(owner)?
            .set_reference(self.name, Arc::clone(related));

        Ok(())
    }

    fn add_to_collection(&self, owner: &EntityRef, related: &EntityRef) -> Result<(), ModelError> {
        self.record(owner)?
            .push_related(self.name, Arc::clone(related))
    }

    fn get_or_create_collection(&self, owner: &EntityRef) -> Result<(), ModelError> {
        self.record(owner)?.ensure_collection(self.name)
    }

    fn set_loaded(&self, owner: &EntityRef) -> Result<(), ModelError> {
        self.record(owner)?.mark_loaded(self.name);

        Ok(())
    }
}
