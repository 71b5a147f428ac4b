use crate::model::{EntityRef, ModelError};
use std::{fmt, sync::Arc};

///
/// NavigationKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NavigationKind {
    Collection,
    Reference,
}

impl NavigationKind {
    pub(crate) const fn tag(self) -> u8 {
        match self {
            Self::Collection => 0x01,
            Self::Reference => 0x02,
        }
    }
}

impl fmt::Display for NavigationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Collection => "collection",
            Self::Reference => "reference",
        };
        write!(f, "{label}")
    }
}

///
/// NavigationAccessor
///
/// Capability set for one navigation, resolved when the shape plan is built.
/// `set_loaded` marks the navigation loaded without going through any lazy
/// loading hook the entity may have.
///

pub trait NavigationAccessor: Send + Sync {
    fn set_reference(&self, owner: &EntityRef, related: &EntityRef) -> Result<(), ModelError>;

    fn add_to_collection(&self, owner: &EntityRef, related: &EntityRef) -> Result<(), ModelError>;

    /// Ensure the collection exists on `owner`, creating it empty if absent.
    fn get_or_create_collection(&self, owner: &EntityRef) -> Result<(), ModelError>;

    fn set_loaded(&self, owner: &EntityRef) -> Result<(), ModelError>;
}

///
/// Navigation
///
/// Named relationship declared on `declaring_entity` pointing at
/// `target_entity`.
///

#[derive(Clone)]
pub struct Navigation {
    name: &'static str,
    declaring_entity: &'static str,
    target_entity: &'static str,
    kind: NavigationKind,
    accessor: Arc<dyn NavigationAccessor>,
}

impl Navigation {
    #[must_use]
    pub fn new(
        declaring_entity: &'static str,
        name: &'static str,
        target_entity: &'static str,
        kind: NavigationKind,
        accessor: Arc<dyn NavigationAccessor>,
    ) -> Self {
        Self {
            name,
            declaring_entity,
            target_entity,
            kind,
            accessor,
        }
    }

    #[must_use]
    pub fn reference(
        declaring_entity: &'static str,
        name: &'static str,
        target_entity: &'static str,
        accessor: Arc<dyn NavigationAccessor>,
    ) -> Self {
        Self::new(
            declaring_entity,
            name,
            target_entity,
            NavigationKind::Reference,
            accessor,
        )
    }

    #[must_use]
    pub fn collection(
        declaring_entity: &'static str,
        name: &'static str,
        target_entity: &'static str,
        accessor: Arc<dyn NavigationAccessor>,
    ) -> Self {
        Self::new(
            declaring_entity,
            name,
            target_entity,
            NavigationKind::Collection,
            accessor,
        )
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn declaring_entity(&self) -> &'static str {
        self.declaring_entity
    }

    #[must_use]
    pub const fn target_entity(&self) -> &'static str {
        self.target_entity
    }

    #[must_use]
    pub const fn kind(&self) -> NavigationKind {
        self.kind
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self.kind, NavigationKind::Collection)
    }

    /// Link `related` into this navigation on `owner`: assign for references,
    /// append for collections.
    pub fn attach(&self, owner: &EntityRef, related: &EntityRef) -> Result<(), ModelError> {
        match self.kind {
            NavigationKind::Collection => self.accessor.add_to_collection(owner, related),
            NavigationKind::Reference => self.accessor.set_reference(owner, related),
        }
    }

    /// Untracked fixup: attach `related` to `owner`, then link `owner` into
    /// `inverse` on `related`. Only a reference inverse is marked loaded; a
    /// collection inverse may still be missing other owners.
    pub fn fixup(
        &self,
        owner: &EntityRef,
        related: &EntityRef,
        inverse: Option<&Self>,
    ) -> Result<(), ModelError> {
        self.attach(owner, related)?;

        if let Some(inverse) = inverse {
            inverse.attach(related, owner)?;
            if !inverse.is_collection() {
                inverse.accessor.set_loaded(related)?;
            }
        }

        Ok(())
    }

    pub fn mark_loaded(&self, owner: &EntityRef) -> Result<(), ModelError> {
        self.accessor.set_loaded(owner)
    }

    pub fn ensure_collection(&self, owner: &EntityRef) -> Result<(), ModelError> {
        self.accessor.get_or_create_collection(owner)
    }
}

impl fmt::Debug for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigation")
            .field("name", &self.name)
            .field("declaring_entity", &self.declaring_entity)
            .field("target_entity", &self.target_entity)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_entity, self.name)
    }
}
