//! Change-tracking collaborator contract.
//!
//! In tracked mode the stitcher hands loading and fixup to the tracker
//! instead of assigning navigations itself.

use crate::model::{EntityRef, ModelError, Navigation};

///
/// ChangeTracker
///

pub trait ChangeTracker: Send + Sync {
    /// Record that `navigation` on `entity` is fully loaded.
    fn mark_loaded(&self, entity: &EntityRef, navigation: &Navigation) -> Result<(), ModelError>;

    /// Link `related` to `owner` through `navigation` (and any inverse the
    /// tracker knows about).
    fn attach_fixup(
        &self,
        owner: &EntityRef,
        related: &EntityRef,
        navigation: &Navigation,
    ) -> Result<(), ModelError>;
}
