//! Include stitching: the merge join that folds join-flattened rows back
//! into owners and their related entities.
//!
//! Collection runs must arrive contiguous per owner and ordered by inner key
//! within the run. That ordering is supplied upstream and is not checked; a
//! stream that violates it produces wrong groupings.

use crate::{
    error::MaterializeError,
    materialize::{Materialized, Materializer, ResultCoordinator, read_key},
    model::{EntityRef, Navigation},
    shape::{CollectionInclude, ReferenceInclude},
    source::RowAccess,
};

impl Materializer<'_> {
    /// One-to-one include. Reads the related entity from the current row.
    pub(super) async fn stitch_reference(
        &self,
        include: &ReferenceInclude,
        owner: Option<&EntityRef>,
        access: &mut dyn RowAccess,
        coordinator: &mut ResultCoordinator,
    ) -> Result<(), MaterializeError> {
        let related = self
            .materialize(&include.related, access, coordinator)
            .await?;

        let Some(owner) = owner else {
            return Ok(());
        };

        self.mark_loaded(owner, &include.navigation)?;
        if let Materialized::Entity(related) = &related {
            self.fixup(owner, related, &include.navigation, include.inverse.as_ref())?;
        }

        Ok(())
    }

    /// One-to-many include. Consumes every row of the owner's run and leaves
    /// the first row past the run pending for the enclosing loop.
    pub(super) async fn stitch_collection(
        &self,
        include: &CollectionInclude,
        owner: Option<&EntityRef>,
        access: &mut dyn RowAccess,
        coordinator: &mut ResultCoordinator,
    ) -> Result<(), MaterializeError> {
        let Some(owner) = owner else {
            return Ok(());
        };

        self.mark_loaded(owner, &include.navigation)?;

        let mut inner_key = read_key(access.columns(), &include.inner_key, self.detailed_errors)?;
        let outer_key = read_key(access.columns(), &include.outer_key, self.detailed_errors)?;

        coordinator.clear_pending();
        let first = self
            .materialize(&include.related, access, coordinator)
            .await?;

        let Materialized::Entity(first) = first else {
            include.navigation.ensure_collection(owner)?;
            return Ok(());
        };
        self.fixup(owner, &first, &include.navigation, include.inverse.as_ref())?;

        let enclosing = coordinator.enter_collection(outer_key.clone());

        while coordinator.next_row(access).await? {
            let current_outer =
                read_key(access.columns(), &include.outer_key, self.detailed_errors)?;
            if current_outer != outer_key {
                coordinator.leave_row_pending();
                break;
            }

            let current_inner =
                read_key(access.columns(), &include.inner_key, self.detailed_errors)?;
            if current_inner == inner_key {
                // Same related row repeated by a deeper join.
                coordinator.record_duplicate();
                continue;
            }

            let related = self
                .materialize(&include.related, access, coordinator)
                .await?;
            if let Materialized::Entity(related) = &related {
                self.fixup(owner, related, &include.navigation, include.inverse.as_ref())?;
            }

            inner_key = current_inner;
        }

        coordinator.leave_collection(enclosing);

        Ok(())
    }

    fn mark_loaded(&self, owner: &EntityRef, navigation: &Navigation) -> Result<(), MaterializeError> {
        match self.tracker {
            Some(tracker) => tracker.mark_loaded(owner, navigation)?,
            None => navigation.mark_loaded(owner)?,
        }

        Ok(())
    }

    fn fixup(
        &self,
        owner: &EntityRef,
        related: &EntityRef,
        navigation: &Navigation,
        inverse: Option<&Navigation>,
    ) -> Result<(), MaterializeError> {
        match self.tracker {
            Some(tracker) => tracker.attach_fixup(owner, related, navigation)?,
            None => navigation.fixup(owner, related, inverse)?,
        }

        Ok(())
    }
}
