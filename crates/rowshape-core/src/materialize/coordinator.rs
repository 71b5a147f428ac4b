use crate::{error::MaterializeError, source::RowAccess, value::KeyTuple};

///
/// ResultCoordinator
///
/// Per-enumeration state shared across the whole shape tree.
///
/// `pending_advance` caches the outcome of an advance that already happened
/// but whose row has not been consumed yet: `None` means the position is
/// unknown and the next caller must advance, `Some(true)` means a row is
/// waiting, `Some(false)` means the stream is exhausted. A nested collection
/// loop that peeks one row past its run leaves `Some(true)` behind so the
/// enclosing loop does not advance twice.
///

#[derive(Debug, Default)]
pub struct ResultCoordinator {
    pending_advance: Option<bool>,
    active_outer_key: Option<KeyTuple>,
    rows_advanced: u64,
    duplicates_skipped: u64,
}

impl ResultCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn pending_advance(&self) -> Option<bool> {
        self.pending_advance
    }

    /// Outer key of the collection run currently being stitched.
    #[must_use]
    pub const fn active_outer_key(&self) -> Option<&KeyTuple> {
        self.active_outer_key.as_ref()
    }

    /// Advances that landed on a row.
    #[must_use]
    pub const fn rows_advanced(&self) -> u64 {
        self.rows_advanced
    }

    #[must_use]
    pub const fn duplicates_skipped(&self) -> u64 {
        self.duplicates_skipped
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self.pending_advance, Some(false))
    }

    /// Forget any cached advance outcome. End of stream is sticky.
    pub(crate) fn clear_pending(&mut self) {
        if !self.is_exhausted() {
            self.pending_advance = None;
        }
    }

    /// Reset per-root state before the root shape runs on a fresh row.
    pub(crate) fn begin_root(&mut self) {
        self.clear_pending();
        self.active_outer_key = None;
    }

    /// Hand a row that was read but not consumed back to the enclosing loop.
    pub(crate) const fn leave_row_pending(&mut self) {
        self.pending_advance = Some(true);
    }

    /// Move to the next row, consuming a cached outcome when there is one.
    pub(crate) async fn next_row(
        &mut self,
        access: &mut dyn RowAccess,
    ) -> Result<bool, MaterializeError> {
        match self.pending_advance {
            Some(false) => Ok(false),
            Some(true) => {
                self.pending_advance = None;
                Ok(true)
            }
            None => {
                let has_row = access.advance().await?;
                if has_row {
                    self.rows_advanced += 1;
                } else {
                    self.pending_advance = Some(false);
                }

                Ok(has_row)
            }
        }
    }

    /// Enter a collection run; returns the key of the enclosing run.
    pub(crate) fn enter_collection(&mut self, outer_key: KeyTuple) -> Option<KeyTuple> {
        self.active_outer_key.replace(outer_key)
    }

    pub(crate) fn leave_collection(&mut self, previous: Option<KeyTuple>) {
        self.active_outer_key = previous;
    }

    pub(crate) const fn record_duplicate(&mut self) {
        self.duplicates_skipped += 1;
    }
}
