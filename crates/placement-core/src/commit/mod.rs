//! Commit protocol and atomicity guardrails for multi-row writes.
//!
//! Contract:
//! - `begin_commit` persists a marker that fully describes the mutations a
//!   write is about to make.
//! - Durable correctness is owned by the marker, not by any in-process
//!   rollback guard: if the process dies between `begin_commit` and
//!   `finish_commit`, `recover` can replay or discard the marker on the
//!   store's next use.
//! - `CommitApplyGuard` (see `guard`) is best-effort in-process cleanup
//!   only; it is not the atomicity authority.

mod guard;

pub use guard::CommitApplyGuard;

use crate::{
    error::{Error, ErrorOrigin},
    store::{Mutation, TransactionalStore},
};
use ulid::Ulid;

///
/// CommitKind
///

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub enum CommitKind {
    AllocationWrite,
    EntityWrite,
}

///
/// CommitMarker
/// Persisted mutation plan covering every row a write touches. Recovery
/// replays the marker exactly as stored; it is not forward-compatible and
/// is not a user-facing type.
///

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CommitMarker {
    pub id: u128,
    pub kind: CommitKind,
    pub mutations: Vec<Mutation>,
}

impl CommitMarker {
    #[must_use]
    pub fn new(kind: CommitKind, mutations: Vec<Mutation>) -> Self {
        Self {
            id: u128::from(Ulid::new()),
            kind,
            mutations,
        }
    }
}

///
/// CommitGuard
/// In-flight commit handle. Must not be leaked across mutation boundaries:
/// every `begin_commit` is paired with exactly one `finish_commit`.
///

#[derive(Clone, Debug)]
pub struct CommitGuard {
    pub marker: CommitMarker,
}

/// Persist a commit marker and open the commit window.
pub fn begin_commit(
    store: &dyn TransactionalStore,
    marker: CommitMarker,
) -> Result<CommitGuard, Error> {
    if store.load_marker()?.is_some() {
        return Err(Error::invariant_violation(
            ErrorOrigin::Store,
            "commit marker already present before begin",
        ));
    }
    store.persist_marker(&marker)?;
    Ok(CommitGuard { marker })
}

/// Apply the marker's mutations and clear it regardless of outcome.
///
/// The apply closure performs mechanical marker application only; any
/// in-process rollback guard it uses is non-authoritative transitional
/// cleanup. Durable atomicity remains owned by the marker protocol: a
/// crash here is recovered by `recover`, not by the guard.
pub fn finish_commit(store: &dyn TransactionalStore, guard: CommitGuard) -> Result<(), Error> {
    let result = store.apply(&guard.marker.mutations);
    store.clear_marker()?;
    result
}

/// Replay or discard whatever marker is currently persisted. Call this
/// before serving a write if the process may have restarted mid-commit.
pub fn recover(store: &dyn TransactionalStore) -> Result<(), Error> {
    if let Some(marker) = store.load_marker()? {
        store.apply(&marker.mutations)?;
        store.clear_marker()?;
    }
    Ok(())
}
