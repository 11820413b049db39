//! Placement: resource-provider tree, inventory, and allocation-candidate
//! solver, assembled from `placement-core` and `placement-primitives`.

pub use placement_core::{
    commit,
    entity::{self, EntityStore},
    error, index, model, query,
    solver::{self, ProviderSummary, ResourceUsage, Solver, SolverConfig, SolverLimits, SolveReport},
    store,
    writer::{self, AllocationWriter},
};
pub use placement_primitives as primitives;

pub mod prelude {
    pub use placement_core::prelude::*;
    pub use placement_primitives::prelude::*;
}
