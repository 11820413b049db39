use crate::model::Generation;
use placement_primitives::ConsumerId;

///
/// Consumer
/// Holder of zero or more allocations. Implicitly created on first
/// allocation and removed when its bundle becomes empty.
///

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Consumer {
    pub id: ConsumerId,
    pub project_id: String,
    pub user_id: String,
    pub generation: Option<Generation>,
}

impl Consumer {
    #[must_use]
    pub const fn new(id: ConsumerId, project_id: String, user_id: String) -> Self {
        Self {
            id,
            project_id,
            user_id,
            generation: None,
        }
    }
}
