use placement_primitives::{ConsumerId, ProviderId, ResourceClass};

///
/// Allocation
/// A quantity of a resource class drawn by a consumer from a provider.
/// `used` is always positive; a zero-quantity allocation does not exist,
/// it is simply the absence of a row.
///

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Allocation {
    pub consumer_id: ConsumerId,
    pub provider_id: ProviderId,
    pub resource_class: ResourceClass,
    pub used: u32,
}
