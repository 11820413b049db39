use placement_primitives::{ProviderId, ResourceClass};

///
/// Inventory
/// Quantitative capacity of one resource class on one provider.
/// Effective capacity is `floor(total * allocation_ratio) - reserved`.
///

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Inventory {
    pub provider_id: ProviderId,
    pub resource_class: ResourceClass,
    pub total: u32,
    pub reserved: u32,
    pub min_unit: u32,
    pub max_unit: u32,
    pub step_size: u32,
    pub allocation_ratio: f32,
}

impl Inventory {
    #[must_use]
    pub fn capacity(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let scaled = (f64::from(self.total) * f64::from(self.allocation_ratio)).floor() as u32;
        scaled.saturating_sub(self.reserved)
    }

    /// Whether amount `n` can be drawn from this inventory given what is
    /// already allocated against it.
    #[must_use]
    pub fn is_assignable(&self, amount: u32, already_allocated: u32) -> bool {
        if amount < self.min_unit || amount > self.max_unit {
            return false;
        }
        if self.step_size > 0 && (amount - self.min_unit) % self.step_size != 0 {
            return false;
        }
        already_allocated.saturating_add(amount) <= self.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inv() -> Inventory {
        Inventory {
            provider_id: ProviderId::generate(),
            resource_class: ResourceClass::new("VCPU").unwrap(),
            total: 16,
            reserved: 2,
            min_unit: 1,
            max_unit: 8,
            step_size: 1,
            allocation_ratio: 1.0,
        }
    }

    #[test]
    fn capacity_applies_ratio_and_reserved() {
        let mut i = inv();
        i.allocation_ratio = 2.0;
        assert_eq!(i.capacity(), 30);
    }

    #[test]
    fn step_size_rejects_misaligned_amounts() {
        let mut i = inv();
        i.min_unit = 2;
        i.step_size = 2;
        assert!(i.is_assignable(4, 0));
        assert!(!i.is_assignable(3, 0));
    }

    #[test]
    fn already_allocated_reduces_availability() {
        let i = inv();
        assert!(i.is_assignable(8, 0));
        assert!(!i.is_assignable(8, 7));
    }
}
