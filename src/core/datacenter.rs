use serde::{Deserialize, Serialize};

use crate::quantity::{energy::KilowattHours, power::Kilowatts, ratios::Percentage};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Datacenter {
    pub id: String,
    pub name: String,
    pub region: String,
    pub capacity: Kilowatts,
    pub current_load: Kilowatts,
    pub battery_capacity: KilowattHours,
    pub battery_level: Percentage,
}

impl Datacenter {
    /// Share of the capacity currently in use.
    pub fn utilization(&self) -> Percentage {
        Percentage(100.0 * self.current_load.0 / self.capacity.0)
    }

    /// Energy currently stored in the battery.
    pub fn stored_energy(&self) -> KilowattHours {
        self.battery_capacity * self.battery_level.to_ratio()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_utilization_and_storage() {
        let datacenter = Datacenter {
            id: "dc-uk-1".to_string(),
            name: "London DC-1".to_string(),
            region: "UK South".to_string(),
            capacity: Kilowatts(5000.0),
            current_load: Kilowatts(3250.0),
            battery_capacity: KilowattHours(2000.0),
            battery_level: Percentage(65.0),
        };
        assert_abs_diff_eq!(datacenter.utilization().0, 65.0);
        assert_abs_diff_eq!(datacenter.stored_energy().0, 1300.0);
    }
}
