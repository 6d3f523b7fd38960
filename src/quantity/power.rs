use std::ops::Mul;

use crate::quantity::{energy::KilowattHours, time::Minutes};

quantity!(Kilowatts, suffix: "kW", precision: 0);

impl Mul<Minutes> for Kilowatts {
    type Output = KilowattHours;

    fn mul(self, minutes: Minutes) -> Self::Output {
        KilowattHours(self.0 * minutes.0 / 60.0)
    }
}
