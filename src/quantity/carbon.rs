use crate::quantity::energy::KilowattHours;

quantity!(
    /// Grid carbon intensity, grams of CO₂ per kilowatt-hour.
    CarbonIntensity, suffix: "gCO₂/kWh", precision: 0
);
quantity!(Grams, suffix: "g", precision: 0);
quantity!(Kilograms, suffix: "kg", precision: 2);

implement_mul!(CarbonIntensity, KilowattHours, Grams);

impl From<Grams> for Kilograms {
    fn from(grams: Grams) -> Self {
        Self(grams.0 / 1000.0)
    }
}
