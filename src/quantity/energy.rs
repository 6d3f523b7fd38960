quantity!(KilowattHours, suffix: "kWh", precision: 0);
quantity!(MegawattHours, suffix: "MWh", precision: 3);

impl From<KilowattHours> for MegawattHours {
    fn from(energy: KilowattHours) -> Self {
        Self(energy.0 / 1000.0)
    }
}
