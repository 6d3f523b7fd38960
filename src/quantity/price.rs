use crate::quantity::{currency::Pounds, energy::MegawattHours};

quantity!(
    /// Wholesale energy price, pound sterling per megawatt-hour.
    MegawattHourPrice, suffix: "£/MWh", precision: 2
);

implement_mul!(MegawattHourPrice, MegawattHours, Pounds);
