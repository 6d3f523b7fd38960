#[macro_use]
pub mod macros;

pub mod carbon;
pub mod currency;
pub mod energy;
pub mod power;
pub mod price;
pub mod ratios;
pub mod time;
