pub mod generator;

mod driver;

pub use self::driver::Simulation;
