mod client;
pub mod relay;
