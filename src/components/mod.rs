pub mod curves;
pub mod histogram;
pub mod layers;
