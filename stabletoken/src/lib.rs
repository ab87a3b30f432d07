pub mod abi;
pub mod addresses;
pub mod units;

pub use addresses::*;
pub use units::*;
