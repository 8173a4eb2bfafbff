//! Value types decoded from the wire.

mod price;
mod quantity;
mod symbol;
mod timestamp;

pub use price::Price;
pub use quantity::Quantity;
pub use symbol::Symbol;
pub use timestamp::Timestamp;
