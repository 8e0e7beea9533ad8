pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{Leg, Quadrant, SignRegime};
pub use error::CoreError;
pub use structs::{PairRow, PairedTable, PricePoint, PriceSeries, PriceTable, ReturnTable, SymbolPair};
