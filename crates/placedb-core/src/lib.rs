pub mod config;
pub mod error;
pub mod filter;
pub mod geo;
pub mod ids;
pub mod region;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use geo::GeoPoint;
pub use region::Region;
pub use types::{CategoryQuery, Place, PlaceCategory};
