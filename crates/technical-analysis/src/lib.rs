pub mod indicators;
pub mod series;
pub mod params;
pub mod signals;
pub mod snapshot;
pub mod analyzer;
pub mod service;


pub use indicators::*;
pub use series::*;
pub use params::*;
pub use signals::*;
pub use snapshot::*;
pub use analyzer::*;
pub use service::*;
