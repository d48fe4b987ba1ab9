pub mod config;
pub mod generator;
pub mod jtl;
pub mod profile;
pub mod record;
pub mod stats;

pub use config::*;
pub use generator::*;
pub use jtl::*;
pub use profile::*;
pub use record::*;
pub use stats::*;
