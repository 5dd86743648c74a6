//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&DbPool` as the first argument. [`PoolFrameLookup`] adapts the
//! pool to the navigation resolver.

pub mod bscan_repo;
pub mod frame_lookup;
pub mod scan_repo;
pub mod stats_repo;

pub use bscan_repo::BScanRepo;
pub use frame_lookup::PoolFrameLookup;
pub use scan_repo::ScanRepo;
pub use stats_repo::StatsRepo;
