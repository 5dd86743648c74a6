pub mod bscans;
pub mod cache;
pub mod export;
pub mod scans;
pub mod stats;
