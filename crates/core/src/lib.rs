//! Domain logic for the B-scan labeler: preview rendering and caching,
//! frame navigation, completion statistics, and scan import/export.
//!
//! Nothing here talks to the database; persistence lives in `bscan_db` and
//! plugs in through [`navigation::FrameLookup`].

pub mod error;
pub mod export;
pub mod importer;
pub mod label;
pub mod navigation;
pub mod normalize;
pub mod preview;
pub mod stats;
pub mod types;
