//! Browsing Module
//!
//! Everything a front end needs to present a volume and collect a track
//! selection:
//! - Song catalog
//! - Track selection state
//! - Session state machine

pub mod catalog;
pub mod selection;
pub mod session;

pub use catalog::{Catalog, CatalogEntry};
pub use selection::{track_label, SelectionState};
pub use session::{Session, SessionState};
