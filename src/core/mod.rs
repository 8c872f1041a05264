//! Content integrity and hierarchy management.
//!
//! The cross-entity rules the CRUD handlers thread through: singleton
//! flags, the folder tree, timeline date consistency, polymorphic
//! association cleanup, and the multi-table delete coordinator. Each
//! function runs over the caller's connection or transaction so a whole
//! operation commits or rolls back as one unit.

pub mod assoc;
pub mod content_kind;
pub mod hierarchy;
pub mod lifecycle;
pub mod singleton;
pub mod timeline;
