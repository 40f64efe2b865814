//! Relation substrate adapters

mod file_relation;

pub use file_relation::{FileRelationAdapter, InboundDocument};
