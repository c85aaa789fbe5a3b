//! Gateway services: Entity Store access, sessions, dashboard aggregation.

pub mod aggregator;
pub mod dashboard;
pub mod entity_store;
pub mod session;
