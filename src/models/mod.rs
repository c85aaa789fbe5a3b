//! Typed views of Entity Store records and the derived dashboard DTOs.

pub mod client;
pub mod contract;
pub mod dashboard;
pub mod invoice;
pub mod lenient;
pub mod pagination;
pub mod property;
pub mod user;
