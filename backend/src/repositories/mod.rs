//! Persistence layer: one repository per entity.

pub mod contact_repository;
pub mod user_repository;
