//! Business-logic services and external collaborators.

pub mod contact_service;
pub mod email_service;
pub mod storage_service;
