pub mod dto;
pub mod record_service;
