//! Data Transfer Objects for REST response serialization.

pub mod relay_dto;

pub use relay_dto::*;
