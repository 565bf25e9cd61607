//! Service layer: the relay core and its background listener.

pub mod listener;
pub mod relay_service;

pub use relay_service::{RelayService, StatusSnapshot};
