//! UI layer for the reservation window.

pub mod app;

pub use app::{ReservationApp, StartupConfig};
