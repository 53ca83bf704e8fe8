//! UI layer for the desktop GUI: the form and confirmation screens plus
//! avatar texture handling.

pub mod app;
pub mod textures;

pub use app::{AppViewState, TicketApp};
