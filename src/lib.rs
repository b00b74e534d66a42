//! Lending kiosk
//!
//! Controller for a self-service book lending desk: a user taps an ID card,
//! scans a book barcode, and the desk borrows or returns the book against
//! the library catalog, with spoken and on-screen feedback.

pub mod config;
pub mod devices;
pub mod error;
pub mod input;
pub mod logging;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
