//! # Utility Modules
//!
//! Supporting utilities shared by the library and the binary.
//!
//! ## Components
//! - **Logging**: Structured logging configuration

pub mod logging;
