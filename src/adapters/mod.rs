//! Infrastructure adapters. Implement ports.
//!
//! Telegram (outbound), HTTP and terminal (inbound). Map errors to DomainError.

pub mod http;
pub mod telegram;
pub mod ui;
