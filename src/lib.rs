//! join-approver: bulk approval of pending Telegram join requests behind an HTTP trigger.
//! Hexagonal layout: domain, ports, use cases, adapters.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
