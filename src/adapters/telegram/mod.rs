//! Telegram (MTProto) adapters: gateway, auth, session, mapping, and a mock gateway.

pub mod auth_adapter;
pub mod cache;
pub mod client;
pub mod mapper;
pub mod mock_gateway;
pub mod session;

pub use auth_adapter::GrammersAuthAdapter;
pub use client::GrammersTgGateway;
pub use mock_gateway::MockTgGateway;
