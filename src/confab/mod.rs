// src/confab/mod.rs

pub mod agent;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod gateway;
pub mod group;
pub mod roles;

// Let's explicitly export the core types so callers don't have to spell out
// confab::confab::agent::Agent and can reach them as confab::Agent instead.
pub use agent::Agent;
pub use gateway::CompletionGateway;
pub use group::Group;
