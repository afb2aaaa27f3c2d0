pub mod agents;
pub mod chat;
pub mod cli;
pub mod config;
pub mod doctor;
pub mod error;
pub mod intent;
pub mod llm;
pub mod orchestrator;
pub mod profiles;
pub mod prompts;
pub mod provider;
pub mod scope;
pub mod session;
pub mod telemetry;
pub mod tools;

#[cfg(test)]
mod tests;
