//! Seeding daemon core: observes a game session and decides when to join a
//! server to help it fill up.

pub mod config;
pub mod coordinator;
pub mod decision;
pub mod event;
pub mod extract;
pub mod page_source;
pub mod paths;
pub mod pipeline;
pub mod process_watcher;
pub mod profile;
pub mod result_reason;
pub mod seeder;
pub mod servers;
pub mod session;
pub mod status;
pub mod window;
