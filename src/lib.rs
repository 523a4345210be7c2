pub mod app;
pub mod auth;
pub mod catalog;
pub mod clock;
pub mod completion;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod household;
pub mod ledger;
pub mod models;
pub mod schedule;
pub mod session;
pub mod state;
pub mod stats;
pub mod storage;
pub mod store;

pub use app::router;
pub use config::AppConfig;
pub use state::AppState;
pub use storage::JsonStore;
