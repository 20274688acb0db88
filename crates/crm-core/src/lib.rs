pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod filter;
pub mod list;
pub mod models;
pub mod notice;
pub mod poller;
pub mod search;
pub mod selection;
pub mod session;
pub mod stats;
pub mod store;
pub mod tracing_setup;
pub mod validation;

// Re-export the types most screens need at crate root for convenience
pub use api::ApiClient;
pub use config::{CoreConfig, PollConfig};
pub use error::{CrmError, Result};
pub use filter::{FilterState, Predicate};
pub use list::RecordList;
pub use models::{Lead, Prospect, Record, Role, Sale, User, Visit};
pub use poller::{spawn_poller, Backoff, Subscription};
pub use selection::Selection;
pub use session::{Session, SessionContext};
pub use stats::DashboardSummary;
pub use store::{CrmData, Directory, Fixture, RecordStore};
