pub mod data;
pub mod directory;
pub mod fixture;
pub mod ids;
pub mod record_store;

pub use data::CrmData;
pub use directory::Directory;
pub use fixture::Fixture;
pub use ids::IdAllocator;
pub use record_store::RecordStore;
