pub mod record;
pub mod repository;
pub mod store;

pub use record::{BarrierRow, NormalizedRecord, BARRIER_HEADER, HEADER};
pub use repository::{FetchMeta, Repository, SharedRepository};
pub use store::{CsvTableStore, TableStore};
