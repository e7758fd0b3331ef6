//! Query engine, record store, request validation and the instruction executor.

mod executor;
mod query;
mod record;
mod validation;
pub use executor::{outcome_state, ExecutionJob, InstructionExecutor, InstructionRunner, SimulatedRunner};
pub use query::{ListQuery, Page, QueryEngine, MAX_PAGE_SIZE};
pub use record::RecordStore;
pub use validation::{is_business_key, RequestValidator};
