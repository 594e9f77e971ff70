pub mod actor;
pub mod clock;
pub mod error;
pub mod module;
pub mod seq;
pub mod types;
pub mod workflow;

pub use actor::{Actor, Role};
pub use clock::{Clock, SystemClock};
pub use error::ServiceError;
pub use module::Module;
pub use seq::{request_number, ticket_number, RequestKind};
pub use types::{new_id, now_rfc3339, ListResult};
pub use workflow::Workflow;
