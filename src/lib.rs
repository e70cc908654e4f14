pub mod cli;
pub mod protocol;
pub mod session;

pub use protocol::{AdminOp, FacultyOp, Reply, Request, StudentOp, UserField};
pub use session::{AuthState, LoginOutcome, Role, Session, SessionError};
