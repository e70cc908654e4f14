//! Session state machine.
//!
//! A [`Session`] owns the connection to the portal server and the current
//! authentication state, and is the sole authority on which requests may be
//! issued. Every operation is checked against [`Session::can_issue`] before
//! a single byte is built or sent; the server would also reject a
//! mis-scoped request, but the client never relies on that.
use std::fmt;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::str::FromStr;

use log::info;
use thiserror::Error;

use crate::protocol::{
    AdminOp, CommandClass, FacultyOp, LineTransport, LoginReply, Reply, Request, StudentOp,
    TransportError,
};

/// Authenticated identity kind, as the server names it on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Student,
    Faculty,
}

impl Role {
    /// Command class this role is scoped to.
    pub fn class(self) -> CommandClass {
        match self {
            Role::Admin => CommandClass::Admin,
            Role::Student => CommandClass::Student,
            Role::Faculty => CommandClass::Faculty,
        }
    }
}

#[derive(Debug, Error)]
#[error("unrecognized role '{0}'")]
pub struct UnknownRole(String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "STUDENT" => Ok(Role::Student),
            "FACULTY" => Ok(Role::Faculty),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::Student => write!(f, "STUDENT"),
            Role::Faculty => write!(f, "FACULTY"),
        }
    }
}

/// Where the session stands in the authentication lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated { role: Role, user_id: u32 },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("'{class}' requests are not permitted in the current session state")]
    Forbidden { class: CommandClass },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// What a login attempt came back with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Granted { role: Role, user_id: u32 },
    Denied { detail: String },
}

/// One authenticated connection to the portal server.
///
/// Generic over the underlying stream so the state machine is testable
/// against scripted in-memory transports.
pub struct Session<T: Read + Write> {
    transport: LineTransport<T>,
    auth: AuthState,
}

impl Session<TcpStream> {
    /// Connect to the portal server. Failure here is fatal to the client;
    /// there is no retry policy.
    pub fn connect(address: SocketAddr) -> Result<Self, SessionError> {
        let transport = LineTransport::connect(address)?;
        Ok(Self::new(transport))
    }
}

impl<T: Read + Write> Session<T> {
    pub fn new(transport: LineTransport<T>) -> Self {
        Self {
            transport,
            auth: AuthState::Unauthenticated,
        }
    }

    pub fn auth(&self) -> AuthState {
        self.auth
    }

    /// Whether a request of the given class may be issued right now.
    ///
    /// Unauthenticated sessions may only log in or exit; authenticated
    /// sessions may only issue their own role's class or exit. Logging in
    /// twice requires an explicit logout first.
    pub fn can_issue(&self, class: CommandClass) -> bool {
        match self.auth {
            AuthState::Unauthenticated => {
                matches!(class, CommandClass::Login | CommandClass::Exit)
            }
            AuthState::Authenticated { role, .. } => {
                class == role.class() || class == CommandClass::Exit
            }
        }
    }

    fn guard(&self, class: CommandClass) -> Result<(), SessionError> {
        if self.can_issue(class) {
            Ok(())
        } else {
            Err(SessionError::Forbidden { class })
        }
    }

    /// Authenticated user id, provided the guard admits the class.
    fn scoped_id(&self, class: CommandClass) -> Result<u32, SessionError> {
        self.guard(class)?;
        match self.auth {
            AuthState::Authenticated { user_id, .. } => Ok(user_id),
            AuthState::Unauthenticated => Err(SessionError::Forbidden { class }),
        }
    }

    /// Attempt to authenticate. On success the session holds the granted
    /// role and user id until [`Session::logout`]. A denial leaves the
    /// session unauthenticated; the caller may retry indefinitely.
    ///
    /// A `LOGIN_SUCCESS` acknowledgement whose role or id fields do not
    /// decode is reported as a denial rather than half-authenticating the
    /// session.
    pub fn login(&mut self, username: &str, password: &str) -> Result<LoginOutcome, SessionError> {
        self.guard(CommandClass::Login)?;

        let request = Request::Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        let line = self.transport.exchange(&request.encode())?;

        match LoginReply::from(line.as_str()) {
            LoginReply::Granted { role, user_id } => {
                match (Role::from_str(&role), u32::try_from(user_id)) {
                    (Ok(role), Ok(user_id)) => {
                        self.auth = AuthState::Authenticated { role, user_id };
                        info!("authenticated as {role} (user {user_id})");
                        Ok(LoginOutcome::Granted { role, user_id })
                    }
                    _ => Ok(LoginOutcome::Denied {
                        detail: format!("malformed login acknowledgement '{line}'"),
                    }),
                }
            }
            LoginReply::Denied { detail } => Ok(LoginOutcome::Denied { detail }),
        }
    }

    /// Issue an administrator operation.
    pub fn admin(&mut self, op: AdminOp) -> Result<Reply, SessionError> {
        let admin_id = self.scoped_id(CommandClass::Admin)?;
        self.round_trip(&Request::Admin { admin_id, op })
    }

    /// Issue a student operation.
    pub fn student(&mut self, op: StudentOp) -> Result<Reply, SessionError> {
        let student_id = self.scoped_id(CommandClass::Student)?;
        self.round_trip(&Request::Student { student_id, op })
    }

    /// Issue a faculty operation.
    pub fn faculty(&mut self, op: FacultyOp) -> Result<Reply, SessionError> {
        let faculty_id = self.scoped_id(CommandClass::Faculty)?;
        self.round_trip(&Request::Faculty { faculty_id, op })
    }

    /// Forget the authenticated identity and return to the login state.
    ///
    /// The protocol has no logout acknowledgement; nothing is sent to the
    /// server.
    pub fn logout(&mut self) {
        if let AuthState::Authenticated { role, user_id } = self.auth {
            info!("logged out {role} (user {user_id})");
        }
        self.auth = AuthState::Unauthenticated;
    }

    /// Notify the server that the client is going away, then release the
    /// connection. Legal from any state; the response and any transport
    /// failure during the farewell are discarded.
    pub fn exit(mut self) {
        let _ = self.transport.exchange(&Request::Exit.encode());
        // Dropping the transport closes the connection.
    }

    /// One request out, one reply back. Role operations are self-loops:
    /// the authentication state is never touched, including after a
    /// successful password change.
    fn round_trip(&mut self, request: &Request) -> Result<Reply, SessionError> {
        let line = self.transport.exchange(&request.encode())?;
        Ok(Reply::from(line.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io::{self, Read, Write};
    use std::rc::Rc;

    use super::*;

    /// In-memory duplex stream: canned responses on the read side, a
    /// shared byte log on the write side.
    struct ScriptedStream {
        responses: VecDeque<io::Result<Vec<u8>>>,
        written: Rc<RefCell<Vec<u8>>>,
    }

    impl ScriptedStream {
        fn new() -> Self {
            Self {
                responses: VecDeque::new(),
                written: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn respond(mut self, line: &str) -> Self {
            self.responses.push_back(Ok(line.as_bytes().to_vec()));
            self
        }

        fn fail(mut self, kind: io::ErrorKind) -> Self {
            self.responses.push_back(Err(io::Error::from(kind)));
            self
        }

        fn write_log(&self) -> Rc<RefCell<Vec<u8>>> {
            Rc::clone(&self.written)
        }
    }

    impl Read for ScriptedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.responses.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    impl Write for ScriptedStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn scripted(stream: ScriptedStream) -> Session<ScriptedStream> {
        Session::new(LineTransport::new(stream))
    }

    #[test]
    fn login_grants_and_transitions() {
        let mut session = scripted(ScriptedStream::new().respond("LOGIN_SUCCESS STUDENT 42"));

        let outcome = session.login("alice", "secret").unwrap();
        assert_eq!(
            outcome,
            LoginOutcome::Granted {
                role: Role::Student,
                user_id: 42
            }
        );
        assert_eq!(
            session.auth(),
            AuthState::Authenticated {
                role: Role::Student,
                user_id: 42
            }
        );
    }

    #[test]
    fn login_denied_stays_unauthenticated() {
        let mut session = scripted(ScriptedStream::new().respond("ERROR Invalid credentials"));

        let outcome = session.login("alice", "wrongpass").unwrap();
        assert_eq!(
            outcome,
            LoginOutcome::Denied {
                detail: String::from("Invalid credentials")
            }
        );
        assert_eq!(session.auth(), AuthState::Unauthenticated);
    }

    #[test]
    fn login_malformed_acknowledgement_stays_unauthenticated() {
        let mut session = scripted(ScriptedStream::new().respond("LOGIN_SUCCESS OVERLORD 3"));

        let outcome = session.login("alice", "secret").unwrap();
        assert!(matches!(outcome, LoginOutcome::Denied { .. }));
        assert_eq!(session.auth(), AuthState::Unauthenticated);
    }

    #[test]
    fn unauthenticated_role_request_sends_nothing() {
        let stream = ScriptedStream::new();
        let written = stream.write_log();
        let mut session = scripted(stream);

        let res = session.student(StudentOp::ViewCourses);
        assert!(matches!(
            res,
            Err(SessionError::Forbidden {
                class: CommandClass::Student
            })
        ));
        assert!(written.borrow().is_empty());
    }

    #[test]
    fn cross_role_request_sends_nothing() {
        let stream = ScriptedStream::new().respond("LOGIN_SUCCESS STUDENT 42");
        let written = stream.write_log();
        let mut session = scripted(stream);
        session.login("alice", "secret").unwrap();
        let sent_by_login = written.borrow().len();

        let res = session.admin(AdminOp::ViewUsers);
        assert!(matches!(
            res,
            Err(SessionError::Forbidden {
                class: CommandClass::Admin
            })
        ));
        assert_eq!(written.borrow().len(), sent_by_login);
    }

    #[test]
    fn login_while_authenticated_rejected() {
        let mut session = scripted(ScriptedStream::new().respond("LOGIN_SUCCESS ADMIN 1"));
        session.login("root", "toor").unwrap();

        let res = session.login("root", "toor");
        assert!(matches!(
            res,
            Err(SessionError::Forbidden {
                class: CommandClass::Login
            })
        ));
    }

    #[test]
    fn student_enroll_round_trip() {
        let mut session = scripted(
            ScriptedStream::new()
                .respond("LOGIN_SUCCESS STUDENT 42")
                .respond("ENROLLED"),
        );
        session.login("alice", "secret").unwrap();

        let reply = session
            .student(StudentOp::Enroll {
                code: String::from("CS101"),
            })
            .unwrap();
        assert_eq!(reply, Reply::Body(String::from("ENROLLED")));
    }

    #[test]
    fn server_error_keeps_session() {
        let mut session = scripted(
            ScriptedStream::new()
                .respond("LOGIN_SUCCESS STUDENT 42")
                .respond("ERROR Course is full"),
        );
        session.login("alice", "secret").unwrap();

        let reply = session
            .student(StudentOp::Enroll {
                code: String::from("CS305"),
            })
            .unwrap();
        assert_eq!(
            reply,
            Reply::Err {
                detail: String::from("Course is full")
            }
        );
        assert_eq!(
            session.auth(),
            AuthState::Authenticated {
                role: Role::Student,
                user_id: 42
            }
        );
    }

    #[test]
    fn transport_failure_keeps_auth_state() {
        let mut session = scripted(
            ScriptedStream::new()
                .respond("LOGIN_SUCCESS STUDENT 42")
                .fail(io::ErrorKind::ConnectionReset),
        );
        session.login("alice", "secret").unwrap();

        let res = session.student(StudentOp::Enroll {
            code: String::from("CS101"),
        });
        assert!(matches!(res, Err(SessionError::Transport(_))));
        assert_eq!(
            session.auth(),
            AuthState::Authenticated {
                role: Role::Student,
                user_id: 42
            }
        );
    }

    #[test]
    fn requests_carry_session_user_id() {
        let stream = ScriptedStream::new()
            .respond("LOGIN_SUCCESS FACULTY 7")
            .respond("COURSE_ADDED");
        let written = stream.write_log();
        let mut session = scripted(stream);
        session.login("knuth", "surreal").unwrap();

        session
            .faculty(FacultyOp::AddCourse {
                code: String::from("CS101"),
                seats: 30,
                name: String::from("Intro to CS"),
            })
            .unwrap();

        let written = String::from_utf8(written.borrow().clone()).unwrap();
        assert_eq!(
            written,
            "LOGIN knuth surrealFACULTY 7 ADD_COURSE CS101 30 Intro to CS"
        );
    }

    #[test]
    fn logout_returns_to_login_state() {
        let mut session = scripted(
            ScriptedStream::new()
                .respond("LOGIN_SUCCESS ADMIN 1")
                .respond("LOGIN_SUCCESS STUDENT 9"),
        );
        session.login("root", "toor").unwrap();

        session.logout();
        assert_eq!(session.auth(), AuthState::Unauthenticated);

        // A fresh login is permitted again.
        let outcome = session.login("bob", "pw").unwrap();
        assert_eq!(
            outcome,
            LoginOutcome::Granted {
                role: Role::Student,
                user_id: 9
            }
        );
    }

    #[test]
    fn change_password_keeps_session() {
        let mut session = scripted(
            ScriptedStream::new()
                .respond("LOGIN_SUCCESS STUDENT 42")
                .respond("PASSWORD_CHANGED")
                .respond("CS101 | Intro to CS | 12/30"),
        );
        session.login("alice", "secret").unwrap();

        let reply = session
            .student(StudentOp::ChangePassword {
                old: String::from("secret"),
                new: String::from("sesame"),
            })
            .unwrap();
        assert!(reply.is_ok());
        assert_eq!(
            session.auth(),
            AuthState::Authenticated {
                role: Role::Student,
                user_id: 42
            }
        );

        // Still able to issue follow-up operations without re-login.
        let reply = session.student(StudentOp::ViewCourses).unwrap();
        assert!(reply.is_ok());
    }

    #[test]
    fn can_issue_matrix() {
        let unauthenticated = scripted(ScriptedStream::new());
        assert!(unauthenticated.can_issue(CommandClass::Login));
        assert!(unauthenticated.can_issue(CommandClass::Exit));
        assert!(!unauthenticated.can_issue(CommandClass::Admin));
        assert!(!unauthenticated.can_issue(CommandClass::Student));
        assert!(!unauthenticated.can_issue(CommandClass::Faculty));

        let mut faculty = scripted(ScriptedStream::new().respond("LOGIN_SUCCESS FACULTY 7"));
        faculty.login("knuth", "surreal").unwrap();
        assert!(faculty.can_issue(CommandClass::Faculty));
        assert!(faculty.can_issue(CommandClass::Exit));
        assert!(!faculty.can_issue(CommandClass::Login));
        assert!(!faculty.can_issue(CommandClass::Admin));
        assert!(!faculty.can_issue(CommandClass::Student));
    }

    #[test]
    fn exit_notifies_server() {
        let stream = ScriptedStream::new().respond("GOODBYE");
        let written = stream.write_log();
        let session = scripted(stream);

        // Legal from any state; the response is discarded.
        session.exit();
        assert_eq!(written.borrow().as_slice(), b"EXIT");
    }

    #[test]
    fn exit_swallows_transport_failure() {
        // The farewell must not panic even on a dead connection.
        let session = scripted(ScriptedStream::new().fail(io::ErrorKind::BrokenPipe));
        session.exit();
    }
}
