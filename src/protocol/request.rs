use std::fmt;

/// Leading token of a request line; the unit the session guard reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    Login,
    Admin,
    Student,
    Faculty,
    Exit,
}

impl fmt::Display for CommandClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            CommandClass::Login => "LOGIN",
            CommandClass::Admin => "ADMIN",
            CommandClass::Student => "STUDENT",
            CommandClass::Faculty => "FACULTY",
            CommandClass::Exit => "EXIT",
        };
        write!(f, "{keyword}")
    }
}

/// User-record field an administrator may rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Username,
    Password,
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserField::Username => write!(f, "username"),
            UserField::Password => write!(f, "password"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminOp {
    AddStudent { username: String, password: String },
    AddFaculty { username: String, password: String },
    ToggleStudent { user_id: u32 },
    UpdateUser { user_id: u32, field: UserField, value: String },
    ViewUsers,
    ViewCourses,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentOp {
    ViewCourses,
    ViewEnrolled,
    Enroll { code: String },
    Unenroll { code: String },
    ChangePassword { old: String, new: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacultyOp {
    AddCourse { code: String, seats: u32, name: String },
    RemoveCourse { code: String },
    ViewCourses,
    ViewEnrollments,
    ChangePassword { old: String, new: String },
}

/// A single protocol request, one wire line per value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Login { username: String, password: String },
    Admin { admin_id: u32, op: AdminOp },
    Student { student_id: u32, op: StudentOp },
    Faculty { faculty_id: u32, op: FacultyOp },
    Exit,
}

impl Request {
    pub fn class(&self) -> CommandClass {
        match self {
            Request::Login { .. } => CommandClass::Login,
            Request::Admin { .. } => CommandClass::Admin,
            Request::Student { .. } => CommandClass::Student,
            Request::Faculty { .. } => CommandClass::Faculty,
            Request::Exit => CommandClass::Exit,
        }
    }

    /// Render the wire line: tokens joined with single spaces, in fixed
    /// positional order. The grammar has no quoting; a field value that
    /// contains whitespace corrupts the frame, so callers validate first.
    /// The one exception is `ADD_COURSE`'s trailing course name, which the
    /// server reads as rest-of-line.
    pub fn encode(&self) -> String {
        match self {
            Request::Login { username, password } => format!("LOGIN {username} {password}"),
            Request::Admin { admin_id, op } => format!("ADMIN {admin_id} {op}"),
            Request::Student { student_id, op } => format!("STUDENT {student_id} {op}"),
            Request::Faculty { faculty_id, op } => format!("FACULTY {faculty_id} {op}"),
            Request::Exit => String::from("EXIT"),
        }
    }
}

impl fmt::Display for AdminOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminOp::AddStudent { username, password } => {
                write!(f, "ADD_STUDENT {username} {password}")
            }
            AdminOp::AddFaculty { username, password } => {
                write!(f, "ADD_FACULTY {username} {password}")
            }
            AdminOp::ToggleStudent { user_id } => write!(f, "TOGGLE_STUDENT {user_id}"),
            AdminOp::UpdateUser {
                user_id,
                field,
                value,
            } => write!(f, "UPDATE_USER {user_id} {field} {value}"),
            AdminOp::ViewUsers => write!(f, "VIEW_USERS"),
            AdminOp::ViewCourses => write!(f, "VIEW_COURSES"),
        }
    }
}

impl fmt::Display for StudentOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudentOp::ViewCourses => write!(f, "VIEW_COURSES"),
            StudentOp::ViewEnrolled => write!(f, "VIEW_ENROLLED"),
            StudentOp::Enroll { code } => write!(f, "ENROLL {code}"),
            StudentOp::Unenroll { code } => write!(f, "UNENROLL {code}"),
            StudentOp::ChangePassword { old, new } => write!(f, "CHANGE_PASSWORD {old} {new}"),
        }
    }
}

impl fmt::Display for FacultyOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacultyOp::AddCourse { code, seats, name } => {
                write!(f, "ADD_COURSE {code} {seats} {name}")
            }
            FacultyOp::RemoveCourse { code } => write!(f, "REMOVE_COURSE {code}"),
            FacultyOp::ViewCourses => write!(f, "VIEW_COURSES"),
            FacultyOp::ViewEnrollments => write!(f, "VIEW_ENROLLMENTS"),
            FacultyOp::ChangePassword { old, new } => write!(f, "CHANGE_PASSWORD {old} {new}"),
        }
    }
}
