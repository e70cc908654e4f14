use std::error::Error;
use std::io::{self, BufRead, Write};
use std::net::{IpAddr, SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use academia::cli::{prompt_field, prompt_line, prompt_number};
use academia::{
    AdminOp, FacultyOp, LoginOutcome, Reply, Role, Session, SessionError, StudentOp, UserField,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Portal server host
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,
    /// Portal server port
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

/// How a dashboard loop ended.
enum Dashboard {
    Logout,
    Quit,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&interrupted);
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;
    }

    let address = SocketAddr::new(cli.host, cli.port);
    let mut session = Session::connect(address)?;
    println!("Connected to Academia Portal Server");

    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout();
    let result = run(&mut session, &mut stdin, &mut stdout, &interrupted);

    // Every termination path notifies the server and drops the connection.
    session.exit();
    println!("\nExiting client application...");

    match result {
        // End-of-input on stdin is an ordinary way to leave.
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(()),
        other => other.map_err(Into::into),
    }
}

fn run<R, W>(
    session: &mut Session<TcpStream>,
    reader: &mut R,
    writer: &mut W,
    interrupted: &AtomicBool,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
{
    while !interrupted.load(Ordering::SeqCst) {
        let role = match login_menu(session, reader, writer, interrupted)? {
            Some(role) => role,
            None => break,
        };

        let outcome = match role {
            Role::Admin => admin_menu(session, reader, writer, interrupted)?,
            Role::Student => student_menu(session, reader, writer, interrupted)?,
            Role::Faculty => faculty_menu(session, reader, writer, interrupted)?,
        };

        match outcome {
            Dashboard::Logout => {
                session.logout();
                writeln!(writer, "Logged out successfully.")?;
                pause(reader, writer)?;
            }
            Dashboard::Quit => break,
        }
    }

    Ok(())
}

/// Prompt for credentials until the server grants a login or the user
/// interrupts. Denials and transport failures are shown and retried.
fn login_menu<R, W>(
    session: &mut Session<TcpStream>,
    reader: &mut R,
    writer: &mut W,
    interrupted: &AtomicBool,
) -> io::Result<Option<Role>>
where
    R: BufRead,
    W: Write,
{
    while !interrupted.load(Ordering::SeqCst) {
        clear_screen(writer)?;
        title(writer, "Academia Portal - Login")?;

        let username = prompt_field(reader, writer, "Username")?;
        let password = prompt_field(reader, writer, "Password")?;

        match session.login(&username, &password) {
            Ok(LoginOutcome::Granted { role, .. }) => {
                success(reader, writer, "Login successful!")?;
                return Ok(Some(role));
            }
            Ok(LoginOutcome::Denied { detail }) => {
                failure(reader, writer, &format!("Login failed: {detail}"))?;
            }
            Err(e) => failure(reader, writer, &e.to_string())?,
        }
    }

    Ok(None)
}

fn admin_menu<R, W>(
    session: &mut Session<TcpStream>,
    reader: &mut R,
    writer: &mut W,
    interrupted: &AtomicBool,
) -> io::Result<Dashboard>
where
    R: BufRead,
    W: Write,
{
    while !interrupted.load(Ordering::SeqCst) {
        clear_screen(writer)?;
        title(writer, "Admin Dashboard")?;
        writeln!(writer, "1. Add Student")?;
        writeln!(writer, "2. Add Faculty")?;
        writeln!(writer, "3. Activate/Deactivate Student")?;
        writeln!(writer, "4. Update Student/Faculty details")?;
        writeln!(writer, "5. View All Users")?;
        writeln!(writer, "6. View All Courses")?;
        writeln!(writer, "7. Logout")?;
        writeln!(writer, "8. Exit")?;

        match prompt_number(reader, writer, "\nEnter your choice")? {
            1 => {
                clear_screen(writer)?;
                title(writer, "Add New Student")?;
                let username = prompt_field(reader, writer, "Enter username")?;
                let password = prompt_field(reader, writer, "Enter password")?;
                let reply = session.admin(AdminOp::AddStudent { username, password });
                report(reader, writer, reply)?;
            }
            2 => {
                clear_screen(writer)?;
                title(writer, "Add New Faculty")?;
                let username = prompt_field(reader, writer, "Enter username")?;
                let password = prompt_field(reader, writer, "Enter password")?;
                let reply = session.admin(AdminOp::AddFaculty { username, password });
                report(reader, writer, reply)?;
            }
            3 => {
                clear_screen(writer)?;
                title(writer, "Activate/Deactivate Student")?;
                let user_id = prompt_number(reader, writer, "Enter student ID")?;
                let reply = session.admin(AdminOp::ToggleStudent { user_id });
                report(reader, writer, reply)?;
            }
            4 => {
                clear_screen(writer)?;
                title(writer, "Update User Details")?;
                let user_id = prompt_number(reader, writer, "Enter user ID")?;
                let field = prompt_user_field(reader, writer)?;
                let value = prompt_field(reader, writer, "Enter new value")?;
                let reply = session.admin(AdminOp::UpdateUser {
                    user_id,
                    field,
                    value,
                });
                report(reader, writer, reply)?;
            }
            5 => {
                clear_screen(writer)?;
                title(writer, "All Users")?;
                let reply = session.admin(AdminOp::ViewUsers);
                listing(reader, writer, reply)?;
            }
            6 => {
                clear_screen(writer)?;
                title(writer, "All Courses")?;
                let reply = session.admin(AdminOp::ViewCourses);
                listing(reader, writer, reply)?;
            }
            7 => return Ok(Dashboard::Logout),
            8 => return Ok(Dashboard::Quit),
            _ => failure(reader, writer, "Invalid choice!")?,
        }
    }

    Ok(Dashboard::Quit)
}

fn student_menu<R, W>(
    session: &mut Session<TcpStream>,
    reader: &mut R,
    writer: &mut W,
    interrupted: &AtomicBool,
) -> io::Result<Dashboard>
where
    R: BufRead,
    W: Write,
{
    while !interrupted.load(Ordering::SeqCst) {
        clear_screen(writer)?;
        title(writer, "Student Dashboard")?;
        writeln!(writer, "1. Enroll to new Courses")?;
        writeln!(writer, "2. Unenroll from already enrolled Courses")?;
        writeln!(writer, "3. View enrolled Courses")?;
        writeln!(writer, "4. View all available Courses")?;
        writeln!(writer, "5. Change Password")?;
        writeln!(writer, "6. Logout")?;
        writeln!(writer, "7. Exit")?;

        match prompt_number(reader, writer, "\nEnter your choice")? {
            1 => {
                clear_screen(writer)?;
                title(writer, "Enroll to New Course")?;
                // Show what is on offer before asking for a code.
                preview(writer, session.student(StudentOp::ViewCourses))?;
                let code = prompt_field(reader, writer, "\nEnter course code to enroll")?;
                let reply = session.student(StudentOp::Enroll { code });
                report(reader, writer, reply)?;
            }
            2 => {
                clear_screen(writer)?;
                title(writer, "Unenroll from Course")?;
                preview(writer, session.student(StudentOp::ViewEnrolled))?;
                let code = prompt_field(reader, writer, "\nEnter course code to unenroll")?;
                let reply = session.student(StudentOp::Unenroll { code });
                report(reader, writer, reply)?;
            }
            3 => {
                clear_screen(writer)?;
                title(writer, "Your Enrolled Courses")?;
                let reply = session.student(StudentOp::ViewEnrolled);
                listing(reader, writer, reply)?;
            }
            4 => {
                clear_screen(writer)?;
                title(writer, "All Available Courses")?;
                let reply = session.student(StudentOp::ViewCourses);
                listing(reader, writer, reply)?;
            }
            5 => {
                clear_screen(writer)?;
                title(writer, "Change Password")?;
                let old = prompt_field(reader, writer, "Enter current password")?;
                let new = prompt_field(reader, writer, "Enter new password")?;
                let reply = session.student(StudentOp::ChangePassword { old, new });
                report(reader, writer, reply)?;
            }
            6 => return Ok(Dashboard::Logout),
            7 => return Ok(Dashboard::Quit),
            _ => failure(reader, writer, "Invalid choice!")?,
        }
    }

    Ok(Dashboard::Quit)
}

fn faculty_menu<R, W>(
    session: &mut Session<TcpStream>,
    reader: &mut R,
    writer: &mut W,
    interrupted: &AtomicBool,
) -> io::Result<Dashboard>
where
    R: BufRead,
    W: Write,
{
    while !interrupted.load(Ordering::SeqCst) {
        clear_screen(writer)?;
        title(writer, "Faculty Dashboard")?;
        writeln!(writer, "1. Add new Course")?;
        writeln!(writer, "2. Remove offered Course")?;
        writeln!(writer, "3. View enrollments in Courses")?;
        writeln!(writer, "4. View your Courses")?;
        writeln!(writer, "5. Change Password")?;
        writeln!(writer, "6. Logout")?;
        writeln!(writer, "7. Exit")?;

        match prompt_number(reader, writer, "\nEnter your choice")? {
            1 => {
                clear_screen(writer)?;
                title(writer, "Add New Course")?;
                let code = prompt_field(reader, writer, "Enter course code")?;
                let seats = prompt_number(reader, writer, "Enter total seats")?;
                // Course names may contain spaces; the grammar takes the
                // rest of the line.
                let name = prompt_line(reader, writer, "Enter course name")?;
                let reply = session.faculty(FacultyOp::AddCourse { code, seats, name });
                report(reader, writer, reply)?;
            }
            2 => {
                clear_screen(writer)?;
                title(writer, "Remove Course")?;
                preview(writer, session.faculty(FacultyOp::ViewCourses))?;
                let code = prompt_field(reader, writer, "\nEnter course code to remove")?;
                let reply = session.faculty(FacultyOp::RemoveCourse { code });
                report(reader, writer, reply)?;
            }
            3 => {
                clear_screen(writer)?;
                title(writer, "Course Enrollments")?;
                let reply = session.faculty(FacultyOp::ViewEnrollments);
                listing(reader, writer, reply)?;
            }
            4 => {
                clear_screen(writer)?;
                title(writer, "Your Courses")?;
                let reply = session.faculty(FacultyOp::ViewCourses);
                listing(reader, writer, reply)?;
            }
            5 => {
                clear_screen(writer)?;
                title(writer, "Change Password")?;
                let old = prompt_field(reader, writer, "Enter current password")?;
                let new = prompt_field(reader, writer, "Enter new password")?;
                let reply = session.faculty(FacultyOp::ChangePassword { old, new });
                report(reader, writer, reply)?;
            }
            6 => return Ok(Dashboard::Logout),
            7 => return Ok(Dashboard::Quit),
            _ => failure(reader, writer, "Invalid choice!")?,
        }
    }

    Ok(Dashboard::Quit)
}

fn prompt_user_field<R, W>(reader: &mut R, writer: &mut W) -> io::Result<UserField>
where
    R: BufRead,
    W: Write,
{
    loop {
        let field = prompt_field(reader, writer, "What to update (username/password)")?;
        match field.as_str() {
            "username" => return Ok(UserField::Username),
            "password" => return Ok(UserField::Password),
            _ => writeln!(writer, "Please enter 'username' or 'password'.")?,
        }
    }
}

fn clear_screen<W: Write>(writer: &mut W) -> io::Result<()> {
    write!(writer, "\x1b[2J\x1b[H")
}

fn title<W: Write>(writer: &mut W, text: &str) -> io::Result<()> {
    writeln!(writer, "\n=== {text} ===\n")
}

fn pause<R: BufRead, W: Write>(reader: &mut R, writer: &mut W) -> io::Result<()> {
    write!(writer, "\nPress Enter to continue...")?;
    writer.flush()?;
    let mut s = String::new();
    reader.read_line(&mut s)?;
    Ok(())
}

fn success<R: BufRead, W: Write>(reader: &mut R, writer: &mut W, message: &str) -> io::Result<()> {
    writeln!(writer, "SUCCESS: {message}")?;
    pause(reader, writer)
}

fn failure<R: BufRead, W: Write>(reader: &mut R, writer: &mut W, message: &str) -> io::Result<()> {
    writeln!(writer, "ERROR: {message}")?;
    pause(reader, writer)
}

/// Render the outcome of a mutating operation and wait for Enter.
fn report<R, W>(
    reader: &mut R,
    writer: &mut W,
    reply: Result<Reply, SessionError>,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
{
    match reply {
        Ok(Reply::Body(text)) => success(reader, writer, &text),
        Ok(Reply::Err { detail }) => failure(reader, writer, &detail),
        Err(e) => failure(reader, writer, &e.to_string()),
    }
}

/// Render an opaque listing verbatim and wait for Enter.
fn listing<R, W>(
    reader: &mut R,
    writer: &mut W,
    reply: Result<Reply, SessionError>,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
{
    match reply {
        Ok(Reply::Body(text)) => {
            writeln!(writer, "{text}")?;
            pause(reader, writer)
        }
        Ok(Reply::Err { detail }) => failure(reader, writer, &detail),
        Err(e) => failure(reader, writer, &e.to_string()),
    }
}

/// Render a listing inline, without pausing, ahead of a follow-up prompt.
fn preview<W: Write>(writer: &mut W, reply: Result<Reply, SessionError>) -> io::Result<()> {
    match reply {
        Ok(Reply::Body(text)) => writeln!(writer, "{text}"),
        Ok(Reply::Err { detail }) => writeln!(writer, "ERROR: {detail}"),
        Err(e) => writeln!(writer, "ERROR: {e}"),
    }
}
