/// Fallback detail for an error status line carrying no explanation.
const UNKNOWN_ERROR: &str = "Unknown error";

/// Outcome of a `LOGIN` exchange.
///
/// Decoding is tolerant: a `LOGIN_SUCCESS` line missing its role or id
/// tokens yields an empty role and an id of `-1` rather than failing, and
/// any line that does not open with `LOGIN_SUCCESS` is a denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginReply {
    Granted { role: String, user_id: i64 },
    Denied { detail: String },
}

impl From<&str> for LoginReply {
    fn from(line: &str) -> Self {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("LOGIN_SUCCESS") => {
                let role = tokens.next().unwrap_or_default().to_string();
                let user_id = tokens.next().and_then(|t| t.parse().ok()).unwrap_or(-1);
                LoginReply::Granted { role, user_id }
            }
            _ => LoginReply::Denied {
                detail: detail_after_keyword(line),
            },
        }
    }
}

/// Reply to a role-scoped operation.
///
/// The protocol has exactly two shapes here: an `ERROR <detail>` status
/// line, or opaque display text (course tables, user listings, one-word
/// acknowledgements) passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Body(String),
    Err { detail: String },
}

impl Reply {
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Body(_))
    }
}

impl From<&str> for Reply {
    fn from(line: &str) -> Self {
        match line.split_whitespace().next() {
            Some("ERROR") => Reply::Err {
                detail: detail_after_keyword(line),
            },
            _ => Reply::Body(line.to_string()),
        }
    }
}

/// Everything after the first token, rejoined with single spaces.
fn detail_after_keyword(line: &str) -> String {
    let detail = line
        .split_whitespace()
        .skip(1)
        .collect::<Vec<&str>>()
        .join(" ");
    if detail.is_empty() {
        String::from(UNKNOWN_ERROR)
    } else {
        detail
    }
}
