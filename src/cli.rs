//! Interactive prompt utilities for the portal client.
//!
//! The protocol grammar is space-delimited with no quoting, so field values
//! are validated here, at the presentation boundary, before they ever reach
//! the codec: single-token prompts refuse embedded whitespace and numeric
//! prompts refuse anything that is not a `u32`. Bad input re-prompts; the
//! protocol layer never sees it.
use std::io::{self, BufRead, Write};

/// Read one trimmed line. Inner whitespace is allowed; this is the prompt
/// for the one rest-of-line field in the grammar (course names).
pub fn prompt_line<R, W>(reader: &mut R, writer: &mut W, label: &str) -> io::Result<String>
where
    R: BufRead,
    W: Write,
{
    write!(writer, "{label}: ")?;
    writer.flush()?;

    let mut s = String::new();
    if reader.read_line(&mut s)? == 0 {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
    }
    Ok(s.trim().to_string())
}

/// Read a single protocol token, re-prompting until the input is non-empty
/// and free of whitespace.
pub fn prompt_field<R, W>(reader: &mut R, writer: &mut W, label: &str) -> io::Result<String>
where
    R: BufRead,
    W: Write,
{
    loop {
        let value = prompt_line(reader, writer, label)?;
        if !value.is_empty() && !value.contains(char::is_whitespace) {
            return Ok(value);
        }
        writeln!(writer, "Please enter a single word, no spaces.")?;
    }
}

/// Read a non-negative number, re-prompting until the input parses.
pub fn prompt_number<R, W>(reader: &mut R, writer: &mut W, label: &str) -> io::Result<u32>
where
    R: BufRead,
    W: Write,
{
    loop {
        let value = prompt_line(reader, writer, label)?;
        match value.parse::<u32>() {
            Ok(n) => return Ok(n),
            Err(_) => writeln!(writer, "Please enter a non-negative number.")?,
        }
    }
}
