//! Small text and environment helpers used when reporting results

use std::fmt::{self, Write as _};
use std::io::{self, BufReader, BufWriter, Read, Write};

use anyhow::Context;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value};

/// Re-indents the JSON documents read from `input`, one indentation level
/// per nesting depth, writing each document followed by a newline.
///
/// Key order is kept as read. Malformed JSON and empty input are errors.
///
/// ```
/// let mut out = Vec::new();
/// multi_chan::prettify_json(&br#"{"a":[1,2]}"#[..], &mut out, "  ").unwrap();
/// assert_eq!(String::from_utf8(out).unwrap(), "{\n  \"a\": [\n    1,\n    2\n  ]\n}\n");
/// ```
pub fn prettify_json<R: Read, W: Write>(input: R, output: W, indent: &str) -> io::Result<()> {
    let mut out = BufWriter::new(output);
    let documents =
        serde_json::Deserializer::from_reader(BufReader::new(input)).into_iter::<Value>();

    let mut count = 0usize;
    for document in documents {
        let document = document?;
        let formatter = PrettyFormatter::with_indent(indent.as_bytes());
        document.serialize(&mut Serializer::with_formatter(&mut out, formatter))?;
        out.write_all(b"\n")?;
        count += 1;
    }
    if count == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "no JSON document in input",
        ));
    }
    out.flush()
}

/// Folds the present errors into one, numbered from 1 in the order given,
/// one per line. Returns `None` when there is nothing to report.
pub fn concatenate_errors<I, E>(errors: I) -> Option<anyhow::Error>
where
    I: IntoIterator<Item = Option<E>>,
    E: fmt::Display,
{
    let messages: Vec<String> = errors.into_iter().flatten().map(|e| e.to_string()).collect();
    if messages.is_empty() {
        return None;
    }

    let width = messages.len().to_string().len();
    let mut text = String::new();
    for (index, message) in messages.iter().enumerate() {
        let _ = write!(text, "\n{:>width$}.\t{}", index + 1, message);
    }
    Some(anyhow::anyhow!(text))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserHost {
    /// Login name of the current user.
    pub user: String,
    pub host: String,
}

/// The current user's login name and the machine's host name.
pub fn user_host_info() -> anyhow::Result<UserHost> {
    let user = whoami::fallible::username().context("failed to look up the current user")?;
    let host = whoami::fallible::hostname().context("failed to look up the host name")?;
    Ok(UserHost { user, host })
}
