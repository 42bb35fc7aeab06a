//! Recorders that drain a stream of values into a file
//!
//! Each recorder consumes an iterator until it ends, which for a
//! [`Receiver`](struct.Receiver.html) means until its broadcaster is closed,
//! so a recorder is typically run on its own thread:
//!
//! ```no_run
//! use multi_chan::{record_string, Broadcaster, Options};
//! use std::thread;
//!
//! let options = Options::default();
//! let lines = Broadcaster::<String>::new(0);
//! let rx = lines.add_chan();
//! let writer = thread::spawn(move || record_string(&options, "events", rx));
//!
//! lines.send("started".to_string());
//! lines.close();
//! let path = writer.join().unwrap().unwrap();
//! assert!(path.ends_with("events.txt"));
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::debug;

use crate::error::RecordError;
use crate::options::Options;

// Disk blocks are usually a multiple of 4K.
const TEXT_BUFFER: usize = 8 * 1024;
const CSV_BUFFER: usize = 4 * 1024;

/// Writes each value on its own line.
///
/// The file keeps a `.json` or `.txt` extension; anything else gets `.txt`
/// appended.
pub fn record_string<I, S>(
    options: &Options,
    file_name: &str,
    values: I,
) -> Result<PathBuf, RecordError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let path = options.output_dir().join(text_file_name(file_name));
    let started = Instant::now();
    let mut out = BufWriter::with_capacity(TEXT_BUFFER, create(options, &path)?);

    let mut count = 0usize;
    for value in values {
        out.write_all(value.as_ref().as_bytes())
            .and_then(|_| out.write_all(b"\n"))
            .map_err(|e| io_error(&path, e))?;
        count += 1;
    }
    close_buffered(&path, out)?;

    finished(options, &path, started, count);
    Ok(path)
}

/// Writes each record as one delimited line, separated by the configured
/// separator and terminated by CRLF.
///
/// `.csv` is appended unless the name already ends in it, in any case.
pub fn record_csv<I, R, F>(
    options: &Options,
    file_name: &str,
    records: I,
) -> Result<PathBuf, RecordError>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let separator = options.csv_separator();
    if !separator.is_ascii() {
        return Err(RecordError::InvalidSeparator(separator));
    }
    let path = options.output_dir().join(csv_file_name(file_name));
    let started = Instant::now();
    let file = create(options, &path)?;
    let mut out = csv::WriterBuilder::new()
        .delimiter(separator as u8)
        .terminator(csv::Terminator::CRLF)
        .flexible(true)
        .buffer_capacity(CSV_BUFFER)
        .from_writer(file);

    let mut count = 0usize;
    for record in records {
        out.write_record(record).map_err(|e| RecordError::Csv {
            path: path.display().to_string(),
            source: e,
        })?;
        count += 1;
    }
    let file = out
        .into_inner()
        .map_err(|e| io_error(&path, e.into_error()))?;
    sync(&path, file)?;

    finished(options, &path, started, count);
    Ok(path)
}

/// Writes the bytes as they come, with no separator.
///
/// `.log` is appended when the name has no extension.
pub fn record_bytes<I, B>(
    options: &Options,
    file_name: &str,
    chunks: I,
) -> Result<PathBuf, RecordError>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let path = options.output_dir().join(bytes_file_name(file_name));
    let started = Instant::now();
    let mut out = BufWriter::with_capacity(TEXT_BUFFER, create(options, &path)?);

    let mut count = 0usize;
    for chunk in chunks {
        out.write_all(chunk.as_ref())
            .map_err(|e| io_error(&path, e))?;
        count += 1;
    }
    close_buffered(&path, out)?;

    finished(options, &path, started, count);
    Ok(path)
}

fn text_file_name(name: &str) -> String {
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some("json") | Some("txt") => name.to_string(),
        _ => format!("{name}.txt"),
    }
}

fn csv_file_name(name: &str) -> String {
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => name.to_string(),
        _ => format!("{name}.csv"),
    }
}

fn bytes_file_name(name: &str) -> String {
    match Path::new(name).extension() {
        Some(_) => name.to_string(),
        None => format!("{name}.log"),
    }
}

fn create(options: &Options, path: &Path) -> Result<File, RecordError> {
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    debug!(path = %path.display(), "started output");
    if options.is_debug() {
        let _ = options.printf(format_args!("started output to file {}\n", path.display()));
    }
    Ok(file)
}

// Flushes, then syncs so errors the OS would only report at close come back.
fn close_buffered(path: &Path, out: BufWriter<File>) -> Result<(), RecordError> {
    let file = out
        .into_inner()
        .map_err(|e| io_error(path, e.into_error()))?;
    sync(path, file)
}

fn sync(path: &Path, file: File) -> Result<(), RecordError> {
    file.sync_all().map_err(|e| io_error(path, e))
}

fn finished(options: &Options, path: &Path, started: Instant, count: usize) {
    let seconds = started.elapsed().as_secs_f64();
    debug!(path = %path.display(), count, seconds, "finished output");
    if options.is_debug() || options.is_verbose() {
        let _ = options.printf(format_args!(
            "Finished output to file {} || required {} seconds\n",
            path.display(),
            seconds
        ));
    }
}

fn io_error(path: &Path, source: io::Error) -> RecordError {
    RecordError::Io {
        path: path.display().to_string(),
        source,
    }
}
