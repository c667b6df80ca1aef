//! Console rendering of one smoke-run outcome.

use std::io::{self, Write};

use sonic_rs::Value;

use crate::transport::HttpResponse;

/// Render the three report lines for one response: status, raw body, and the
/// body parsed as JSON. A body that does not decode as JSON is reported on
/// the third line and absorbed here, it never fails the run.
pub fn write_report<W: Write>(out: &mut W, response: &HttpResponse) -> io::Result<()> {
    writeln!(out, "Status: {}", response.status())?;
    writeln!(out, "Raw Text: {}", response.text())?;
    match sonic_rs::from_slice::<Value>(response.body()) {
        Ok(value) => {
            let rendered = sonic_rs::to_string(&value).map_err(io::Error::other)?;
            writeln!(out, "Parsed JSON: {rendered}")
        }
        Err(err) => writeln!(out, "⚠️ JSON decode failed: {err}"),
    }
}

/// `write_report` to stdout.
pub fn print_report(response: &HttpResponse) -> io::Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_report(&mut lock, response)
}
