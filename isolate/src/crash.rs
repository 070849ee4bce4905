//! Recover a failure signal from a crashed unit's stderr.
//!
//! Node reports an uncaught error as a `Name: message` header followed by
//! `    at ...` frames. Uncaught non-`Error` values are printed bare, followed by
//! a `--trace-uncaught` hint.

use crate::unit::UnitFailure;

const FRAME_PREFIX: &str = "    at ";
const TRACE_HINT_PREFIX: &str = "(Use `node --trace-uncaught";
const VERSION_FOOTER_PREFIX: &str = "Node.js v";

/// Build the failure signal for a unit that exited with `status` (already
/// rendered, e.g. `exit status: 1`).
pub(crate) fn parse_crash(stderr: &str, status: &str) -> UnitFailure {
    let lines: Vec<&str> = stderr.lines().collect();

    if let Some(failure) = parse_error_report(&lines) {
        return failure;
    }

    if let Some(hint) = lines
        .iter()
        .position(|line| line.starts_with(TRACE_HINT_PREFIX))
        && let Some(value) = lines[..hint]
            .iter()
            .rev()
            .find(|line| !line.trim().is_empty())
    {
        return UnitFailure::new(value.trim(), "");
    }

    let stack = lines
        .iter()
        .filter(|line| !line.starts_with(VERSION_FOOTER_PREFIX))
        .copied()
        .collect::<Vec<_>>()
        .join("\n");
    UnitFailure::new(format!("worker exited with {status}"), stack.trim())
}

/// `Name: message` report followed by a run of frames.
///
/// The frames are the last contiguous run of `    at` lines, so a message
/// that itself contains such lines stays part of the message. The header is
/// the first `Name: ` line after the source excerpt and its caret marker; the
/// message runs from there to the frames and may span several lines.
fn parse_error_report(lines: &[&str]) -> Option<UnitFailure> {
    let last_frame = lines.iter().rposition(|line| line.starts_with(FRAME_PREFIX))?;
    let frames_start = lines[..last_frame]
        .iter()
        .rposition(|line| !line.starts_with(FRAME_PREFIX))
        .map_or(0, |n| n + 1);

    let search_from = lines[..frames_start]
        .iter()
        .rposition(|line| is_caret_marker(line))
        .map_or(0, |n| n + 1);

    let header = (search_from..frames_start)
        .find(|&i| split_header(lines[i]).is_some())
        .or_else(|| {
            lines[search_from..frames_start]
                .iter()
                .rposition(|line| !line.trim().is_empty())
                .map(|n| search_from + n)
        })?;

    let mut message_lines: Vec<&str> = lines[header..frames_start].to_vec();
    while message_lines.last().is_some_and(|line| line.trim().is_empty()) {
        message_lines.pop();
    }
    message_lines[0] = header_message(message_lines[0]);

    Some(UnitFailure::new(
        message_lines.join("\n"),
        lines[header..=last_frame].join("\n"),
    ))
}

/// The `^^^` line node prints under the offending source excerpt.
fn is_caret_marker(line: &str) -> bool {
    let marker = line.trim();
    !marker.is_empty() && marker.chars().all(|c| c == '^')
}

/// Strip the error name from a `Name: message` or `Name [CODE]: message`
/// header. Headers that don't look like that are kept whole.
fn header_message(header: &str) -> &str {
    split_header(header).unwrap_or_else(|| header.trim())
}

fn split_header(line: &str) -> Option<&str> {
    let (name, message) = line.trim().split_once(": ")?;
    let (ident, code) = name.split_once(' ').unwrap_or((name, ""));
    let ident_ok = !ident.is_empty()
        && ident
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    let code_ok = code.is_empty() || (code.starts_with('[') && code.ends_with(']'));
    (ident_ok && code_ok).then_some(message)
}
