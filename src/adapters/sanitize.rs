//! Log sanitization.
//!
//! Request values reach log messages: rejected categorical values, unknown
//! symptom names, malformed bodies and the feature rows of failed
//! predictions. `SanitizingMakeWriter` wraps the formatter's writer so every
//! event lands as exactly one line, with control characters escaped and
//! common patient identifiers redacted.
//!
//! The fmt layer hands each formatted event to the writer in a single write
//! terminated by one newline. Any other line break in that buffer came from a
//! logged value.

use std::io::Write;
use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

/// Longest event body written as-is; anything past it is cut.
pub const MAX_EVENT_BYTES: usize = 16 * 1024;

const RULES: &[(&str, &str)] = &[
    // SSN-like (xxx-xx-xxxx)
    (r"\b\d{3}-\d{2}-\d{4}\b", "[REDACTED-SSN]"),
    (r"\bMRN[:\s]?\d{6,10}\b", "[REDACTED-MRN]"),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
];

struct Redactions {
    set: RegexSet,
    rules: Vec<(Regex, &'static str)>,
}

static REDACTIONS: OnceLock<Option<Redactions>> = OnceLock::new();

fn redactions() -> Option<&'static Redactions> {
    REDACTIONS
        .get_or_init(|| {
            let set = RegexSet::new(RULES.iter().map(|(pattern, _)| *pattern)).ok()?;
            let rules = RULES
                .iter()
                .map(|(pattern, replacement)| Regex::new(pattern).map(|re| (re, *replacement)))
                .collect::<Result<Vec<_>, _>>()
                .ok()?;
            Some(Redactions { set, rules })
        })
        .as_ref()
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Escape line breaks and other control characters so text stays on one line.
#[must_use]
pub fn escape_control(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push('\t'),
            c if c.is_control() => out.push_str(&format!("\\u{{{:04x}}}", u32::from(c))),
            c => out.push(c),
        }
    }
    out
}

/// Make `input` safe to write as a single log line.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, MAX_EVENT_BYTES)
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);
    let mut result = escape_control(prefix);

    if let Some(redactions) = redactions() {
        let matched: Vec<usize> = redactions.set.matches(&result).into_iter().collect();
        for idx in matched {
            let (regex, replacement) = &redactions.rules[idx];
            result = regex.replace_all(&result, *replacement).into_owned();
        }
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// `MakeWriter` wrapper sanitizing each formatted event before it reaches
/// the underlying sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
}

impl<W: Write> Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let (body, terminated) = match buf.strip_suffix(b"\n") {
            Some(body) => (body, true),
            None => (buf, false),
        };
        let mut line = sanitize(&String::from_utf8_lossy(body));
        if terminated {
            line.push('\n');
        }
        self.inner.write_all(line.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
        }
    }
}
