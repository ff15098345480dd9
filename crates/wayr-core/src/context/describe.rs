//! One-line command description from the man page NAME section.
//!
//! The raw page source (located with `man -w`) is tried first, since the
//! macros survive there: `.Nd` for mdoc pages, then the `.SH NAME` section of
//! troff pages. The formatted `man` output is the fallback. Every step logs
//! at debug level; `--debug-man` turns those records on.

use crate::collect::{query, CommandRunner};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, instrument};

/// Commands whose first argument (a script) is the thing worth describing.
const INTERPRETERS: &[&str] = &[
    "python", "python2", "python3", "node", "ruby", "perl", "bash", "sh", "zsh", "fish", "java",
    "php",
];

/// Dash styles separating the name from the description, in preference order.
const DASHES: &[char] = &['\u{2013}', '\u{2014}', '\u{2212}', '-'];

const COMPRESSED_SUFFIXES: &[&str] = &[".gz", ".bz2", ".xz", ".zst", ".Z", ".lzma"];

static TROFF_NAME_HEADER: OnceLock<Option<Regex>> = OnceLock::new();
static FORMATTED_NAME_HEADER: OnceLock<Option<Regex>> = OnceLock::new();
static FORMATTED_SECTION_HEADER: OnceLock<Option<Regex>> = OnceLock::new();
static TROFF_TWO_CHAR_FONT: OnceLock<Option<Regex>> = OnceLock::new();
static TROFF_FONT: OnceLock<Option<Regex>> = OnceLock::new();
static TROFF_ESCAPE: OnceLock<Option<Regex>> = OnceLock::new();

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn is_match(cell: &'static OnceLock<Option<Regex>>, pattern: &str, text: &str) -> bool {
    cached(cell, pattern).is_some_and(|re| re.is_match(text))
}

/// Man topic for a command line: the executable base name, or the script
/// base name (up to its first `.`) when the executable is an interpreter.
pub fn man_topic(cmd: &str) -> Option<String> {
    let mut words = cmd.split_whitespace();
    let base = basename(words.next()?);

    if INTERPRETERS.contains(&base) {
        if let Some(script) = words.next() {
            let script = basename(script);
            return Some(script.split('.').next().unwrap_or(script).to_string());
        }
    }
    Some(base.to_string())
}

fn basename(word: &str) -> &str {
    word.rsplit('/').next().unwrap_or(word)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => first.to_uppercase().chain(chars).collect(),
        _ => text.to_string(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of the first `.Nd` macro line, capitalized.
pub(crate) fn from_nd_macro(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix(".Nd "))
        .map(str::trim)
        .find(|desc| !desc.is_empty())
        .map(capitalize)
}

/// Remove troff font changes and escapes.
pub(crate) fn strip_troff(text: &str) -> String {
    let mut out = text.to_string();
    if let Some(re) = cached(&TROFF_TWO_CHAR_FONT, r"\\f\([A-Z]{2}") {
        out = re.replace_all(&out, "").into_owned();
    }
    if let Some(re) = cached(&TROFF_FONT, r"\\f.") {
        out = re.replace_all(&out, "").into_owned();
    }
    out = out
        .replace("\\-", "-")
        .replace("\\ ", " ")
        .replace("\\&", "")
        .replace("\\(em", "\u{2014}")
        .replace("\\(en", "\u{2013}");
    if let Some(re) = cached(&TROFF_ESCAPE, r"\\(.)") {
        out = re.replace_all(&out, "$1").into_owned();
    }
    collapse_whitespace(&out)
}

/// Text after the first dash style that leaves at least five characters.
fn after_dash(text: &str, trim_period: bool) -> Option<String> {
    DASHES.iter().find_map(|dash| {
        let (_, rest) = text.split_once(*dash)?;
        let rest = rest.trim();
        let rest = if trim_period { rest.trim_end_matches('.') } else { rest };
        let desc = capitalize(rest);
        (desc.chars().count() >= 5).then_some(desc)
    })
}

fn reasonable_length(text: &str) -> bool {
    (10..=200).contains(&text.chars().count())
}

/// Description from the `.SH NAME` section of a raw troff page.
pub(crate) fn from_troff_name(raw: &str) -> Option<String> {
    let mut in_section = false;
    let mut content: Vec<&str> = Vec::new();

    for line in raw.lines().map(str::trim) {
        if is_match(&TROFF_NAME_HEADER, r#"(?i)^\.SH\s+"?NAME"?\s*$"#, line) {
            in_section = true;
            continue;
        }
        if !in_section {
            continue;
        }
        if line.starts_with(".SH ") {
            break;
        }
        if line.is_empty() || line.starts_with(".LP") || line.starts_with(".PP") {
            continue;
        }
        if line.starts_with('.') && line.split_whitespace().count() <= 2 {
            continue;
        }
        if !line.starts_with('.') {
            content.push(line);
        } else if let Some((_, rest)) = line.split_once(char::is_whitespace) {
            // `.B name - description` style: keep the macro's text
            content.push(rest.trim_start());
        }
    }

    if content.is_empty() {
        return None;
    }
    let description = strip_troff(&content.join(" "));
    debug!(content = %description, "troff NAME section");

    after_dash(&description, false).or_else(|| reasonable_length(&description).then_some(description))
}

/// Description from the NAME section of formatted `man` output.
pub(crate) fn from_formatted_name(text: &str, topic: &str) -> Option<String> {
    let name_header = r"(?i)^NAME\s*$";
    let mut in_section = false;
    let mut lines: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim) {
        if is_match(&FORMATTED_NAME_HEADER, name_header, line) {
            in_section = true;
            continue;
        }
        if !in_section {
            continue;
        }
        if is_match(&FORMATTED_SECTION_HEADER, r"^[A-Z][A-Z\s]{1,}$", line) {
            break;
        }
        if !line.is_empty() && !line.starts_with('.') {
            lines.push(line);
        }
    }

    if lines.is_empty() {
        debug!("no description lines in NAME section");
        return None;
    }
    let description = collapse_whitespace(&lines.join(" "));
    debug!(content = %description, "formatted NAME section");

    if let Some(desc) = after_dash(&description, true) {
        return Some(desc);
    }

    // "topic description here"
    if let Some((first, rest)) = description.split_once(' ') {
        let first = first.trim_end_matches(|c: char| ",:;()[]".contains(c));
        if first.eq_ignore_ascii_case(topic) {
            let desc = rest.trim().trim_end_matches('.');
            if desc.chars().count() >= 5 {
                return Some(capitalize(desc));
            }
        }
    }

    reasonable_length(&description).then_some(description)
}

/// Read a man page source file, skipping compressed or binary pages.
fn read_raw_page(path: &Path) -> Option<String> {
    let name = path.to_string_lossy();
    if COMPRESSED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
        debug!(path = %name, "compressed man page, skipping raw parse");
        return None;
    }
    let bytes = fs::read(path).ok()?;
    if bytes.contains(&0) {
        return None;
    }
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Describe what a command is, from its man page.
///
/// Any failure (no page, unreadable page, no usable NAME text) is `None`.
#[instrument(skip(runner))]
pub fn describe(cmd: &str, runner: &dyn CommandRunner) -> Option<String> {
    let topic = man_topic(cmd)?;
    debug!(%topic, "looking up man page");

    if let Some(path) = query(runner, "man", &["-w", &topic])
        .map(|out| out.trim().to_string())
        .filter(|path| !path.is_empty())
    {
        debug!(%path, "man page source located");
        if let Some(raw) = read_raw_page(Path::new(&path)) {
            if let Some(desc) = from_nd_macro(&raw) {
                debug!(%desc, "found .Nd macro in page source");
                return Some(desc);
            }
            if let Some(desc) = from_troff_name(&raw) {
                debug!(%desc, "extracted from troff NAME section");
                return Some(desc);
            }
            debug!("nothing usable in page source, trying formatted output");
        }
    }

    let Some(formatted) = query(runner, "man", &[&topic]) else {
        debug!(%topic, "man failed");
        return None;
    };
    if let Some(desc) = from_nd_macro(&formatted) {
        debug!(%desc, "found .Nd macro in formatted output");
        return Some(desc);
    }
    let desc = from_formatted_name(&formatted, &topic);
    debug!(found = desc.is_some(), "formatted NAME section parsed");
    desc
}
