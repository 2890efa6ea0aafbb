//! Front-matter rewriting for Jekyll-style posts.
//!
//! The front matter is treated as opaque `key: value` text lines between the
//! first two `---` delimiters. It is never parsed as YAML: every line other
//! than the `published:` line must survive byte-for-byte.

use thiserror::Error;

const DELIMITER: &str = "---";
const PUBLISHED_KEY: &str = "published:";
const UNPUBLISHED_LINE: &str = "published: false";

/// The content has no front-matter block: fewer than two `---` delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no front matter found: expected two '---' delimiters")]
pub struct MalformedContent;

/// Returns the byte range of the header between the first two delimiters,
/// delimiters excluded.
fn header_range(content: &str) -> Result<std::ops::Range<usize>, MalformedContent> {
    let start = content.find(DELIMITER).ok_or(MalformedContent)? + DELIMITER.len();
    let len = content[start..].find(DELIMITER).ok_or(MalformedContent)?;
    Ok(start..start + len)
}

/// Returns the raw header text between the first two `---` delimiters.
///
/// The slice includes the newline following the opening delimiter, so a
/// conventional post yields a header starting with `'\n'`.
pub fn header(content: &str) -> Result<&str, MalformedContent> {
    header_range(content).map(|range| &content[range])
}

/// Rewrites a header so it carries exactly one `published: false` line.
///
/// The first line containing `published:` is replaced, later ones are dropped,
/// and if there was none the line is appended. The result always ends with a
/// single `'\n'`.
pub fn unpublish_header(header: &str) -> String {
    let mut lines: Vec<&str> = header.split('\n').collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    let mut seen_published = false;
    let mut rewritten: Vec<&str> = Vec::with_capacity(lines.len() + 1);
    for line in lines {
        if !line.contains(PUBLISHED_KEY) {
            rewritten.push(line);
        } else if !seen_published {
            seen_published = true;
            rewritten.push(UNPUBLISHED_LINE);
        }
    }
    if !seen_published {
        rewritten.push(UNPUBLISHED_LINE);
    }

    let mut out = rewritten.join("\n");
    out.push('\n');
    out
}

/// Returns `content` with its front matter marked `published: false`.
///
/// Only the header slice is replaced, in place; delimiters and body are left
/// untouched even if the body repeats the header text.
pub fn rewrite_unpublished(content: &str) -> Result<String, MalformedContent> {
    let range = header_range(content)?;
    let rewritten = unpublish_header(&content[range.clone()]);

    let mut out = String::with_capacity(content.len() + UNPUBLISHED_LINE.len() + 1);
    out.push_str(&content[..range.start]);
    out.push_str(&rewritten);
    out.push_str(&content[range.end..]);
    Ok(out)
}
