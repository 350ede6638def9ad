//! Parsing of `/proc/self/mountinfo` and enclosing-mount lookup.

use std::path::{Path, PathBuf};

/// One mount table entry, reduced to the fields the prompt needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub id: u32,
    pub mount_point: PathBuf,
    pub fs_type: String,
    pub source: String,
}

/// Parse the contents of a mountinfo file.
///
/// Per-line format (see proc(5)):
/// `id parent major:minor root mount-point options [optional...] - fstype source super-options`
/// Malformed lines are skipped rather than failing the whole table.
pub fn parse_mountinfo(content: &str) -> Vec<MountEntry> {
    content.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<MountEntry> {
    let fields: Vec<&str> = line.split(' ').collect();
    if fields.len() < 5 {
        tracing::debug!("Skipping malformed mountinfo line: {}", line);
        return None;
    }

    let id = match fields[0].parse::<u32>() {
        Ok(id) => id,
        Err(_) => {
            tracing::debug!("Skipping mountinfo line with bad id: {}", line);
            return None;
        }
    };
    let mount_point = PathBuf::from(unescape(fields[4]));

    // Optional fields run until the lone "-" separator; fstype and source
    // follow it.
    let separator = fields.iter().position(|f| *f == "-")?;
    let fs_type = fields.get(separator + 1)?.to_string();
    let source = unescape(fields.get(separator + 2)?);

    Some(MountEntry {
        id,
        mount_point,
        fs_type,
        source,
    })
}

/// Decode the octal escapes the kernel applies to mount paths
/// (`\040` space, `\011` tab, `\012` newline, `\134` backslash).
fn unescape(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let mut code = String::new();
        for _ in 0..3 {
            match chars.peek() {
                Some(d) if d.is_digit(8) => code.push(chars.next().unwrap()),
                _ => break,
            }
        }
        match u8::from_str_radix(&code, 8) {
            Ok(byte) if code.len() == 3 => out.push(byte as char),
            _ => {
                // Not a recognized escape, keep it verbatim.
                out.push('\\');
                out.push_str(&code);
            }
        }
    }

    out
}

/// Find the mount enclosing `path`: the entry whose mount point is the
/// longest prefix of the (already canonicalized) path.
pub fn find_enclosing<'a>(entries: &'a [MountEntry], path: &Path) -> Option<&'a MountEntry> {
    entries
        .iter()
        .filter(|entry| path.starts_with(&entry.mount_point))
        .max_by_key(|entry| entry.mount_point.as_os_str().len())
}
