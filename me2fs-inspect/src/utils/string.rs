// SPDX-License-Identifier: MIT

use me2fs::ext2::{FileAttributes, FileKind};
use time::OffsetDateTime;

pub fn sep_u64(mut n: u64) -> String {
    // thousands separator: 12 345 678
    if n < 1_000 {
        return n.to_string();
    }
    let mut parts: Vec<String> = Vec::new();
    while n >= 1_000 {
        parts.push(format!("{:03}", n % 1_000));
        n /= 1_000;
    }
    parts.push(n.to_string());
    parts.reverse();
    parts.join(" ")
}

/// `ls -l` style mode column, e.g. `drwxr-xr-x`.
pub fn mode_string(kind: FileKind, mode: u16) -> String {
    let mut out = String::with_capacity(10);
    out.push(kind.tag());
    for shift in [6u16, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        // setuid / setgid / sticky share the execute column
        let special = match shift {
            6 => mode & 0o4000 != 0,
            3 => mode & 0o2000 != 0,
            _ => mode & 0o1000 != 0,
        };
        let exec = bits & 0o1 != 0;
        out.push(match (special, exec, shift) {
            (true, true, 0) => 't',
            (true, false, 0) => 'T',
            (true, true, _) => 's',
            (true, false, _) => 'S',
            (false, true, _) => 'x',
            (false, false, _) => '-',
        });
    }
    out
}

pub fn attr_mode_string(attr: &FileAttributes) -> String {
    mode_string(attr.kind, attr.mode)
}

/// UTC timestamp, `-` when unset.
pub fn time_string(t: Option<OffsetDateTime>) -> String {
    match t {
        None => "-".to_string(),
        Some(t) => format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
            t.year(),
            u8::from(t.month()),
            t.day(),
            t.hour(),
            t.minute(),
            t.second()
        ),
    }
}
