//! Text formatting for tree rows and pane headers.

use crate::tree::{FileAttributes, TreeNode};

pub const BRANCH_MIDDLE: &str = "├── ";
pub const BRANCH_LAST: &str = "└── ";
pub const INDENT_CONTINUE: &str = "│   ";
pub const INDENT_EMPTY: &str = "    ";
pub const COLLAPSED_DIR: &str = "⊕ ";
pub const EXPANDED_DIR: &str = "⊖ ";

const HEADER_FILL: &str = "━";
const HEADER_LEFT: &str = "┃ ";
const SELECTED_MARK: &str = "● ";

pub fn format_size(size: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = size as f64;
    let mut unit_index = 0;
    while value >= 1024.0 && unit_index < UNITS.len() - 1 {
        value /= 1024.0;
        unit_index += 1;
    }
    if unit_index == 0 {
        format!("{} {}", size, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit_index])
    }
}

/// `rwxr-xr-x` style permission string for the low nine mode bits.
pub fn permissions(mode: u32) -> String {
    const FLAGS: [(u32, char); 9] = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];
    FLAGS
        .iter()
        .map(|&(bit, ch)| if mode & bit != 0 { ch } else { '-' })
        .collect()
}

fn attribute_row(kind: &str, perms: &str, owner: &str, size: &str) -> String {
    format!("{kind}{perms} {owner:>11} {size:>10} ")
}

/// Attribute columns prefixed to a tree row.
pub fn attribute_columns(node: &TreeNode) -> String {
    let FileAttributes { mode, uid, gid } = node.attributes;
    let kind = if node.is_dir { "d" } else { "-" };
    attribute_row(
        kind,
        &permissions(mode),
        &format!("{uid}:{gid}"),
        &format_size(node.cumulative_size),
    )
}

/// Legend shown in the header row above the attribute columns.
pub fn attribute_legend() -> String {
    format!("{}Filetree", attribute_row("P", "ermission", "UID:GID", "Size"))
}

/// Pane title bar padded with a fill rule up to `width` cells.
pub fn render_header(title: &str, width: u16, selected: bool) -> String {
    let mark = if selected { SELECTED_MARK } else { "" };
    let body = format!("{HEADER_LEFT}{mark}{title} ");
    let used = body.chars().count();
    let fill = usize::from(width).saturating_sub(used);
    format!("{body}{}", HEADER_FILL.repeat(fill))
}

/// Cut `text` to at most `width` characters.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
