//! pstree-style rendering of an arena subtree.

use super::palette::Palette;
use crate::provenance::ProcessArena;
use std::io::{self, Write};
use wayr_common::ProcessId;

/// Write the tree under `root` (children as populated by the tree builder).
pub fn write_tree<W: Write>(
    out: &mut W,
    arena: &ProcessArena,
    root: ProcessId,
    palette: &Palette,
) -> io::Result<()> {
    let Some(info) = arena.get(root) else {
        return Ok(());
    };
    writeln!(out, "{}", palette.process_label(&info.name, info.pid))?;
    write_children(out, arena, root, "", palette)
}

fn write_children<W: Write>(
    out: &mut W,
    arena: &ProcessArena,
    parent: ProcessId,
    prefix: &str,
    palette: &Palette,
) -> io::Result<()> {
    let children = arena.children(parent);
    let count = children.len();

    for (i, child) in children.into_iter().enumerate() {
        let is_last = i + 1 == count;
        let connector = if is_last { "└─" } else { "├─" };
        writeln!(
            out,
            "{prefix}{connector}{}",
            palette.process_label(&child.name, child.pid)
        )?;

        let extension = if is_last { "  " } else { "│ " };
        write_children(out, arena, child.pid, &format!("{prefix}{extension}"), palette)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::ProcessInfo;

    fn node(arena: &mut ProcessArena, pid: u32, ppid: u32, name: &str, children: &[u32]) {
        let mut info = ProcessInfo::new(pid, ppid, name);
        info.children = children.iter().copied().map(ProcessId).collect();
        arena.insert(info);
    }

    #[test]
    fn test_tree_connectors() {
        let mut arena = ProcessArena::new();
        node(&mut arena, 1, 0, "systemd", &[400, 500]);
        node(&mut arena, 400, 1, "sshd", &[410]);
        node(&mut arena, 410, 400, "sshd", &[420, 430]);
        node(&mut arena, 420, 410, "bash", &[]);
        node(&mut arena, 430, 410, "bash", &[]);
        node(&mut arena, 500, 1, "cron", &[]);

        let mut buf = Vec::new();
        write_tree(&mut buf, &arena, ProcessId(1), &Palette::plain()).unwrap();

        let expected = "\
systemd (pid 1)
├─sshd (pid 400)
│ └─sshd (pid 410)
│   ├─bash (pid 420)
│   └─bash (pid 430)
└─cron (pid 500)
";
        assert_eq!(String::from_utf8(buf).unwrap(), expected);
    }

    #[test]
    fn test_single_node() {
        let mut arena = ProcessArena::new();
        node(&mut arena, 2, 0, "kthreadd", &[]);

        let mut buf = Vec::new();
        write_tree(&mut buf, &arena, ProcessId(2), &Palette::plain()).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "kthreadd (pid 2)\n");
    }
}
