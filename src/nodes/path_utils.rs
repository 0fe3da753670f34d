//! Local path reconstruction for synced nodes
//!
//! A synced node only knows its own name and its parent. The full local path
//! is rebuilt by walking the parent links up to the sync root and joining the
//! segments back in root-first order.

use std::path::PathBuf;

use crate::sdk::{LocalNode, LocalNodeLink};

/// Reverse-walk parent links from `leaf` and join the segments, root first,
/// with `separator`.
///
/// No separator is inserted after a segment that already ends with one
/// (e.g. a root of `/` or `C:\`).
pub fn join_reverse<'a, N, U, P, S>(leaf: &'a N, parent: P, segment: S, separator: &[U]) -> Vec<U>
where
    U: Copy + PartialEq + 'a,
    P: Fn(&'a N) -> Option<&'a N>,
    S: Fn(&'a N) -> &'a [U],
{
    let mut segments = Vec::new();
    let mut current = Some(leaf);
    while let Some(node) = current {
        segments.push(segment(node));
        current = parent(node);
    }

    let mut joined: Vec<U> = Vec::new();
    for seg in segments.into_iter().rev() {
        if !joined.is_empty() && !joined.ends_with(separator) {
            joined.extend_from_slice(separator);
        }
        joined.extend_from_slice(seg);
    }
    joined
}

fn local_node_units<U: Copy + PartialEq>(leaf: &LocalNode<U>, separator: &[U]) -> Vec<U> {
    join_reverse(leaf, |n| n.parent.as_deref(), |n| n.name.as_slice(), separator)
}

/// Full local path of a linked node, joined with `separator`.
///
/// Wide links encode the separator as UTF-16 units, narrow links as UTF-8
/// bytes; undecodable units are replaced rather than dropped.
pub fn link_path(link: &LocalNodeLink, separator: char) -> PathBuf {
    match link {
        LocalNodeLink::Narrow(leaf) => {
            let mut buf = [0u8; 4];
            let sep = separator.encode_utf8(&mut buf).as_bytes();
            let units = local_node_units(leaf, sep);
            PathBuf::from(String::from_utf8_lossy(&units).into_owned())
        }
        LocalNodeLink::Wide(leaf) => {
            let mut buf = [0u16; 2];
            let sep = separator.encode_utf16(&mut buf);
            let units = local_node_units(leaf, sep);
            PathBuf::from(String::from_utf16_lossy(&units))
        }
    }
}

impl LocalNodeLink {
    /// Full local path using the host's separator
    pub fn to_path(&self) -> PathBuf {
        link_path(self, std::path::MAIN_SEPARATOR)
    }
}
