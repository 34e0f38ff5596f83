//! Abstract directory/file interfaces.
//!
//! The archive and disk-image subsystems expose their contents through
//! these traits and share nothing else; a caller extracting files from an
//! archive or a floppy image walks the same tree shape either way.

use std::time::SystemTime;

/// A named node in a virtual directory tree.
pub trait DirectoryEntry {
    /// Entry name without any path components.
    fn name(&self) -> &str;

    /// Full path from the root, `/`-separated.
    fn path(&self) -> String;

    /// Creation timestamp, if the format records one.
    fn created(&self) -> Option<SystemTime> {
        None
    }

    /// Last-modification timestamp, if the format records one.
    fn modified(&self) -> Option<SystemTime> {
        None
    }

    /// Entry comment; empty when the format has none.
    fn comment(&self) -> &str {
        ""
    }
}

/// A directory node.
pub trait Directory: DirectoryEntry {
    /// Immediate subdirectories.
    fn directories(&self) -> Vec<&dyn Directory>;

    /// Files directly inside this directory.
    fn files(&self) -> Vec<&dyn File>;

    /// Look up an immediate subdirectory by name.
    fn directory(&self, name: &str) -> Option<&dyn Directory> {
        self.directories().into_iter().find(|d| d.name() == name)
    }

    /// Look up a file directly inside this directory by name.
    fn file(&self, name: &str) -> Option<&dyn File> {
        self.files().into_iter().find(|f| f.name() == name)
    }
}

/// A file node with fully materialized contents.
pub trait File: DirectoryEntry {
    /// File contents.
    fn data(&self) -> &[u8];

    /// File size in bytes.
    fn size(&self) -> usize {
        self.data().len()
    }
}
