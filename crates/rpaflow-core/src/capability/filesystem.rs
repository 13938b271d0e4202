//! Filesystem port used by the file actions.

use std::io;
use std::path::Path;

use futures_util::future::BoxFuture;

/// Abstraction over the file operations the engine performs.
pub trait FileSystem: Send + Sync {
    /// Read a UTF-8 file into a string.
    fn read_to_string<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<String>>;

    /// Write `content`, replacing any existing file.
    fn write<'a>(&'a self, path: &'a Path, content: &'a str) -> BoxFuture<'a, io::Result<()>>;

    fn copy<'a>(&'a self, from: &'a Path, to: &'a Path) -> BoxFuture<'a, io::Result<()>>;

    fn rename<'a>(&'a self, from: &'a Path, to: &'a Path) -> BoxFuture<'a, io::Result<()>>;

    fn remove_file<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<()>>;

    fn exists<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, bool>;
}
