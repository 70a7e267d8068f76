//! Object key derivation from host-supplied paths
//!
//! The host hands out two kinds of paths. Downloads and streams receive
//! paths that may still carry the bucket's hostname, while whole reads
//! receive paths that start with one leading segment, so each operation
//! uses its own rule.

/// Key for downloads and streams: `<arch>/` plus whatever follows the last
/// occurrence of the bucket name. A path without the bucket name is used whole.
pub fn download_key(arch: &str, bucket: &str, remote_path: &str) -> String {
    let tail = remote_path
        .rsplit_once(bucket)
        .map_or(remote_path, |(_, tail)| tail);
    format!("{arch}/{tail}")
}

/// Key for whole reads: `<arch>/` plus everything after the first `/`.
/// A path without a slash is used whole.
pub fn read_key(arch: &str, remote_path: &str) -> String {
    let tail = remote_path
        .split_once('/')
        .map_or(remote_path, |(_, tail)| tail);
    format!("{arch}/{tail}")
}
