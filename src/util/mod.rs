pub mod ids;

/// Splits an engine path (forward or backward slashes) into its directory, including the
/// trailing slash, and the file name without extension.
pub fn split_path(path: &str) -> (&str, &str) {
    let (directory, file_name) = match path.rfind(['/', '\\']) {
        Some(index) => path.split_at(index + 1),
        None => ("", path),
    };

    let stem = match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(index) => &file_name[..index],
    };

    (directory, stem)
}

/// Engine paths use forward slashes, descriptors written on Windows may not.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Replaces (or appends) the extension of an engine path.
pub fn with_extension(path: &str, extension: &str) -> String {
    let (directory, stem) = split_path(path);
    format!("{}{}.{}", directory, stem, extension)
}
