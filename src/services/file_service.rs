use std::path::{Path, PathBuf};

/// Destination for converting `input` to `extension`: same directory, same
/// base name, and a ` (n)` suffix when the plain name is already taken.
///
/// Existence is re-checked for every candidate and the counter has no upper
/// bound. Nothing is created on disk.
pub fn resolve_output_path(input: &Path, extension: &str) -> PathBuf {
    resolve_output_path_with(input, extension, |candidate| candidate.exists())
}

/// Same as [`resolve_output_path`] with a caller-supplied existence check.
pub fn resolve_output_path_with<F>(input: &Path, extension: &str, exists: F) -> PathBuf
where
    F: Fn(&Path) -> bool,
{
    let parent = input.parent().unwrap_or(Path::new("")).to_path_buf();
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let extension = extension.trim_start_matches('.');

    let candidate = parent.join(file_name(&stem, extension));
    if !exists(&candidate) {
        return candidate;
    }

    let mut counter: u64 = 1;
    loop {
        let candidate = parent.join(file_name(&format!("{} ({})", stem, counter), extension));
        if !exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

fn file_name(stem: &str, extension: &str) -> String {
    if extension.is_empty() {
        stem.to_string()
    } else {
        format!("{}.{}", stem, extension)
    }
}
