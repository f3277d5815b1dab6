use std::path::{Path, PathBuf};

/// Size of a file in bytes, or 0 if it cannot be stat'd
pub fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|meta| meta.len()).unwrap_or(0)
}

/// Replace the extension of the file name, keeping its directory.
///
/// `ext` is given without the leading dot. A name without an extension gets
/// one appended. No filesystem access.
pub fn change_extension(path: &Path, ext: &str) -> PathBuf {
    path.with_extension(ext)
}

/// Output path for a conversion: the input renamed to `.mp4`
pub fn output_path_for(input: &Path) -> PathBuf {
    change_extension(input, "mp4")
}

/// Whether writing `output` would clobber `input`.
///
/// An `.mp4` input in any letter case counts, since `clip.MP4` and `clip.mp4`
/// are one file on case-insensitive filesystems. When both exist they are also
/// compared after resolving links.
pub fn overwrites_input(input: &Path, output: &Path) -> bool {
    if input == output {
        return true;
    }

    if input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"))
    {
        return true;
    }

    match (std::fs::canonicalize(input), std::fs::canonicalize(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
