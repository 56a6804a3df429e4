use std::io;
use std::path::{Component, Path};

/// Extensions listed by `/api/tracks`. Matched exactly, so `.Gpx` is skipped.
const TRACK_EXTENSIONS: [&str; 2] = ["gpx", "GPX"];

/// List GPX files in `tracks_dir` as `/`-joined URL paths relative to
/// `static_root`, so the frontend can fetch them from the static fallback.
/// A missing directory lists nothing; a directory outside the static root is
/// an `InvalidInput` error.
pub fn list_tracks(static_root: &Path, tracks_dir: &Path) -> io::Result<Vec<String>> {
    if !tracks_dir.exists() {
        return Ok(Vec::new());
    }
    let relative_dir = served_path(static_root, tracks_dir)?;

    let mut tracks = Vec::new();
    for entry in std::fs::read_dir(tracks_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_track = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| TRACK_EXTENSIONS.contains(&ext));
        if let (true, Some(name)) = (is_track, path.file_name()) {
            let mut url = relative_dir.clone();
            url.push(name.to_string_lossy().into_owned());
            tracks.push(url.join("/"));
        }
    }
    tracks.sort();
    Ok(tracks)
}

/// Path segments of `dir` below `static_root`.
pub fn served_path(static_root: &Path, dir: &Path) -> io::Result<Vec<String>> {
    let root = static_root.canonicalize()?;
    let dir = dir.canonicalize()?;
    let relative = dir.strip_prefix(&root).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "tracks directory {} is not under static root {}",
                dir.display(),
                root.display()
            ),
        )
    })?;

    Ok(relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect())
}
