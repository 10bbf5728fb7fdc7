use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::error::MixreelResult;

/// Audio extensions accepted as mix tracks (case-insensitive).
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav"];
/// Extensions accepted as background assets (case-insensitive).
pub const BACKGROUND_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "mp4"];

/// Immediate subdirectories of `root`, sorted by name.
pub fn list_music_dirs(root: &Path) -> MixreelResult<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let entries = std::fs::read_dir(root)
        .with_context(|| format!("read directory '{}'", root.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in '{}'", root.display()))?;
        if entry
            .file_type()
            .with_context(|| format!("stat '{}'", entry.path().display()))?
            .is_dir()
        {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Audio files in `dir`, sorted lexicographically by file name.
///
/// Filesystem enumeration order is not stable across platforms, so track
/// order is pinned by sorting here; the timeline preserves whatever order it
/// is handed.
pub fn list_audio_files(dir: &Path) -> MixreelResult<Vec<PathBuf>> {
    list_files_with_extensions(dir, AUDIO_EXTENSIONS)
}

/// Background asset files in `dir`, sorted by file name.
pub fn list_background_files(dir: &Path) -> MixreelResult<Vec<PathBuf>> {
    list_files_with_extensions(dir, BACKGROUND_EXTENSIONS)
}

fn list_files_with_extensions(dir: &Path, extensions: &[&str]) -> MixreelResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read directory '{}'", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in '{}'", dir.display()))?;
        let path = entry.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }
    files.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}

/// Next non-colliding `<stem>.<ext>` path in `dir`.
///
/// The unsuffixed name wins when free; otherwise the smallest positive
/// suffix `_<n>` not already in use, checked sequentially from 1.
pub fn next_free_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    let canonical = dir.join(format!("{stem}.{ext}"));
    if !canonical.exists() {
        return canonical;
    }

    let mut counter = 1u32;
    loop {
        let candidate = dir.join(format!("{stem}_{counter}.{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = PathBuf::from("target")
            .join("scan_tests")
            .join(format!("{tag}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn audio_listing_filters_and_sorts() {
        let dir = scratch_dir("audio");
        for name in ["b.mp3", "a.WAV", "cover.png", "notes.txt", "c.wav"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        let files = list_audio_files(&dir).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.WAV", "b.mp3", "c.wav"]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn background_listing_accepts_images_and_mp4() {
        let dir = scratch_dir("backgrounds");
        for name in ["loop.mp4", "scene.jpeg", "scene.gif", "still.JPG"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        let files = list_background_files(&dir).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["loop.mp4", "scene.jpeg", "still.JPG"]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn music_dirs_lists_only_directories() {
        let dir = scratch_dir("dirs");
        std::fs::create_dir_all(dir.join("mixes")).unwrap();
        std::fs::create_dir_all(dir.join("archive")).unwrap();
        std::fs::write(dir.join("readme.txt"), b"x").unwrap();

        let dirs = list_music_dirs(&dir).unwrap();
        let names: Vec<String> = dirs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["archive", "mixes"]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn collision_suffixes_count_up_from_one() {
        let dir = scratch_dir("collide");

        assert_eq!(
            next_free_path(&dir, "final_mix", "mp4"),
            dir.join("final_mix.mp4")
        );

        std::fs::write(dir.join("final_mix.mp4"), b"x").unwrap();
        assert_eq!(
            next_free_path(&dir, "final_mix", "mp4"),
            dir.join("final_mix_1.mp4")
        );

        std::fs::write(dir.join("final_mix_1.mp4"), b"x").unwrap();
        assert_eq!(
            next_free_path(&dir, "final_mix", "mp4"),
            dir.join("final_mix_2.mp4")
        );

        // Suffixing is independent per file kind.
        assert_eq!(
            next_free_path(&dir, "timestamps", "txt"),
            dir.join("timestamps.txt")
        );

        std::fs::remove_dir_all(&dir).ok();
    }
}
