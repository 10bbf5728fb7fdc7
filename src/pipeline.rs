use std::path::PathBuf;

use anyhow::Context as _;

use crate::{
    audio,
    background::{BackgroundLayer, BackgroundSpec},
    config::MixConfig,
    error::MixreelResult,
    export::{self, ExportArtifacts, ExportRequest},
    fonts::FontProvider,
    overlay::{self, OverlaySpec},
    scan,
    select::ChoicePrompt,
    timeline::Timeline,
};

/// How a run ended. Every variant except `Completed` is a clean early exit
/// that produced no output files.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(ExportArtifacts),
    /// The search root contains no subdirectories to offer.
    NoMusicDirs,
    /// "None selected" at the music folder prompt.
    NoMusicSelected,
    /// Backgrounds directory absent (created on the fly) or empty.
    NoBackgrounds,
    /// "None selected" at the background prompt.
    NoBackgroundSelected,
    /// The chosen music folder has no `.mp3`/`.wav` files.
    NoAudioFiles,
}

/// Run the whole pipeline: select, decode, lay out, composite, export.
///
/// Strictly sequential; each stage blocks until complete. Selection-stage
/// "none" results and empty inputs terminate cleanly via [`RunOutcome`];
/// decode/encode failures propagate as errors.
#[tracing::instrument(skip_all)]
pub fn run(cfg: &MixConfig, prompt: &mut dyn ChoicePrompt) -> MixreelResult<RunOutcome> {
    cfg.validate()?;

    let music_dir = match select_music_dir(cfg, prompt)? {
        Selection::Chosen(dir) => dir,
        Selection::NothingToChoose => return Ok(RunOutcome::NoMusicDirs),
        Selection::Aborted => return Ok(RunOutcome::NoMusicSelected),
    };

    let background_path = match select_background(cfg, prompt)? {
        Selection::Chosen(path) => path,
        Selection::NothingToChoose => return Ok(RunOutcome::NoBackgrounds),
        Selection::Aborted => return Ok(RunOutcome::NoBackgroundSelected),
    };
    let background_spec = BackgroundSpec::from_path(background_path)?;

    let audio_files = scan::list_audio_files(&music_dir)?;
    if audio_files.is_empty() {
        tracing::info!(dir = %music_dir.display(), "no music files found");
        return Ok(RunOutcome::NoAudioFiles);
    }
    tracing::info!(
        dir = %music_dir.display(),
        tracks = audio_files.len(),
        "decoding and concatenating tracks"
    );

    let concat = audio::concat_tracks(&audio_files)?;
    let timeline = Timeline::build(concat.tracks().to_vec());
    tracing::info!(
        total_duration_sec = timeline.total_duration_sec(),
        "timeline built"
    );

    let mut fonts = FontProvider::new(&cfg.fonts)?;
    let overlay_spec = OverlaySpec::new(cfg.canvas, cfg.title.clone());
    let overlay = overlay::render_overlay(&timeline, &overlay_spec, &mut fonts)?;

    let mut background = BackgroundLayer::prepare(&background_spec, cfg.canvas)?;

    std::fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("create output directory '{}'", cfg.output_dir.display()))?;
    let video_path = scan::next_free_path(&cfg.output_dir, "final_mix", "mp4");
    let sidecar_path = scan::next_free_path(&cfg.output_dir, "timestamps", "txt");

    let request = ExportRequest {
        canvas: cfg.canvas,
        fps: cfg.fps,
        video_path,
        sidecar_path,
    };
    let artifacts = export::export(&request, &mut background, &overlay, &concat, &timeline)?;

    Ok(RunOutcome::Completed(artifacts))
}

enum Selection<T> {
    Chosen(T),
    NothingToChoose,
    Aborted,
}

fn select_music_dir(
    cfg: &MixConfig,
    prompt: &mut dyn ChoicePrompt,
) -> MixreelResult<Selection<PathBuf>> {
    if let Some(dir) = &cfg.music_dir {
        return Ok(Selection::Chosen(dir.clone()));
    }

    let dirs = scan::list_music_dirs(&cfg.search_root)?;
    if dirs.is_empty() {
        tracing::info!(root = %cfg.search_root.display(), "no directories found");
        return Ok(Selection::NothingToChoose);
    }

    let names: Vec<String> = dirs.iter().map(display_name).collect();
    match prompt.choose("Select the music folder", &names)? {
        Some(idx) => Ok(Selection::Chosen(dirs[idx].clone())),
        None => Ok(Selection::Aborted),
    }
}

fn select_background(
    cfg: &MixConfig,
    prompt: &mut dyn ChoicePrompt,
) -> MixreelResult<Selection<PathBuf>> {
    if let Some(path) = &cfg.background {
        return Ok(Selection::Chosen(path.clone()));
    }

    if !cfg.backgrounds_dir.exists() {
        std::fs::create_dir_all(&cfg.backgrounds_dir).with_context(|| {
            format!(
                "create backgrounds directory '{}'",
                cfg.backgrounds_dir.display()
            )
        })?;
        tracing::info!(
            dir = %cfg.backgrounds_dir.display(),
            "created backgrounds directory; add background images there"
        );
        return Ok(Selection::NothingToChoose);
    }

    let files = scan::list_background_files(&cfg.backgrounds_dir)?;
    if files.is_empty() {
        tracing::info!(
            dir = %cfg.backgrounds_dir.display(),
            "no background files found"
        );
        return Ok(Selection::NothingToChoose);
    }

    let names: Vec<String> = files.iter().map(display_name).collect();
    match prompt.choose("Select the background image/video", &names)? {
        Some(idx) => Ok(Selection::Chosen(files[idx].clone())),
        None => Ok(Selection::Aborted),
    }
}

fn display_name(path: &PathBuf) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
