use std::{collections::VecDeque, path::PathBuf};

use mixreel::{ChoicePrompt, MixConfig, MixreelResult, RunOutcome};

struct ScriptedPrompt {
    answers: VecDeque<Option<usize>>,
}

impl ScriptedPrompt {
    fn new(answers: impl IntoIterator<Item = Option<usize>>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
        }
    }
}

impl ChoicePrompt for ScriptedPrompt {
    fn choose(&mut self, _message: &str, _choices: &[String]) -> MixreelResult<Option<usize>> {
        Ok(self.answers.pop_front().flatten())
    }
}

fn scratch_root(tag: &str) -> PathBuf {
    let root = PathBuf::from("target")
        .join("pipeline_select")
        .join(format!("{tag}_{}", std::process::id()));
    std::fs::remove_dir_all(&root).ok();
    std::fs::create_dir_all(&root).unwrap();
    root
}

fn config_in(root: &PathBuf) -> MixConfig {
    MixConfig {
        search_root: root.clone(),
        backgrounds_dir: root.join("backgrounds"),
        output_dir: root.join("output"),
        ..MixConfig::default()
    }
}

fn assert_no_outputs(cfg: &MixConfig) {
    if let Ok(entries) = std::fs::read_dir(&cfg.output_dir) {
        assert_eq!(entries.count(), 0, "clean exit must not produce outputs");
    }
}

#[test]
fn empty_search_root_has_nothing_to_offer() {
    let root = scratch_root("empty_root");
    let cfg = config_in(&root);

    let mut prompt = ScriptedPrompt::new([]);
    let outcome = mixreel::run(&cfg, &mut prompt).unwrap();
    assert!(matches!(outcome, RunOutcome::NoMusicDirs));
    assert_no_outputs(&cfg);
}

#[test]
fn none_selected_at_music_prompt_exits_cleanly() {
    let root = scratch_root("abort_music");
    std::fs::create_dir_all(root.join("my_mix")).unwrap();
    let cfg = config_in(&root);

    let mut prompt = ScriptedPrompt::new([None]);
    let outcome = mixreel::run(&cfg, &mut prompt).unwrap();
    assert!(matches!(outcome, RunOutcome::NoMusicSelected));
    assert_no_outputs(&cfg);
}

#[test]
fn missing_backgrounds_dir_is_created_then_treated_as_empty() {
    let root = scratch_root("missing_bgs");
    let mut cfg = config_in(&root);
    cfg.music_dir = Some(root.join("tracks"));
    std::fs::create_dir_all(root.join("tracks")).unwrap();

    assert!(!cfg.backgrounds_dir.exists());
    let mut prompt = ScriptedPrompt::new([]);
    let outcome = mixreel::run(&cfg, &mut prompt).unwrap();
    assert!(matches!(outcome, RunOutcome::NoBackgrounds));
    assert!(cfg.backgrounds_dir.exists());
    assert_no_outputs(&cfg);
}

#[test]
fn none_selected_at_background_prompt_exits_cleanly() {
    let root = scratch_root("abort_background");
    let mut cfg = config_in(&root);
    cfg.music_dir = Some(root.join("tracks"));
    std::fs::create_dir_all(root.join("tracks")).unwrap();
    std::fs::create_dir_all(&cfg.backgrounds_dir).unwrap();
    std::fs::write(cfg.backgrounds_dir.join("scene.png"), b"not-a-real-png").unwrap();

    let mut prompt = ScriptedPrompt::new([None]);
    let outcome = mixreel::run(&cfg, &mut prompt).unwrap();
    assert!(matches!(outcome, RunOutcome::NoBackgroundSelected));
    assert_no_outputs(&cfg);
}

#[test]
fn music_folder_without_audio_files_exits_cleanly() {
    let root = scratch_root("no_audio");
    let mut cfg = config_in(&root);
    cfg.music_dir = Some(root.join("tracks"));
    std::fs::create_dir_all(root.join("tracks")).unwrap();
    std::fs::write(root.join("tracks").join("cover.png"), b"x").unwrap();
    // Background is configured explicitly, so no prompt fires; the empty
    // music folder is detected before any media is opened.
    cfg.background = Some(root.join("scene.jpg"));

    let mut prompt = ScriptedPrompt::new([]);
    let outcome = mixreel::run(&cfg, &mut prompt).unwrap();
    assert!(matches!(outcome, RunOutcome::NoAudioFiles));
    assert_no_outputs(&cfg);
}

#[test]
fn unsupported_background_extension_is_a_validation_error() {
    let root = scratch_root("bad_background");
    let mut cfg = config_in(&root);
    cfg.music_dir = Some(root.join("tracks"));
    std::fs::create_dir_all(root.join("tracks")).unwrap();
    cfg.background = Some(root.join("scene.gif"));

    let mut prompt = ScriptedPrompt::new([]);
    assert!(mixreel::run(&cfg, &mut prompt).is_err());
    assert_no_outputs(&cfg);
}
