use std::path::PathBuf;

use clap::Parser;

use mixreel::{MixConfig, RunOutcome, TerminalPrompt};

#[derive(Parser, Debug)]
#[command(name = "mixreel", version, about = "Assemble a mix video from a folder of audio tracks")]
struct Cli {
    /// Music folder to concatenate. Prompts among subdirectories of the
    /// current directory when omitted.
    #[arg(long)]
    music_dir: Option<PathBuf>,

    /// Background image or video. Prompts from the backgrounds directory
    /// when omitted.
    #[arg(long)]
    background: Option<PathBuf>,

    /// Directory scanned for background assets.
    #[arg(long, default_value = "backgrounds")]
    backgrounds_dir: PathBuf,

    /// Directory the video and timestamp listing are written to.
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Overlay heading text.
    #[arg(long, default_value = "SONG LIST")]
    title: String,

    /// Font file for the overlay title (falls back to a system font).
    #[arg(long)]
    title_font: Option<PathBuf>,

    /// Font file for the song lines (falls back to a system font).
    #[arg(long)]
    body_font: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = MixConfig {
        music_dir: cli.music_dir,
        background: cli.background,
        backgrounds_dir: cli.backgrounds_dir,
        output_dir: cli.output_dir,
        title: cli.title,
        fonts: mixreel::FontConfig {
            title_font: cli.title_font,
            body_font: cli.body_font,
        },
        ..MixConfig::default()
    };

    let mut prompt = TerminalPrompt::new();
    match mixreel::run(&cfg, &mut prompt)? {
        RunOutcome::Completed(artifacts) => {
            println!("wrote {}", artifacts.video_path.display());
            println!("wrote {}", artifacts.sidecar_path.display());
        }
        RunOutcome::NoMusicDirs => {
            println!("No directories found!");
        }
        RunOutcome::NoMusicSelected => {
            println!("No music folder selected. Exiting...");
        }
        RunOutcome::NoBackgrounds => {
            println!(
                "No background files in '{}'. Add images or videos there and rerun.",
                cfg.backgrounds_dir.display()
            );
        }
        RunOutcome::NoBackgroundSelected => {
            println!("No background selected. Exiting...");
        }
        RunOutcome::NoAudioFiles => {
            println!("No music files found!");
        }
    }

    Ok(())
}
