//! Desktop test binary for playkit-audio.
//!
//! Run with: `cargo run -p playkit-audio-test [options] [audio_file_or_url]`
//!
//! Options:
//!   `--title <title>`      Set the track title
//!   `--artist <artist>`    Set the artist name
//!   `--album <album>`      Set the album name
//!   `--artwork <path>`     Set artwork image path
//!   `--rate <rate>`        Set the playback rate

use playkit_audio::{
    ArtworkSource, AudioPlayer, AudioPlayerState, DefaultAudioItem, PlaybackEndedReason,
    RemoteCommand, SourceType, TimeEventFrequency,
};
use std::sync::Arc;
use std::sync::mpsc;

struct Args {
    source: Option<String>,
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    artwork: Option<String>,
    rate: Option<f32>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        source: None,
        title: None,
        artist: None,
        album: None,
        artwork: None,
        rate: None,
    };

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match args[i].as_str() {
            "--title" if value.is_some() => {
                parsed.title = value;
                i += 2;
            }
            "--artist" if value.is_some() => {
                parsed.artist = value;
                i += 2;
            }
            "--album" if value.is_some() => {
                parsed.album = value;
                i += 2;
            }
            "--artwork" if value.is_some() => {
                parsed.artwork = value;
                i += 2;
            }
            "--rate" if value.is_some() => {
                parsed.rate = value.and_then(|v| v.parse().ok());
                i += 2;
            }
            arg if !arg.starts_with("--") => {
                parsed.source = Some(arg.to_string());
                i += 1;
            }
            _ => i += 1,
        }
    }

    parsed
}

fn expand_path(path: &str) -> String {
    if path.starts_with("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        path.replacen('~', &home, 1)
    } else {
        path.to_string()
    }
}

/// Write a 440 Hz mono tone as 16-bit PCM WAV.
fn write_test_tone(seconds: u32) -> std::io::Result<String> {
    const SAMPLE_RATE: u32 = 44_100;
    let samples = SAMPLE_RATE * seconds;
    let data_len = samples * 2;

    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVEfmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    for n in 0..samples {
        let t = f64::from(n) / f64::from(SAMPLE_RATE);
        let sample = (t * 440.0 * std::f64::consts::TAU).sin() * 0.3 * f64::from(i16::MAX);
        wav.extend_from_slice(&(sample as i16).to_le_bytes());
    }

    let path = std::env::temp_dir().join("playkit-test-tone.wav");
    std::fs::write(&path, wav)?;
    Ok(path.display().to_string())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = parse_args();

    println!("=== Playkit AudioPlayer Test ===\n");

    let (source, source_type) = match args.source {
        Some(source) if source.starts_with("http://") || source.starts_with("https://") => {
            (source, SourceType::Stream)
        }
        Some(path) => (expand_path(&path), SourceType::File),
        None => {
            println!("No file specified, playing 440Hz test tone...");
            match write_test_tone(30) {
                Ok(path) => (path, SourceType::File),
                Err(e) => {
                    println!("✗ Failed to write test tone: {e}");
                    return;
                }
            }
        }
    };

    let track_title = args.title.unwrap_or_else(|| {
        std::path::Path::new(&source)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Test Audio")
            .to_string()
    });
    let track_artist = args.artist.unwrap_or_else(|| "Unknown Artist".to_string());
    let track_album = args.album.unwrap_or_else(|| "Unknown Album".to_string());

    let mut item = DefaultAudioItem::new(&source, source_type)
        .title(&track_title)
        .artist(&track_artist)
        .album_title(&track_album);
    if let Some(art_path) = args.artwork {
        let expanded = expand_path(&art_path);
        println!("Artwork: {expanded}");
        item = item.artwork(ArtworkSource::File(expanded.into()));
    }

    println!("Creating audio player...");
    let player = match AudioPlayer::builder()
        .remote_commands(vec![
            RemoteCommand::Play,
            RemoteCommand::Pause,
            RemoteCommand::TogglePlayPause,
            RemoteCommand::Stop,
            RemoteCommand::ChangePlaybackPosition,
            RemoteCommand::SkipForward {
                preferred_intervals: vec![15.0],
            },
            RemoteCommand::SkipBackward {
                preferred_intervals: vec![15.0],
            },
        ])
        .build()
    {
        Ok(p) => {
            println!("✓ Audio player created\n");
            p
        }
        Err(e) => {
            println!("✗ Failed to create player: {e}\n");
            return;
        }
    };

    let (ended_tx, ended_rx) = mpsc::channel();
    let events = player.events();
    events.state_change.subscribe(|state| println!("  state: {state:?}"));
    events
        .seconds_elapse
        .subscribe(|seconds| println!("  elapsed: {seconds:.1}s"));
    events
        .update_duration
        .subscribe(|duration| println!("  duration: {duration:.1}s"));
    events.fail.subscribe(|error| match error {
        Some(error) => println!("✗ Playback failed: {error}"),
        None => println!("✗ Playback failed"),
    });
    let failed_tx = ended_tx.clone();
    events.state_change.subscribe(move |state| {
        if *state == AudioPlayerState::Failed {
            let _ = failed_tx.send(None);
        }
    });
    events.playback_end.subscribe(move |reason| {
        let _ = ended_tx.send(Some(*reason));
    });

    player.set_time_event_frequency(TimeEventFrequency::EverySecond);
    if let Some(rate) = args.rate {
        player.set_rate(rate);
    }

    println!("Now Playing:");
    println!("  Title:  {track_title}");
    println!("  Artist: {track_artist}");
    println!("  Album:  {track_album}");
    println!();

    println!("Playing: {source}");
    if let Err(e) = player.load(Arc::new(item), Some(true)) {
        println!("✗ Failed to load: {e}\n");
        return;
    }

    println!("Controls:");
    println!("  - Use media keys or the desktop media widget to pause/play/seek");
    println!("  - Press Ctrl+C to stop");
    println!();

    match ended_rx.recv() {
        Ok(Some(PlaybackEndedReason::PlayedUntilEnd)) => println!("\n=== Playback Complete ==="),
        Ok(Some(reason)) => println!("\n=== Playback Ended: {reason:?} ==="),
        Ok(None) | Err(_) => println!("\n=== Playback Failed ==="),
    }
    log::info!("exiting");
}
