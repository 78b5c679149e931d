//! Image Volume Tests
//!
//! On-disk volume images and the CLI command flow over them.

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use trackport::cli::{commands, ExportArgs};
use trackport::volume::image::MANIFEST_FILE;
use trackport::volume::memory::{MemoryProject, MemorySong, MemoryVolume};
use trackport::volume::{ImageVolume, Volume};
use trackport::{Session, TrackFailure, TrackportError};

const FRAMES: u64 = 200;

fn sample(frame: u64, channel: usize) -> u32 {
    ((channel as u32) << 16) | (frame as u32 & 0xFFFF)
}

fn build_image(dir: &Path) -> ImageVolume {
    let take = MemorySong::from_fn("Take 1", 48000, 6, FRAMES, sample);
    let mix = MemorySong::from_fn("Mix", 44100, 2, 10, sample);
    let source = MemoryVolume::new("Session Disk")
        .with_project(MemoryProject::new("Live").with_song(take).with_song(mix));
    ImageVolume::create(dir, &source).unwrap()
}

fn export_args(image: &Path, out: &Path) -> ExportArgs {
    ExportArgs {
        image: image.to_path_buf(),
        song: 1,
        tracks: Vec::new(),
        all: false,
        out: Some(out.to_path_buf()),
        format: None,
        chunk: None,
        config: None,
        json: false,
    }
}

fn payload_of(path: &Path) -> Vec<u8> {
    let bytes = fs::read(path).unwrap();
    bytes[54..].to_vec()
}

#[test]
fn test_image_round_trips_volume_layout() {
    let dir = tempdir().unwrap();
    build_image(dir.path());

    let volume = ImageVolume::open(dir.path()).unwrap();
    assert!(volume.is_open());
    assert_eq!(volume.name(), "Session Disk");
    assert_eq!(volume.project_count(), 1);
    assert_eq!(volume.project_name(1).as_deref(), Some("Live"));
    assert_eq!(volume.song_count(1), 2);

    let mut song = volume.open_song(1, 1).unwrap();
    assert_eq!(song.name(), "Take 1");
    assert_eq!(song.channel_count(), 6);
    assert_eq!(song.frame_count(), FRAMES);

    song.seek(17).unwrap();
    let mut frame = [0u32; 6];
    song.read_frame(&mut frame).unwrap();
    let expected: Vec<u32> = (0..6).map(|c| sample(17, c)).collect();
    assert_eq!(frame.to_vec(), expected);
}

#[test]
fn test_image_opens_from_manifest_path() {
    let dir = tempdir().unwrap();
    build_image(dir.path());

    let volume = ImageVolume::open(&dir.path().join(MANIFEST_FILE)).unwrap();
    assert_eq!(volume.song_count(1), 2);
}

#[test]
fn test_missing_image_is_reported() {
    let dir = tempdir().unwrap();
    let result = ImageVolume::open(&dir.path().join("nowhere"));
    assert!(matches!(result, Err(TrackportError::VolumeNotFound { .. })));
}

#[test]
fn test_truncated_song_data_is_skipped_in_catalog() {
    let dir = tempdir().unwrap();
    build_image(dir.path());
    // Cut the second song's data short
    fs::write(dir.path().join("p01_s02.raw"), [0u8; 5]).unwrap();

    let volume = ImageVolume::open(dir.path()).unwrap();
    let session = Session::open(&volume).unwrap();
    let names: Vec<&str> = session
        .catalog()
        .iter()
        .map(|entry| entry.song_name.as_str())
        .collect();
    assert_eq!(names, vec!["Take 1"]);
}

#[test]
fn test_info_and_list_commands_succeed() {
    let dir = tempdir().unwrap();
    build_image(dir.path());

    commands::info(dir.path()).unwrap();
    commands::list(dir.path()).unwrap();
    commands::tracks(dir.path(), 2).unwrap();
    assert!(matches!(
        commands::tracks(dir.path(), 3),
        Err(TrackportError::SongNotFound { index: 3 })
    ));
}

#[test]
fn test_export_command_writes_requested_tracks() {
    let image = tempdir().unwrap();
    let out = tempdir().unwrap();
    build_image(image.path());
    let destination: PathBuf = out.path().join("stems");

    let mut args = export_args(image.path(), &destination);
    args.tracks = vec![2, 5];
    let result = commands::export(&args).unwrap();

    assert!(result.is_success());
    assert_eq!(result.succeeded.iter().copied().collect::<Vec<_>>(), vec![1, 4]);
    assert_eq!(result.bytes_written, 2 * FRAMES * 3);

    let track5 = payload_of(&destination.join("Take 1_Track05.aif"));
    let expected: Vec<u8> = (0..FRAMES)
        .flat_map(|f| {
            let s = sample(f, 4);
            [s as u8, (s >> 8) as u8, (s >> 16) as u8]
        })
        .collect();
    assert_eq!(track5, expected);
    assert!(!destination.join("Take 1_Track01.aif").exists());
}

#[test]
fn test_export_command_all_tracks_as_wav() {
    let image = tempdir().unwrap();
    let out = tempdir().unwrap();
    build_image(image.path());

    let mut args = export_args(image.path(), out.path());
    args.song = 2;
    args.all = true;
    args.format = Some("wav".to_string());
    let result = commands::export(&args).unwrap();

    assert_eq!(result.succeeded.len(), 2);
    for track in 1..=2 {
        let path = out.path().join(format!("Mix_Track{:02}.wav", track));
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 44100);
        assert_eq!(reader.len(), 10);
    }
}

#[test]
fn test_export_command_rejects_bad_arguments() {
    let image = tempdir().unwrap();
    let out = tempdir().unwrap();
    build_image(image.path());

    let args = export_args(image.path(), out.path());
    assert!(matches!(
        commands::export(&args),
        Err(TrackportError::NoChannelsSelected)
    ));

    let mut args = export_args(image.path(), out.path());
    args.tracks = vec![7];
    assert!(matches!(commands::export(&args), Err(TrackportError::Config { .. })));

    let mut args = export_args(image.path(), out.path());
    args.all = true;
    args.format = Some("mp3".to_string());
    assert!(matches!(commands::export(&args), Err(TrackportError::Config { .. })));

    let mut args = export_args(image.path(), out.path());
    args.song = 0;
    args.all = true;
    assert!(matches!(
        commands::export(&args),
        Err(TrackportError::SongNotFound { index: 0 })
    ));
}

#[test]
fn test_export_command_reads_config_file() {
    let image = tempdir().unwrap();
    let out = tempdir().unwrap();
    build_image(image.path());

    let config_path = out.path().join("export.json");
    let destination = out.path().join("from_config");
    fs::write(
        &config_path,
        format!(
            r#"{{ "destination": {:?}, "format": "wav", "chunk_frames": 64 }}"#,
            destination.to_string_lossy()
        ),
    )
    .unwrap();

    let mut args = export_args(image.path(), out.path());
    args.out = None;
    args.config = Some(config_path);
    args.tracks = vec![1];
    commands::export(&args).unwrap();

    assert!(destination.join("Take 1_Track01.wav").exists());
}

#[test]
fn test_existing_file_is_replaced_and_blocked_path_fails() {
    let image = tempdir().unwrap();
    let out = tempdir().unwrap();
    build_image(image.path());
    fs::write(out.path().join("Take 1_Track01.aif"), b"stale").unwrap();
    fs::create_dir(out.path().join("Take 1_Track02.aif")).unwrap();

    let mut args = export_args(image.path(), out.path());
    args.tracks = vec![1, 2];
    let result = commands::export(&args).unwrap();

    assert_eq!(result.succeeded.iter().copied().collect::<Vec<_>>(), vec![0]);
    assert!(matches!(
        result.failed.get(&1),
        Some(TrackFailure::CannotCreateOutput(_))
    ));
    let replaced = fs::read(out.path().join("Take 1_Track01.aif")).unwrap();
    assert_eq!(&replaced[0..4], b"FORM");
}

#[test]
fn test_json_export_writes_tracks() {
    let image = tempdir().unwrap();
    let out = tempdir().unwrap();
    build_image(image.path());

    let mut args = export_args(image.path(), out.path());
    args.tracks = vec![3];
    args.json = true;
    let result = commands::export(&args).unwrap();

    assert!(result.is_success());
    assert_eq!(result.bytes_written, FRAMES * 3);
    assert!(out.path().join("Take 1_Track03.aif").exists());
}
