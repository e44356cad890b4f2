//! Background music and one-shot effects via rodio.
//!
//! Every clip is read into memory once at start-up. A clip (or the whole
//! output device) that fails to load is logged and then stays silent for the
//! rest of the session.

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use smb_core::config::AssetPaths;
use smb_core::{LoadFailure, SoundCue};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

type ClipBytes = Arc<[u8]>;

/// Read a clip and check that it decodes.
pub fn load_clip(path: &Path) -> Result<ClipBytes, LoadFailure> {
    let bytes: ClipBytes = std::fs::read(path)
        .map_err(|e| LoadFailure::resource(path, e.to_string()))?
        .into();
    Decoder::new(Cursor::new(bytes.clone()))
        .map_err(|e| LoadFailure::resource(path, e.to_string()))?;
    Ok(bytes)
}

fn load_clip_or_silent(path: &str) -> Option<ClipBytes> {
    match load_clip(Path::new(path)) {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            log::warn!("{err}. Playing without it.");
            None
        }
    }
}

struct Output {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

pub struct GameAudio {
    output: Option<Output>,
    music: Option<Sink>,
    jump: Option<ClipBytes>,
    death: Option<ClipBytes>,
}

impl GameAudio {
    pub fn new(paths: &AssetPaths) -> Self {
        let output = match OutputStream::try_default() {
            Ok((stream, handle)) => Some(Output {
                _stream: stream,
                handle,
            }),
            Err(err) => {
                log::warn!("No audio output device: {err}. Running silent.");
                None
            }
        };

        let mut audio = Self {
            output,
            music: None,
            jump: load_clip_or_silent(&paths.jump_sound),
            death: load_clip_or_silent(&paths.death_sound),
        };
        if let Some(music) = load_clip_or_silent(&paths.music) {
            audio.start_music(music);
        }
        audio
    }

    fn start_music(&mut self, bytes: ClipBytes) {
        let Some(output) = &self.output else {
            return;
        };
        let sink = match Sink::try_new(&output.handle) {
            Ok(sink) => sink,
            Err(err) => {
                log::warn!("Failed to open music sink: {err}");
                return;
            }
        };
        match Decoder::new_looped(Cursor::new(bytes)) {
            Ok(source) => {
                sink.append(source);
                log::info!("Background music started");
                self.music = Some(sink);
            }
            Err(err) => log::warn!("Failed to decode music: {err}"),
        }
    }

    fn play_once(&self, clip: Option<&ClipBytes>) {
        let (Some(output), Some(bytes)) = (&self.output, clip) else {
            return;
        };
        let Ok(sink) = Sink::try_new(&output.handle) else {
            return;
        };
        let Ok(source) = Decoder::new(Cursor::new(bytes.clone())) else {
            return;
        };
        sink.append(source);
        sink.detach();
    }

    pub fn play(&mut self, cue: SoundCue) {
        match cue {
            SoundCue::Jump => self.play_once(self.jump.as_ref()),
            SoundCue::Death => self.play_once(self.death.as_ref()),
            SoundCue::StopMusic => {
                if let Some(music) = self.music.take() {
                    music.stop();
                    log::info!("Background music stopped");
                }
            }
        }
    }

    pub fn status_label(&self) -> &'static str {
        match (&self.output, &self.music) {
            (None, _) => "Audio: no device",
            (Some(_), Some(_)) => "Audio: music playing",
            (Some(_), None) => "Audio: music stopped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_clip_is_a_resource_failure() {
        let path = std::env::temp_dir().join(format!(
            "smb_audio_missing_{}.wav",
            std::process::id()
        ));
        let err = load_clip(&path).expect_err("missing clip must fail");
        assert!(matches!(err, LoadFailure::ResourceLoad { .. }));
        assert_eq!(err.path(), path.as_path());
    }

    #[test]
    fn undecodable_clip_is_a_resource_failure() {
        let path = std::env::temp_dir().join(format!(
            "smb_audio_garbage_{}.wav",
            std::process::id()
        ));
        std::fs::write(&path, b"definitely not audio").expect("write clip");
        let err = load_clip(&path).expect_err("garbage must fail to decode");
        assert!(matches!(err, LoadFailure::ResourceLoad { .. }));
        let _ = std::fs::remove_file(path);
    }
}
