/// Sound engine: plays music-macro tunes as synthesized beeps via rodio.
///
/// Each tune is parsed, rendered into one in-memory WAV buffer and queued on
/// a single Sink, so tunes play one after another. `background = false`
/// blocks until the queue has drained.
///
/// Compile without the "sound" feature to disable audio entirely. The stub
/// engine still parses tunes so errors surface the same way.

#[cfg(not(feature = "sound"))]
use crate::ui::music::TuneError;

pub const TUNE_INTRO: &str = "T160O1L8CDEDCDL4ECC";
pub const TUNE_ROUND_START: &str = "T160O1>L20CDEDCDL10ECC";
pub const TUNE_EAT: &str = "O0L16>CCCE";
pub const TUNE_DEATH: &str = "O0L32EFGEFDC";

#[cfg(feature = "sound")]
mod inner {
    use std::cell::Cell;
    use std::io::Cursor;

    use rodio::{OutputStream, Sink};

    use crate::ui::music::{self, MusicState, Note, TuneError};

    const SAMPLE_RATE: u32 = 44100;
    const MIN_FREQ: u32 = 37;
    const MAX_FREQ: u32 = 32767;
    const FADE_IN_MS: u32 = 18;
    const FADE_OUT_MS: u32 = 47;
    const VOLUME: f32 = 0.3;

    pub struct SoundEngine {
        _stream: OutputStream,
        sink: Sink,
        state: Cell<MusicState>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let sink = Sink::try_new(&handle).ok()?;
            Some(SoundEngine {
                _stream: stream,
                sink,
                state: Cell::new(MusicState::default()),
            })
        }

        pub fn play_tune(&self, tune: &str, background: bool) -> Result<(), TuneError> {
            let mut state = self.state.get();
            let notes = music::parse(tune, &mut state)?;
            self.state.set(state);

            let wav = make_wav(&render(&notes));
            if let Ok(src) = rodio::Decoder::new(Cursor::new(wav)) {
                self.sink.append(src);
            }
            if !background {
                self.sink.sleep_until_end();
            }
            Ok(())
        }

        /// Block until every queued tune has finished.
        pub fn wait_until_idle(&self) {
            self.sink.sleep_until_end();
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Synthesis
    // ════════════════════════════════════════════════════════════

    fn samples_for(ms: u32) -> usize {
        (ms as u64 * SAMPLE_RATE as u64 / 1000) as usize
    }

    /// Render notes and rests to mono samples.
    pub(super) fn render(notes: &[Note]) -> Vec<f32> {
        let mut out = Vec::new();
        for note in notes {
            match *note {
                Note::Rest { ms } => out.resize(out.len() + samples_for(ms), 0.0),
                Note::Tone { freq, ms } => beep(&mut out, freq, ms),
            }
        }
        out
    }

    /// Rectified sine raised to 2.3 with a short linear fade at both ends.
    fn beep(out: &mut Vec<f32>, freq: u32, ms: u32) {
        let freq = freq.clamp(MIN_FREQ, MAX_FREQ) as f32;
        let n = samples_for(ms);
        let fade_in = samples_for(FADE_IN_MS);
        let fade_out = samples_for(FADE_OUT_MS);

        for i in 0..n {
            let env = if i < fade_in {
                i as f32 / fade_in as f32
            } else if i + fade_out >= n {
                (n - i - 1) as f32 / fade_out as f32
            } else {
                1.0
            };
            let t = i as f32 / SAMPLE_RATE as f32;
            let wave = (t * freq * 2.0 * std::f32::consts::PI).sin().max(0.0).powf(2.3);
            out.push(wave * env * VOLUME);
        }
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder
    // ════════════════════════════════════════════════════════════

    /// 16-bit mono PCM in a RIFF container.
    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let data_size = samples.len() as u32 * 2;
        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
        buf.extend_from_slice(&2u16.to_le_bytes());
        buf.extend_from_slice(&16u16.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn tone_length_follows_duration() {
            let samples = render(&[Note::Tone { freq: 440, ms: 100 }, Note::Rest { ms: 50 }]);
            assert_eq!(samples.len(), 4410 + 2205);
            assert!(samples[4410..].iter().all(|&s| s == 0.0));
        }

        #[test]
        fn beep_is_half_wave_and_faded() {
            let samples = render(&[Note::Tone { freq: 523, ms: 200 }]);
            assert!(samples.iter().all(|&s| (0.0..=VOLUME).contains(&s)));
            assert_eq!(samples[0], 0.0);
            assert_eq!(*samples.last().unwrap_or(&1.0), 0.0);
            assert!(samples.iter().any(|&s| s > VOLUME * 0.9));
        }

        #[test]
        fn wav_header_sizes_match() {
            let wav = make_wav(&[0.0; 10]);
            assert_eq!(wav.len(), 44 + 20);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]), 56);
            assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 20);
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Stub engine: parses but stays silent when sound is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine {
    state: std::cell::Cell<crate::ui::music::MusicState>,
}

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> {
        Some(SoundEngine { state: std::cell::Cell::new(Default::default()) })
    }

    pub fn play_tune(&self, tune: &str, _background: bool) -> Result<(), TuneError> {
        let mut state = self.state.get();
        crate::ui::music::parse(tune, &mut state)?;
        self.state.set(state);
        Ok(())
    }

    pub fn wait_until_idle(&self) {}
}

/// Let queued tunes run out before moving on.
pub fn wait(sound: Option<&SoundEngine>) {
    if let Some(sfx) = sound {
        sfx.wait_until_idle();
    }
}

/// Play a tune if audio is available, logging rather than failing.
pub fn play(sound: Option<&SoundEngine>, tune: &str, background: bool) {
    if let Some(sfx) = sound {
        if let Err(err) = sfx.play_tune(tune, background) {
            tracing::warn!(%err, tune, "tune rejected");
        }
    }
}
