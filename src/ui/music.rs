/// Music macro language parser.
///
/// A small subset of the classic `PLAY` string syntax:
///
///   T n      tempo, quarter notes per minute (32..=255)
///   O n      octave (0..=6)
///   < >      octave down / up, clamped to 0..=6
///   L n      default note length (1 = whole, 4 = quarter, ...)
///   P n      rest of length n
///   A..G     note, optionally followed by `#`/`+` (sharp) or `-` (flat)
///            and `.` (dotted, ×1.5)
///
/// Commands are case-insensitive and whitespace is ignored. Tempo, octave
/// and length persist from one tune to the next.

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

const SHARPS: [&str; 12] = ["c", "c#", "d", "d#", "e", "f", "f#", "g", "g#", "a", "a#", "b"];
const FLATS: [&str; 12] = ["c", "d-", "d", "e-", "e", "f", "g-", "g", "a-", "a", "b-", "b"];

const MAX_OCTAVE: u32 = 6;
/// Milliseconds in a whole note at one beat per minute.
const WHOLE_NOTE_MS: f64 = 240_000.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TuneError {
    #[error("octave must be from 0 to 6, got {0}")]
    Octave(u32),
    #[error("tempo must be from 32 to 255, got {0}")]
    Tempo(u32),
    #[error("note length cannot be zero")]
    Length,
    #[error("rest length cannot be zero")]
    Rest,
    #[error("unrecognised note: {0}")]
    Note(String),
    #[error("missing number after `{0}`")]
    MissingNumber(char),
    #[error("unrecognised command: {0}")]
    Command(char),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Note {
    Tone { freq: u32, ms: u32 },
    Rest { ms: u32 },
}

/// Settings carried between tunes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MusicState {
    pub tempo: u32,
    pub octave: u32,
    pub length: u32,
}

impl Default for MusicState {
    fn default() -> Self {
        MusicState { tempo: 120, octave: 0, length: 1 }
    }
}

/// Parse a tune. `state` is only updated if the whole tune parses.
pub fn parse(tune: &str, state: &mut MusicState) -> Result<Vec<Note>, TuneError> {
    let mut s = *state;
    let mut notes = Vec::new();
    let mut chars = tune.chars().peekable();

    while let Some(c) = next_token(&mut chars) {
        match c.to_ascii_lowercase() {
            'o' => {
                let n = number(&mut chars, c)?;
                if n > MAX_OCTAVE {
                    return Err(TuneError::Octave(n));
                }
                s.octave = n;
            }
            '>' => s.octave = (s.octave + 1).min(MAX_OCTAVE),
            '<' => s.octave = s.octave.saturating_sub(1),
            'l' => {
                let n = number(&mut chars, c)?;
                if n < 1 {
                    return Err(TuneError::Length);
                }
                s.length = n;
            }
            'p' => {
                let n = number(&mut chars, c)?;
                if n < 1 {
                    return Err(TuneError::Rest);
                }
                notes.push(Note::Rest { ms: 240_000 / s.tempo / n });
            }
            't' => {
                let n = number(&mut chars, c)?;
                if !(32..=255).contains(&n) {
                    return Err(TuneError::Tempo(n));
                }
                s.tempo = n;
            }
            letter @ 'a'..='g' => notes.push(note(letter, &mut chars, &s)?),
            _ => return Err(TuneError::Command(c)),
        }
    }

    *state = s;
    Ok(notes)
}

fn skip_space(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

fn next_token(chars: &mut Peekable<Chars<'_>>) -> Option<char> {
    skip_space(chars);
    chars.next()
}

fn number(chars: &mut Peekable<Chars<'_>>, command: char) -> Result<u32, TuneError> {
    skip_space(chars);
    let mut value: Option<u32> = None;
    while let Some(d) = chars.next_if(|c| c.is_ascii_digit()) {
        let digit = d.to_digit(10).unwrap_or(0);
        value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(digit));
    }
    value.ok_or(TuneError::MissingNumber(command))
}

fn note(letter: char, chars: &mut Peekable<Chars<'_>>, s: &MusicState) -> Result<Note, TuneError> {
    let mut name = letter.to_string();
    skip_space(chars);
    match chars.next_if(|c| matches!(c, '#' | '+' | '-')) {
        Some('+') | Some('#') => name.push('#'),
        Some('-') => name.push('-'),
        _ => {}
    }
    skip_space(chars);
    let dotted = chars.next_if_eq(&'.').is_some();

    let index = SHARPS
        .iter()
        .position(|n| *n == name)
        .or_else(|| FLATS.iter().position(|n| *n == name))
        .ok_or(TuneError::Note(name))?;

    let exponent = s.octave as f64 + (index + 3) as f64 / 12.0;
    let freq = (440.0 * 2f64.powf(exponent)) as u32;
    let times = if dotted { 1.5 } else { 1.0 };
    let ms = (WHOLE_NOTE_MS * times / s.tempo as f64 / s.length as f64) as u32;
    Ok(Note::Tone { freq, ms })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tones(notes: &[Note]) -> Vec<(u32, u32)> {
        notes
            .iter()
            .filter_map(|n| match *n {
                Note::Tone { freq, ms } => Some((freq, ms)),
                Note::Rest { .. } => None,
            })
            .collect()
    }

    #[test]
    fn intro_tune_parses() {
        let mut s = MusicState::default();
        let notes = parse("T160O1L8CDEDCDL4ECC", &mut s).unwrap();
        assert_eq!(notes.len(), 9);
        assert_eq!(notes[0], Note::Tone { freq: 1046, ms: 187 });
        assert_eq!(notes[7], Note::Tone { freq: 1046, ms: 375 });
        assert_eq!(s, MusicState { tempo: 160, octave: 1, length: 4 });
    }

    #[test]
    fn octave_shifts_clamp() {
        let mut s = MusicState::default();
        parse("O6>>", &mut s).unwrap();
        assert_eq!(s.octave, 6);
        parse("O0<<", &mut s).unwrap();
        assert_eq!(s.octave, 0);
    }

    #[test]
    fn bad_octave_leaves_state_alone() {
        let mut s = MusicState::default();
        parse("T200 L4", &mut s).unwrap();
        let before = s;
        assert_eq!(parse("O2 C O7", &mut s), Err(TuneError::Octave(7)));
        assert_eq!(s, before);
    }

    #[test]
    fn state_persists_between_tunes() {
        let mut s = MusicState::default();
        parse("T200", &mut s).unwrap();
        let notes = parse("C", &mut s).unwrap();
        assert_eq!(notes, vec![Note::Tone { freq: 523, ms: 1200 }]);
    }

    #[test]
    fn sharps_and_flats_agree() {
        let mut s = MusicState::default();
        let a = parse("D# C+ G-", &mut s).unwrap();
        let b = parse("E- C# F#", &mut s).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn dotted_notes_last_longer() {
        let mut s = MusicState::default();
        let notes = parse("L4 C.", &mut s).unwrap();
        assert_eq!(tones(&notes)[0].1, 750);
    }

    #[test]
    fn rests_use_integer_division() {
        let mut s = MusicState::default();
        assert_eq!(parse("P4", &mut s).unwrap(), vec![Note::Rest { ms: 500 }]);
        parse("T160", &mut s).unwrap();
        assert_eq!(parse("P3", &mut s).unwrap(), vec![Note::Rest { ms: 500 }]);
        parse("T255", &mut s).unwrap();
        assert_eq!(parse("P7", &mut s).unwrap(), vec![Note::Rest { ms: 134 }]);
    }

    #[test]
    fn case_and_whitespace_are_ignored() {
        let mut a = MusicState::default();
        let mut b = MusicState::default();
        assert_eq!(
            parse("t 120 o 2 l 8 c d e", &mut a).unwrap(),
            parse("T120O2L8CDE", &mut b).unwrap()
        );
    }

    #[test]
    fn invalid_input_is_rejected() {
        let mut s = MusicState::default();
        assert_eq!(parse("X", &mut s), Err(TuneError::Command('X')));
        assert_eq!(parse("L0", &mut s), Err(TuneError::Length));
        assert_eq!(parse("P0", &mut s), Err(TuneError::Rest));
        assert_eq!(parse("T20", &mut s), Err(TuneError::Tempo(20)));
        assert_eq!(parse("T256", &mut s), Err(TuneError::Tempo(256)));
        assert_eq!(parse("O", &mut s), Err(TuneError::MissingNumber('O')));
        assert_eq!(parse("E#", &mut s), Err(TuneError::Note("e#".into())));
        assert_eq!(parse("C-", &mut s), Err(TuneError::Note("c-".into())));
        assert_eq!(s, MusicState::default());
    }

    #[test]
    fn game_tunes_parse() {
        let mut s = MusicState::default();
        for tune in ["T160O1>L20CDEDCDL10ECC", "O0L16>CCCE", "O0L32EFGEFDC"] {
            assert!(!parse(tune, &mut s).unwrap().is_empty(), "{tune}");
        }
    }
}
