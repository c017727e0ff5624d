//! Pitch arithmetic: token parsing, diatonic stepping and range clamping.
//!
//! Stepping moves along the natural letter cycle C D E F G A B and never touches the
//! accidental, so `F#4` stepped up once is `G#4`. Range checks compare the diatonic
//! degree (`octave * 7 + letter index`) and likewise ignore accidentals.

use crate::ast::{Accidental, NoteName, Pitch};
use std::str::FromStr;

/// Lowest pitch reachable by nudging.
pub const MIN_PITCH: Pitch = Pitch {
    letter: NoteName::C,
    accidental: Accidental::None,
    octave: 3,
};

/// Highest pitch reachable by nudging.
pub const MAX_PITCH: Pitch = Pitch {
    letter: NoteName::C,
    accidental: Accidental::None,
    octave: 6,
};

/// Parse a pitch token: `[A-Ga-g](#|b)?[0-9]`.
///
/// The letter is case-insensitive and normalized to upper case. Anything else,
/// including multi-digit octaves or doubled accidentals, is rejected.
pub fn parse_pitch(token: &str) -> Option<Pitch> {
    let mut chars = token.chars();
    let letter = NoteName::from_char(chars.next()?)?;

    let mut next = chars.next()?;
    let accidental = match next {
        '#' => Accidental::Sharp,
        'b' => Accidental::Flat,
        _ => Accidental::None,
    };
    if accidental != Accidental::None {
        next = chars.next()?;
    }

    let octave = next.to_digit(10)? as i32;
    if chars.next().is_some() {
        return None;
    }

    Some(Pitch::new(letter, accidental, octave))
}

impl FromStr for Pitch {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_pitch(s).ok_or(())
    }
}

/// Diatonic degree counted from C0, ignoring the accidental.
///
/// Widened to `i64` so that any `i32` octave plus any `i32` step fits.
pub fn diatonic_degree(pitch: Pitch) -> i64 {
    i64::from(pitch.octave) * 7 + i64::from(pitch.letter.index())
}

/// Move `steps` letters along C D E F G A B, carrying into the octave on wrap.
///
/// The octave saturates at the `i32` bounds; [`clamp`] brings any result back into
/// the nudge range.
pub fn step_by_diatonic_degree(pitch: Pitch, steps: i32) -> Pitch {
    if steps == 0 {
        return pitch;
    }
    let degree = diatonic_degree(pitch) + i64::from(steps);
    let octave = degree.div_euclid(7);
    let octave = i32::try_from(octave).unwrap_or(if octave < 0 { i32::MIN } else { i32::MAX });
    Pitch {
        letter: NoteName::from_index(degree.rem_euclid(7) as i32),
        accidental: pitch.accidental,
        octave,
    }
}

/// Snap a pitch into `MIN_PITCH..=MAX_PITCH`.
pub fn clamp(pitch: Pitch) -> Pitch {
    let degree = diatonic_degree(pitch);
    if degree < diatonic_degree(MIN_PITCH) {
        MIN_PITCH
    } else if degree > diatonic_degree(MAX_PITCH) {
        MAX_PITCH
    } else {
        pitch
    }
}

/// Step then clamp; what keyboard nudging uses.
pub fn step_clamped(pitch: Pitch, steps: i32) -> Pitch {
    clamp(step_by_diatonic_degree(pitch, steps))
}

/// Token-level stepping. Tokens that do not parse come back unchanged.
pub fn step_pitch_token(token: &str, steps: i32) -> String {
    match parse_pitch(token) {
        Some(p) if steps != 0 => step_by_diatonic_degree(p, steps).to_string(),
        _ => token.to_string(),
    }
}

/// Token-level clamping. Tokens that do not parse come back unchanged.
pub fn clamp_pitch_token(token: &str) -> String {
    match parse_pitch(token) {
        Some(p) => {
            let clamped = clamp(p);
            if clamped == p {
                token.to_string()
            } else {
                clamped.to_string()
            }
        }
        None => token.to_string(),
    }
}

impl Pitch {
    /// MIDI note number with C4 = 60, clamped to 0..=127.
    pub fn midi_number(&self) -> u8 {
        let midi = (i64::from(self.octave) + 1) * 12
            + i64::from(self.letter.semitone())
            + i64::from(self.accidental.semitone_offset());
        midi.clamp(0, 127) as u8
    }
}
