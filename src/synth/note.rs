/// Note-name grammar: a pitch class `A`..`G` with an optional `#`, followed by
/// a signed octave number, anywhere inside the string. `"C4"`, `"G#3"` and
/// `"pad_A#2"` all parse; the first match wins.
///
/// The result is a pitch offset in cents relative to A4. Pitch classes map to
/// `C=-900 .. B=200` within the reference octave and each octave step away
/// from 4 adds ±1200.
pub fn parse_note(name: &str) -> Option<i32> {
    let bytes = name.as_bytes();
    for start in 0..bytes.len() {
        if let Some(cents) = match_at(bytes, start) {
            return Some(cents);
        }
    }
    None
}

fn match_at(bytes: &[u8], start: usize) -> Option<i32> {
    let class = bytes[start];
    if !(b'A'..=b'G').contains(&class) {
        return None;
    }
    let mut i = start + 1;
    let sharp = bytes.get(i) == Some(&b'#');
    if sharp {
        i += 1;
    }

    let negative = bytes.get(i) == Some(&b'-');
    if negative {
        i += 1;
    }
    let digits_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if i == digits_start {
        return None;
    }

    let mut octave: i32 = 0;
    for d in &bytes[digits_start..i] {
        octave = octave.saturating_mul(10).saturating_add((d - b'0') as i32);
    }
    if negative {
        octave = -octave;
    }

    let class_cents = match (class, sharp) {
        (b'C', false) => -900,
        (b'C', true) => -800,
        (b'D', false) => -700,
        (b'D', true) => -600,
        (b'E', false) => -500,
        (b'F', false) => -400,
        (b'F', true) => -300,
        (b'G', false) => -200,
        (b'G', true) => -100,
        (b'A', false) => 0,
        (b'A', true) => 100,
        (b'B', false) => 200,
        // E# and B# are not in the grammar
        _ => return None,
    };
    Some(class_cents + (octave - 4) * 1200)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_octave() {
        assert_eq!(parse_note("A4"), Some(0));
        assert_eq!(parse_note("C4"), Some(-900));
        assert_eq!(parse_note("B4"), Some(200));
        assert_eq!(parse_note("G#4"), Some(-100));
    }

    #[test]
    fn octaves_shift_by_1200() {
        assert_eq!(parse_note("A5"), Some(1200));
        assert_eq!(parse_note("A3"), Some(-1200));
        assert_eq!(parse_note("C-1"), Some(-900 - 5 * 1200));
    }

    #[test]
    fn first_match_inside_a_longer_name() {
        assert_eq!(parse_note("pad_A#2"), Some(100 - 2 * 1200));
        // 'B' cannot take a sharp, so the match restarts at the digit-bearing A
        assert_eq!(parse_note("BxA4"), Some(0));
    }

    #[test]
    fn rejects_names_without_a_note() {
        assert_eq!(parse_note("kick"), None);
        assert_eq!(parse_note("H4"), None);
        assert_eq!(parse_note("C"), None);
        assert_eq!(parse_note("C#"), None);
        assert_eq!(parse_note(""), None);
    }
}
