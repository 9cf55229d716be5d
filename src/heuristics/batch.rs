use super::{ArrivalDate, RefinedBatch};
use regex::Regex;
use std::sync::LazyLock;
use time::{Date, Month};
use tracing::debug;

/// Shortest raw string that can still hold the `YYMDD` date token.
pub const MIN_BATCH_CHARS: usize = 5;

/// Anything that is not an upper-case ASCII letter or digit separates segments.
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Z0-9]+").expect("separator pattern is valid"));

/// Correction for digit-biased (date) segments: letters misread for digits.
pub fn date_char(c: char) -> char {
    match c {
        'O' => '0',
        'I' | 'L' | 'J' => '1',
        'S' => '5',
        other => other,
    }
}

/// Correction for letter-biased (identifier) segments: digits misread for letters.
pub fn text_char(c: char) -> char {
    match c {
        '0' => 'O',
        '1' => 'I',
        '5' => 'S',
        '8' => 'B',
        other => other,
    }
}

fn correct(segment: &str, map: fn(char) -> char) -> String {
    segment.chars().map(map).collect()
}

/// Normalize a raw batch code, decode its arrival date and re-render it as
/// `P1/P2/P3/P4[/EXTRA...]`.
///
/// Never fails: inputs that are too short come back untouched with
/// [`ArrivalDate::NotAttempted`], and a date that cannot be decoded is
/// reported as [`ArrivalDate::Undecodable`].
pub fn refine(raw: &str) -> RefinedBatch {
    if raw.chars().count() < MIN_BATCH_CHARS {
        return RefinedBatch {
            canonical: raw.to_string(),
            arrival: ArrivalDate::NotAttempted,
        };
    }

    let text = raw.to_uppercase().trim().to_string();

    // P1 always comes from the first five characters, however they tokenize.
    let p1: String = text.chars().take(MIN_BATCH_CHARS).map(date_char).collect();
    let arrival = decode_arrival(&p1);

    let tokens: Vec<&str> = SEPARATORS
        .split(&text)
        .filter(|t| !t.is_empty())
        .collect();

    let canonical = match tokens.as_slice() {
        [_, p2, p3, p4, extra @ ..] => {
            let mut out = format!(
                "{p1}/{}/{}/{}",
                correct(p2, text_char),
                correct(p3, date_char),
                correct(p4, text_char)
            );
            for token in extra {
                out.push('/');
                out.push_str(token);
            }
            out
        }
        _ => text.clone(),
    };

    debug!(raw = %raw, canonical = %canonical, arrival = %arrival, tokens = tokens.len(), "Batch refined");

    RefinedBatch { canonical, arrival }
}

/// Decode `YYMDD` where the month is `1`-`9` or `A`/`B`/`C` for 10-12.
fn decode_arrival(p1: &str) -> ArrivalDate {
    let chars: Vec<char> = p1.chars().collect();
    let Some(&month_char) = chars.get(2) else {
        return ArrivalDate::Undecodable;
    };

    let month = match month_char {
        'A' => 10,
        'B' => 11,
        'C' => 12,
        c if c.is_ascii_digit() => c as u8 - b'0',
        _ => return ArrivalDate::Undecodable,
    };
    if month > 12 {
        return ArrivalDate::Undecodable;
    }

    let year = format!("20{}", chars[..2].iter().collect::<String>());
    let day: String = chars[3..].iter().collect();

    match calendar_date(&day, month, &year) {
        Some(date) => ArrivalDate::Decoded(date),
        None => ArrivalDate::Undecodable,
    }
}

/// `day` follows `%d`: one or two digits, or a space-padded single digit.
fn calendar_date(day: &str, month: u8, year: &str) -> Option<Date> {
    let day = match day.strip_prefix(' ') {
        Some(digit) if digit.len() == 1 => digit,
        _ => day,
    };
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !(1..=2).contains(&day.len()) || !all_digits(day) || year.len() != 4 || !all_digits(year) {
        return None;
    }
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year.parse().ok()?, month, day.parse().ok()?).ok()
}
