use std::error::Error;
use std::sync::LazyLock;

use duckdb::{
    Result,
    core::DataChunkHandle,
    vscalar::{ScalarFunctionSignature, VScalar},
    vtab::arrow::WritableVector,
};
use regex::Regex;
use serde_json::{Value, json};

use super::duckdb_impl::scalar::{
    VarcharOutput, invoke_unary_varchar_to_varchar, varchar_to_varchar_signature,
};
use super::score::{SCORE_PAIR_RE, parse_score_blob, score_set_json, to_json_output};
use super::types::WorldCupMatch;

/// `(12) Sat Jun/14 13:00 ` at the start of a match line.
static PREAMBLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\((?P<no>[0-9]+)\)\s+(?P<dow>[A-Za-z]{3})\s+(?P<md>[A-Za-z]{3}/[0-9]{1,2})\s+(?P<time>[0-9]{1,2}:[0-9]{2})\s+",
    )
    .expect("valid match preamble regex")
});

static MULTI_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid multi-space regex"));

const VENUE_SEPARATOR: &str = " @ ";

pub(crate) fn collapse_spaces(s: &str) -> String {
    MULTI_SPACE_RE.replace_all(s, " ").into_owned()
}

/// Splits `score blob<2+ spaces>away team` into its two parts.
fn split_score_and_away(tail: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = MULTI_SPACE_RE.split(tail).collect();
    if let Some((away, blob_parts)) = parts.split_last()
        && !blob_parts.is_empty()
    {
        return Some((blob_parts.join(" ").trim().to_string(), away.trim().to_string()));
    }

    // Single-spaced line: the blob ends with the last score pair.
    let last = SCORE_PAIR_RE.find_iter(tail).last()?;
    Some((
        tail[..last.end()].trim().to_string(),
        tail[last.end()..].trim().to_string(),
    ))
}

/// Tokenize one single-line match record:
///
/// ```text
/// (1) Thu Jun/12 17:00   Brazil  3-1 (1-1)  Croatia   @ Arena de São Paulo, São Paulo
/// ```
///
/// Returns `None` when the line does not have the preamble, the ` @ ` venue
/// separator, a score pair, or both team names.
pub fn parse_match_line(line: &str) -> Option<WorldCupMatch> {
    let caps = PREAMBLE_RE.captures(line)?;
    let preamble_end = caps.get(0)?.end();
    let match_no = caps["no"].parse::<u32>().ok()?;
    let rest = line[preamble_end..].trim_end();

    let at_idx = rest.rfind(VENUE_SEPARATOR)?;
    let before_at = rest[..at_idx].trim_end();
    let venue = rest[at_idx + VENUE_SEPARATOR.len()..].trim();

    let first_score = SCORE_PAIR_RE.find(before_at)?;
    let home = collapse_spaces(before_at[..first_score.start()].trim());
    let (score_blob, away) = split_score_and_away(before_at[first_score.start()..].trim())?;
    let away = collapse_spaces(&away);
    if home.is_empty() || away.is_empty() {
        return None;
    }

    let (stadium, city) = match venue.split_once(',') {
        Some((stadium, city)) => (stadium.trim().to_string(), Some(city.trim().to_string())),
        None => (venue.to_string(), None),
    };

    let score = parse_score_blob(&score_blob);

    Some(WorldCupMatch {
        match_no,
        day_of_week: caps["dow"].to_string(),
        month_day: caps["md"].to_string(),
        time_local: caps["time"].to_string(),
        home,
        away,
        stadium,
        city,
        score_blob,
        score,
        section: None,
        stage: None,
    })
}

pub(crate) fn match_json(m: &WorldCupMatch) -> Value {
    json!({
        "match_no": m.match_no,
        "dow": m.day_of_week,
        "month_day": m.month_day,
        "time_local": m.time_local,
        "home": m.home,
        "away": m.away,
        "stadium": m.stadium,
        "city": m.city,
        "score_blob": m.score_blob,
        "score": score_set_json(&m.score),
    })
}

pub struct FootballMatchJsonScalar;

impl VScalar for FootballMatchJsonScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |line| {
            Ok(match parse_match_line(line.trim()) {
                Some(m) => to_json_output(&match_json(&m)),
                None => VarcharOutput::Null,
            })
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        varchar_to_varchar_signature()
    }
}
