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
use smallvec::SmallVec;

use super::duckdb_impl::scalar::{
    VarcharOutput, invoke_unary_varchar_to_varchar, varchar_to_varchar_signature,
};
use super::log;
use super::types::{Score, ScoreSet};

/// `home-away`, spaces allowed around the hyphen.
pub(crate) static SCORE_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+)\s*-\s*([0-9]+)").expect("valid score pair regex")
});

static PAREN_GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)").expect("valid parenthesis group regex"));

pub(crate) static PENALTY_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpen\.?\b").expect("valid penalty marker regex"));

pub(crate) static EXTRA_TIME_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\ba\.?e\.?t\.?\b").expect("valid extra-time marker regex")
});

type ScorePairs = SmallVec<[Score; 4]>;

/// Every `int-int` pair in `text`, left to right. Pairs that overflow `u32` are skipped.
pub(crate) fn score_pairs(text: &str) -> ScorePairs {
    SCORE_PAIR_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let home = caps[1].parse::<u32>().ok()?;
            let away = caps[2].parse::<u32>().ok()?;
            Some(Score::new(home, away))
        })
        .collect()
}

/// Decode a score blob such as `2-1 (1-0)` or `4-2 pen. 3-3 a.e.t. (2-2, 2-0)`.
///
/// Never fails: text without a recognizable pair yields a `ScoreSet` with every
/// score unset.
pub fn parse_score_blob(blob: &str) -> ScoreSet {
    let mut out = ScoreSet::default();
    let mut working = blob.trim().to_string();

    // Only the first group is kept, but no parenthesized pair may be read as a score.
    if let Some(group) = PAREN_GROUP_RE.captures(&working) {
        out.half_time_raw = Some(group[1].trim().to_string());
        working = PAREN_GROUP_RE.replace_all(&working, " ").trim().to_string();
    }

    let has_pen = PENALTY_MARKER_RE.is_match(&working);
    let has_aet = EXTRA_TIME_MARKER_RE.is_match(&working);
    let pairs = score_pairs(&working);

    // Shootout results list the penalty score first, then the a.e.t. score.
    if has_pen && pairs.len() >= 2 {
        out.penalties = Some(pairs[0]);
        out.extra_time = Some(pairs[1]);
    } else if has_aet && !pairs.is_empty() {
        out.extra_time = Some(pairs[0]);
    } else if let Some(first) = pairs.first() {
        out.regulation = Some(*first);
    }

    if out.regulation.is_none() {
        out.regulation = out.extra_time;
    }

    out
}

fn score_json(score: Option<Score>) -> Value {
    match score {
        Some(s) => json!([s.home, s.away]),
        None => Value::Null,
    }
}

pub(crate) fn score_set_json(score: &ScoreSet) -> Value {
    json!({
        "regulation": score_json(score.regulation),
        "extra_time": score_json(score.extra_time),
        "penalties": score_json(score.penalties),
        "half_time_raw": score.half_time_raw,
    })
}

pub(crate) fn to_json_output(value: &Value) -> VarcharOutput {
    match serde_json::to_string(value) {
        Ok(json) => VarcharOutput::Value(json),
        Err(e) => {
            log::error(format!("Failed to serialize JSON output: {e}"));
            VarcharOutput::Null
        }
    }
}

pub struct FootballScoreJsonScalar;

impl VScalar for FootballScoreJsonScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |blob| {
            Ok(to_json_output(&score_set_json(&parse_score_blob(blob))))
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        varchar_to_varchar_signature()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regulation_with_half_time() {
        let score = parse_score_blob("2-1 (1-0)");
        assert_eq!(score.regulation, Some(Score::new(2, 1)));
        assert_eq!(score.extra_time, None);
        assert_eq!(score.penalties, None);
        assert_eq!(score.half_time_raw.as_deref(), Some("1-0"));
    }

    #[test]
    fn test_penalties_then_extra_time_with_backfill() {
        let score = parse_score_blob("4-2 pen. 3-3 a.e.t. (2-2, 2-0)");
        assert_eq!(score.penalties, Some(Score::new(4, 2)));
        assert_eq!(score.extra_time, Some(Score::new(3, 3)));
        assert_eq!(score.regulation, Some(Score::new(3, 3)));
        assert_eq!(score.half_time_raw.as_deref(), Some("2-2, 2-0"));
    }

    #[test]
    fn test_extra_time_without_parentheses() {
        let score = parse_score_blob("0-0 a.e.t.");
        assert_eq!(score.extra_time, Some(Score::new(0, 0)));
        assert_eq!(score.regulation, Some(Score::new(0, 0)));
        assert_eq!(score.penalties, None);
        assert_eq!(score.half_time_raw, None);
    }

    #[test]
    fn test_marker_variants() {
        let score = parse_score_blob("1-3 pen. 1-1 a.e.t (1-1, 1-0)");
        assert_eq!(score.penalties, Some(Score::new(1, 3)));
        assert_eq!(score.extra_time, Some(Score::new(1, 1)));

        let score = parse_score_blob("2-1 AET");
        assert_eq!(score.extra_time, Some(Score::new(2, 1)));
        assert_eq!(score.regulation, Some(Score::new(2, 1)));

        let score = parse_score_blob("5-4 PEN 0-0 aet");
        assert_eq!(score.penalties, Some(Score::new(5, 4)));
        assert_eq!(score.extra_time, Some(Score::new(0, 0)));
    }

    #[test]
    fn test_pen_marker_without_aet_reads_two_pairs() {
        let score = parse_score_blob("3-0 pen. 0-0 (0-0, 0-0)");
        assert_eq!(score.penalties, Some(Score::new(3, 0)));
        assert_eq!(score.extra_time, Some(Score::new(0, 0)));
        assert_eq!(score.regulation, Some(Score::new(0, 0)));
    }

    #[test]
    fn test_pen_with_single_pair_falls_through_to_aet() {
        let score = parse_score_blob("4-3 pen. a.e.t.");
        assert_eq!(score.penalties, None);
        assert_eq!(score.extra_time, Some(Score::new(4, 3)));
        assert_eq!(score.regulation, Some(Score::new(4, 3)));
    }

    #[test]
    fn test_pen_with_single_pair_falls_through_to_regulation() {
        let score = parse_score_blob("1-1 pen.");
        assert_eq!(score.penalties, None);
        assert_eq!(score.extra_time, None);
        assert_eq!(score.regulation, Some(Score::new(1, 1)));
    }

    #[test]
    fn test_pair_inside_parentheses_is_not_a_score() {
        let score = parse_score_blob("(1-0)");
        assert_eq!(score.regulation, None);
        assert_eq!(score.half_time_raw.as_deref(), Some("1-0"));
    }

    #[test]
    fn test_every_parenthesis_group_is_excluded_from_scores() {
        let score = parse_score_blob("2-1 pen. (1-0) (3-3)");
        assert_eq!(score.regulation, Some(Score::new(2, 1)));
        assert_eq!(score.penalties, None);
        assert_eq!(score.extra_time, None);
        assert_eq!(score.half_time_raw.as_deref(), Some("1-0"));

        let score = parse_score_blob("1-1 a.e.t. (0-0) 4-3 (2-2)");
        assert_eq!(score.extra_time, Some(Score::new(1, 1)));
        assert_eq!(score.half_time_raw.as_deref(), Some("0-0"));
    }

    #[test]
    fn test_no_pairs_leaves_everything_unset() {
        assert_eq!(parse_score_blob(""), ScoreSet::default());
        assert_eq!(parse_score_blob("   "), ScoreSet::default());
        assert_eq!(parse_score_blob("postponed"), ScoreSet::default());
        assert_eq!(parse_score_blob("pen. a.e.t."), ScoreSet::default());
    }

    #[test]
    fn test_spaced_hyphen_and_surrounding_whitespace() {
        let score = parse_score_blob("  3 - 2   ( 1 - 1 ) ");
        assert_eq!(score.regulation, Some(Score::new(3, 2)));
        assert_eq!(score.half_time_raw.as_deref(), Some("1 - 1"));
    }

    #[test]
    fn test_overflowing_pair_is_skipped() {
        let score = parse_score_blob("99999999999-1 2-0");
        assert_eq!(score.regulation, Some(Score::new(2, 0)));
    }

    #[test]
    fn test_marker_inside_word_is_ignored() {
        let score = parse_score_blob("1-0 2-2 penalty");
        assert_eq!(score.penalties, None);
        assert_eq!(score.regulation, Some(Score::new(1, 0)));
    }

    #[test]
    fn test_score_set_json_shape() {
        let json = score_set_json(&parse_score_blob("4-2 pen. 3-3 a.e.t. (2-2, 2-0)"));
        assert_eq!(json["penalties"], json!([4, 2]));
        assert_eq!(json["extra_time"], json!([3, 3]));
        assert_eq!(json["regulation"], json!([3, 3]));
        assert_eq!(json["half_time_raw"], json!("2-2, 2-0"));

        let json = score_set_json(&parse_score_blob("n/a"));
        assert!(json["regulation"].is_null());
        assert!(json["half_time_raw"].is_null());
    }
}
