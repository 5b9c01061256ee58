use std::error::Error;
use std::sync::LazyLock;

use chrono::NaiveDate;
use duckdb::{
    Result,
    core::DataChunkHandle,
    vscalar::{ScalarFunctionSignature, VScalar},
    vtab::arrow::WritableVector,
};
use regex::Regex;

use super::duckdb_impl::scalar::{
    VarcharOutput, invoke_unary_varchar_to_varchar, varchar_to_varchar_signature,
};
use super::score::{EXTRA_TIME_MARKER_RE, PENALTY_MARKER_RE};
use super::season::Season;
use super::types::{ChampionsLeagueMatch, Stage};

const SECTION_MARKER: char = '»';
const COMMENT_MARKERS: [char; 2] = ['=', '#'];

/// `  Wed Sep/14 2011` or `  Tue Sep/27`.
static DATE_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+(\w+)\s+(\w+)/([0-9]{1,2})(?:\s+([0-9]{4}))?")
        .expect("valid date header regex")
});

/// `    20.45  Home (ENG)   v Away (ESP)         1-1 (0-0)  pen.`
static MATCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s+(?:([0-9]{1,2}\.[0-9]{2})\s+)?(.+?)\s+v\s+(.+?)\s+([0-9]+)-([0-9]+)(?:\s+\(([0-9]+)-([0-9]+)\))?(?:\s+(.+))?$",
    )
    .expect("valid match line regex")
});

static COUNTRY_CODE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]+\)\s*$").expect("valid country code regex"));

fn month_number(abbrev: &str) -> Option<u32> {
    let month = match abbrev {
        "Jan" => 1,
        "Feb" => 2,
        "Mar" => 3,
        "Apr" => 4,
        "May" => 5,
        "Jun" => 6,
        "Jul" => 7,
        "Aug" => 8,
        "Sep" => 9,
        "Oct" => 10,
        "Nov" => 11,
        "Dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Normalize a section header to a stage; the first matching keyword wins.
pub fn classify_stage(section: &str) -> Stage {
    if section.contains("Group") {
        Stage::GroupStage
    } else if section.contains("Round of") {
        Stage::RoundOf16
    } else if section.contains("Quarter") {
        Stage::Quarterfinals
    } else if section.contains("Semi") {
        Stage::Semifinals
    } else if section.contains("Final") {
        Stage::Final
    } else {
        Stage::Other
    }
}

/// Context carried across the lines of one document. Only header lines mutate it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseState {
    pub current_date: Option<NaiveDate>,
    pub current_stage: Option<Stage>,
    pub current_section: Option<String>,
}

enum LineKind {
    Skip,
    Section(String),
    /// A date header; `None` when its month or day is unusable.
    Date(Option<NaiveDate>),
    Match(MatchLine),
}

struct MatchLine {
    time: Option<String>,
    home_team: String,
    away_team: String,
    home_goals: u32,
    away_goals: u32,
    half_time: Option<(u32, u32)>,
    has_penalty: bool,
    has_extra_time: bool,
}

fn strip_country_code(team: &str) -> String {
    COUNTRY_CODE_SUFFIX_RE.replace(team, "").trim().to_string()
}

fn parse_date_header(caps: &regex::Captures<'_>, season: &Season) -> Option<NaiveDate> {
    let month = month_number(&caps[2])?;
    let day = caps[3].parse::<u32>().ok()?;
    let year = match caps.get(4) {
        Some(year) => year.as_str().parse::<i32>().ok()?,
        None => season.year_for_month(month)?,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_match(caps: &regex::Captures<'_>) -> Option<MatchLine> {
    let half_time = match (caps.get(6), caps.get(7)) {
        (Some(home), Some(away)) => Some((
            home.as_str().parse::<u32>().ok()?,
            away.as_str().parse::<u32>().ok()?,
        )),
        _ => None,
    };
    let extra = caps.get(8).map(|m| m.as_str()).unwrap_or_default();

    Some(MatchLine {
        time: caps.get(1).map(|m| m.as_str().to_string()),
        home_team: strip_country_code(&caps[2]),
        away_team: strip_country_code(&caps[3]),
        home_goals: caps[4].parse::<u32>().ok()?,
        away_goals: caps[5].parse::<u32>().ok()?,
        half_time,
        has_penalty: PENALTY_MARKER_RE.is_match(extra),
        has_extra_time: EXTRA_TIME_MARKER_RE.is_match(extra),
    })
}

fn classify_line(line: &str, season: &Season) -> LineKind {
    if line.is_empty() || line.starts_with(COMMENT_MARKERS) {
        return LineKind::Skip;
    }

    if line.starts_with(SECTION_MARKER) {
        return LineKind::Section(line.replace(SECTION_MARKER, "").trim().to_string());
    }

    if let Some(caps) = DATE_HEADER_RE.captures(line) {
        return LineKind::Date(parse_date_header(&caps, season));
    }

    match MATCH_RE.captures(line).and_then(|caps| parse_match(&caps)) {
        Some(m) => LineKind::Match(m),
        None => LineKind::Skip,
    }
}

/// Scan a multi-line format document for one season.
///
/// Section headers (`» Group A`) and date headers (`  Wed Sep/14`) update the
/// scan state; match lines take the most recent date and section. Match lines
/// seen before any usable date header are dropped.
pub fn parse_stateful_document<I, S>(lines: I, season: &str) -> Vec<ChampionsLeagueMatch>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parse_stateful_document_tagged(lines, season, "")
}

/// Like [`parse_stateful_document`], stamping every record with `source_tag`.
pub fn parse_stateful_document_tagged<I, S>(
    lines: I,
    season: &str,
    source_tag: &str,
) -> Vec<ChampionsLeagueMatch>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let season = Season::new(season);
    let mut state = ParseState::default();
    let mut out = Vec::new();

    for raw in lines {
        match classify_line(raw.as_ref().trim_end(), &season) {
            LineKind::Skip => {}
            LineKind::Section(section) => {
                state.current_stage = Some(classify_stage(&section));
                state.current_section = Some(section);
            }
            LineKind::Date(date) => {
                if date.is_some() {
                    state.current_date = date;
                }
            }
            LineKind::Match(m) => {
                let Some(date) = state.current_date else {
                    continue;
                };
                let (half_time_home, half_time_away) = match m.half_time {
                    Some((home, away)) => (Some(home), Some(away)),
                    None => (None, None),
                };
                out.push(ChampionsLeagueMatch {
                    season: season.label().to_string(),
                    date,
                    time: m.time,
                    stage: state.current_stage,
                    section: state.current_section.clone(),
                    home_team: m.home_team,
                    away_team: m.away_team,
                    home_goals: m.home_goals,
                    away_goals: m.away_goals,
                    half_time_home,
                    half_time_away,
                    has_penalty: m.has_penalty,
                    has_extra_time: m.has_extra_time,
                    source_tag: source_tag.to_string(),
                });
            }
        }
    }

    out
}

pub struct FootballStageScalar;

impl VScalar for FootballStageScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |header| {
            let section = header.replace(SECTION_MARKER, "");
            Ok(VarcharOutput::Value(
                classify_stage(section.trim()).as_str().to_string(),
            ))
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        varchar_to_varchar_signature()
    }
}
