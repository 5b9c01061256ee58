use chrono::NaiveDate;

/// Goals for the home and away side, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    pub const fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }
}

/// Decoded score blob. Fields not produced by the chosen interpretation stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreSet {
    /// Normal-time score, or the extra-time score when only that is known.
    pub regulation: Option<Score>,
    pub extra_time: Option<Score>,
    pub penalties: Option<Score>,
    /// Verbatim text of the first parenthesis group, e.g. `1-0` or `2-2, 2-0`.
    pub half_time_raw: Option<String>,
}

/// How a single-line document is sectioned: by group headers or by knockout round names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionKind {
    #[default]
    Group,
    Knockout,
}

impl SectionKind {
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim();
        if normalized.eq_ignore_ascii_case("group") {
            Some(Self::Group)
        } else if normalized.eq_ignore_ascii_case("knockout") {
            Some(Self::Knockout)
        } else {
            None
        }
    }

    /// Stage tag attached to every record emitted in this mode.
    pub fn stage_label(self) -> &'static str {
        match self {
            Self::Group => "Group",
            Self::Knockout => "Knockout",
        }
    }
}

/// Normalized competition phase of a multi-line document section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    GroupStage,
    RoundOf16,
    Quarterfinals,
    Semifinals,
    Final,
    Other,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GroupStage => "Group Stage",
            Self::RoundOf16 => "Round of 16",
            Self::Quarterfinals => "Quarterfinals",
            Self::Semifinals => "Semifinals",
            Self::Final => "Final",
            Self::Other => "Other",
        }
    }
}

/// One fixture of the single-line ("World Cup style") format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldCupMatch {
    pub match_no: u32,
    pub day_of_week: String,
    /// `Mon/day`, e.g. `Jun/14`.
    pub month_day: String,
    pub time_local: String,
    pub home: String,
    pub away: String,
    pub stadium: String,
    pub city: Option<String>,
    pub score_blob: String,
    pub score: ScoreSet,
    /// Group or round label; only set by a sectioned scan.
    pub section: Option<String>,
    /// Only set by a sectioned scan.
    pub stage: Option<SectionKind>,
}

/// One fixture of the multi-line ("Champions League style") format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChampionsLeagueMatch {
    pub season: String,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub stage: Option<Stage>,
    pub section: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
    pub half_time_home: Option<u32>,
    pub half_time_away: Option<u32>,
    pub has_penalty: bool,
    pub has_extra_time: bool,
    pub source_tag: String,
}
