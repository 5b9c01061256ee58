use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static SEASON_DIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}$").expect("valid season folder regex"));

/// A `YYYY-YY` season label. Only the start year is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Season {
    label: String,
    start_year: Option<i32>,
}

impl Season {
    pub fn new(label: &str) -> Self {
        let start_year = label
            .split('-')
            .next()
            .and_then(|year| year.trim().parse::<i32>().ok());
        Self {
            label: label.to_string(),
            start_year,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Calendar year of `month` within the season: January to June fall in the later year.
    pub fn year_for_month(&self, month: u32) -> Option<i32> {
        let start = self.start_year?;
        if month < 7 { start.checked_add(1) } else { Some(start) }
    }
}

/// Season of a file stored as `<root>/<YYYY-YY>/<file>`.
pub fn season_from_path(path: &Path) -> Option<String> {
    let folder = path.parent()?.file_name()?.to_str()?;
    SEASON_DIR_RE
        .is_match(folder)
        .then(|| folder.to_string())
}

/// `min_season` compares lexically, which orders `YYYY-YY` labels chronologically.
pub fn season_in_range(season: &str, min_season: Option<&str>) -> bool {
    min_season.is_none_or(|min| season >= min)
}
