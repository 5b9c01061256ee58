use super::{
    ChunkWriter, ColumnDef, ColumnLogicalType, InputFile, ScanBindData, ScanInitData,
    TableSource, add_result_columns, bind_paths, fill_chunk, named_varchar, path_parameters,
    resolve_compression_mode, to_duckdb_date, varchar_named_parameters,
};
use crate::football::error::ErrorAccumulator;
use crate::football::log;
use crate::football::season::{season_from_path, season_in_range};
use crate::football::stateful::parse_stateful_document_tagged;
use crate::football::types::{ChampionsLeagueMatch, Stage};
use duckdb::{
    core::{DataChunkHandle, LogicalTypeHandle},
    vtab::{BindInfo, InitInfo, TableFunctionInfo, VTab},
};
use std::error::Error;
use std::path::PathBuf;

pub struct ReadChampionsLeagueVTab;

const CHAMPIONS_COLUMN_COUNT: usize = 15;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ChampionsColumn {
    Season = 0,
    Date = 1,
    Time = 2,
    Stage = 3,
    Section = 4,
    HomeTeam = 5,
    AwayTeam = 6,
    HomeGoals = 7,
    AwayGoals = 8,
    HtHome = 9,
    HtAway = 10,
    HasPenalty = 11,
    HasAet = 12,
    SourceFile = 13,
    ParseError = 14,
}

impl ChampionsColumn {
    const fn index(self) -> usize {
        self as usize
    }
}

const fn column(name: &'static str, logical_type: ColumnLogicalType) -> ColumnDef {
    ColumnDef { name, logical_type }
}

const CHAMPIONS_COLUMNS: [ColumnDef; CHAMPIONS_COLUMN_COUNT] = [
    column("season", ColumnLogicalType::Varchar),
    column("date", ColumnLogicalType::Date),
    column("time", ColumnLogicalType::Varchar),
    column("stage", ColumnLogicalType::Varchar),
    column("section", ColumnLogicalType::Varchar),
    column("home_team", ColumnLogicalType::Varchar),
    column("away_team", ColumnLogicalType::Varchar),
    column("home_goals", ColumnLogicalType::UInteger),
    column("away_goals", ColumnLogicalType::UInteger),
    column("ht_home", ColumnLogicalType::UInteger),
    column("ht_away", ColumnLogicalType::UInteger),
    column("has_penalty", ColumnLogicalType::Boolean),
    column("has_aet", ColumnLogicalType::Boolean),
    column("source_file", ColumnLogicalType::Varchar),
    column("parse_error", ColumnLogicalType::Varchar),
];

/// Attach a season to every path. An explicit `season` applies to all paths;
/// otherwise the season folder name is used and other paths are skipped.
fn resolve_season_inputs(
    paths: Vec<PathBuf>,
    season: Option<&str>,
    min_season: Option<&str>,
) -> Result<Vec<InputFile>, Box<dyn Error>> {
    let single = paths.len() == 1;
    let mut inputs = Vec::with_capacity(paths.len());

    for path in paths {
        let Some(file_season) = season
            .map(str::to_string)
            .or_else(|| season_from_path(&path))
        else {
            let msg = format!(
                "Cannot infer season for '{}'; expected a YYYY-YY parent folder or season := 'YYYY-YY'",
                path.display()
            );
            if single {
                return Err(msg.into());
            }
            log::warn(&msg);
            continue;
        };

        if !season_in_range(&file_season, min_season) {
            continue;
        }

        inputs.push(InputFile {
            path,
            season: Some(file_season),
        });
    }

    Ok(inputs)
}

struct ChampionsLeagueTable;

impl TableSource for ChampionsLeagueTable {
    type Options = ();
    type Row = ChampionsLeagueMatch;

    const COLUMNS: &'static [ColumnDef] = &CHAMPIONS_COLUMNS;
    const PARSE_ERROR_COLUMN: usize = ChampionsColumn::ParseError.index();

    fn parse_input(input: &InputFile, text: &str, _options: &()) -> Vec<ChampionsLeagueMatch> {
        let season = input.season.as_deref().unwrap_or_default();
        parse_stateful_document_tagged(text.lines(), season, &input.file_name())
    }

    fn write_row(
        writer: &mut ChunkWriter<'_>,
        m: &ChampionsLeagueMatch,
        _input: &InputFile,
        parse_error: &mut ErrorAccumulator,
    ) -> Result<(), Box<dyn Error>> {
        use ChampionsColumn as C;

        let date = to_duckdb_date(m.date);
        if date.is_none() {
            parse_error.push(format!("Date out of range: {}", m.date));
        }

        writer.write_varchar(C::Season.index(), Some(m.season.as_str()), parse_error)?;
        writer.write_date(C::Date.index(), date);
        writer.write_varchar(C::Time.index(), m.time.as_deref(), parse_error)?;
        writer.write_varchar(C::Stage.index(), m.stage.map(Stage::as_str), parse_error)?;
        writer.write_varchar(C::Section.index(), m.section.as_deref(), parse_error)?;
        writer.write_varchar(C::HomeTeam.index(), Some(m.home_team.as_str()), parse_error)?;
        writer.write_varchar(C::AwayTeam.index(), Some(m.away_team.as_str()), parse_error)?;
        writer.write_uinteger(C::HomeGoals.index(), Some(m.home_goals));
        writer.write_uinteger(C::AwayGoals.index(), Some(m.away_goals));
        writer.write_uinteger(C::HtHome.index(), m.half_time_home);
        writer.write_uinteger(C::HtAway.index(), m.half_time_away);
        writer.write_bool(C::HasPenalty.index(), m.has_penalty);
        writer.write_bool(C::HasAet.index(), m.has_extra_time);
        writer.write_varchar(C::SourceFile.index(), Some(m.source_tag.as_str()), parse_error)?;
        Ok(())
    }
}

impl VTab for ReadChampionsLeagueVTab {
    type InitData = ScanInitData<ChampionsLeagueMatch>;
    type BindData = ScanBindData<()>;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let season = named_varchar(bind, "season")?;
        let min_season = named_varchar(bind, "min_season")?;
        let inputs =
            resolve_season_inputs(bind_paths(bind)?, season.as_deref(), min_season.as_deref())?;
        let compression = resolve_compression_mode(bind)?;

        add_result_columns(bind, ChampionsLeagueTable::COLUMNS);

        Ok(ScanBindData::new(inputs, compression, ()))
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        Ok(ScanInitData::default())
    }

    fn func(
        func: &TableFunctionInfo<Self>,
        output: &mut DataChunkHandle,
    ) -> Result<(), Box<dyn Error>> {
        fill_chunk::<ChampionsLeagueTable>(func.get_init_data(), func.get_bind_data(), output)
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        path_parameters()
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        varchar_named_parameters(&["season", "min_season", "compression"])
    }
}
