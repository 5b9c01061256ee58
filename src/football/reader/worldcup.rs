use super::{
    ChunkWriter, ColumnDef, ColumnLogicalType, InputFile, ScanBindData, ScanInitData,
    TableSource, add_result_columns, bind_paths, fill_chunk, named_varchar, path_parameters,
    resolve_compression_mode, varchar_named_parameters,
};
use crate::football::error::ErrorAccumulator;
use crate::football::sectioned::parse_sectioned_lines;
use crate::football::types::{SectionKind, WorldCupMatch};
use duckdb::{
    core::{DataChunkHandle, LogicalTypeHandle},
    vtab::{BindInfo, InitInfo, TableFunctionInfo, VTab},
};
use std::error::Error;

pub struct ReadWorldCupVTab;

const WORLDCUP_COLUMN_COUNT: usize = 20;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum WorldCupColumn {
    MatchNo = 0,
    Dow = 1,
    MonthDay = 2,
    TimeLocal = 3,
    Home = 4,
    Away = 5,
    Stadium = 6,
    City = 7,
    ScoreBlob = 8,
    FtHome = 9,
    FtAway = 10,
    AetHome = 11,
    AetAway = 12,
    PenHome = 13,
    PenAway = 14,
    HtRaw = 15,
    Section = 16,
    Stage = 17,
    Source = 18,
    ParseError = 19,
}

impl WorldCupColumn {
    const fn index(self) -> usize {
        self as usize
    }
}

const fn column(name: &'static str, logical_type: ColumnLogicalType) -> ColumnDef {
    ColumnDef { name, logical_type }
}

const WORLDCUP_COLUMNS: [ColumnDef; WORLDCUP_COLUMN_COUNT] = [
    column("match_no", ColumnLogicalType::UInteger),
    column("dow", ColumnLogicalType::Varchar),
    column("month_day", ColumnLogicalType::Varchar),
    column("time_local", ColumnLogicalType::Varchar),
    column("home", ColumnLogicalType::Varchar),
    column("away", ColumnLogicalType::Varchar),
    column("stadium", ColumnLogicalType::Varchar),
    column("city", ColumnLogicalType::Varchar),
    column("score_blob", ColumnLogicalType::Varchar),
    column("ft_home", ColumnLogicalType::UInteger),
    column("ft_away", ColumnLogicalType::UInteger),
    column("aet_home", ColumnLogicalType::UInteger),
    column("aet_away", ColumnLogicalType::UInteger),
    column("pen_home", ColumnLogicalType::UInteger),
    column("pen_away", ColumnLogicalType::UInteger),
    column("ht_raw", ColumnLogicalType::Varchar),
    column("section", ColumnLogicalType::Varchar),
    column("stage", ColumnLogicalType::Varchar),
    column("source", ColumnLogicalType::Varchar),
    column("parse_error", ColumnLogicalType::Varchar),
];

fn parse_section_kind(raw: Option<&str>) -> Result<SectionKind, Box<dyn Error>> {
    match raw {
        None => Ok(SectionKind::default()),
        Some(raw) => SectionKind::parse(raw).ok_or_else(|| {
            format!(
                "Invalid section_kind value '{}'. Supported values: 'group' or 'knockout'.",
                raw.trim()
            )
            .into()
        }),
    }
}

struct WorldCupTable;

impl TableSource for WorldCupTable {
    type Options = SectionKind;
    type Row = WorldCupMatch;

    const COLUMNS: &'static [ColumnDef] = &WORLDCUP_COLUMNS;
    const PARSE_ERROR_COLUMN: usize = WorldCupColumn::ParseError.index();

    fn parse_input(_input: &InputFile, text: &str, kind: &SectionKind) -> Vec<WorldCupMatch> {
        parse_sectioned_lines(text.lines(), *kind)
    }

    fn write_row(
        writer: &mut ChunkWriter<'_>,
        m: &WorldCupMatch,
        input: &InputFile,
        parse_error: &mut ErrorAccumulator,
    ) -> Result<(), Box<dyn Error>> {
        use WorldCupColumn as C;

        let score = &m.score;
        writer.write_uinteger(C::MatchNo.index(), Some(m.match_no));
        writer.write_varchar(C::Dow.index(), Some(m.day_of_week.as_str()), parse_error)?;
        writer.write_varchar(C::MonthDay.index(), Some(m.month_day.as_str()), parse_error)?;
        writer.write_varchar(C::TimeLocal.index(), Some(m.time_local.as_str()), parse_error)?;
        writer.write_varchar(C::Home.index(), Some(m.home.as_str()), parse_error)?;
        writer.write_varchar(C::Away.index(), Some(m.away.as_str()), parse_error)?;
        writer.write_varchar(C::Stadium.index(), Some(m.stadium.as_str()), parse_error)?;
        writer.write_varchar(C::City.index(), m.city.as_deref(), parse_error)?;
        writer.write_varchar(C::ScoreBlob.index(), Some(m.score_blob.as_str()), parse_error)?;
        writer.write_uinteger(C::FtHome.index(), score.regulation.map(|s| s.home));
        writer.write_uinteger(C::FtAway.index(), score.regulation.map(|s| s.away));
        writer.write_uinteger(C::AetHome.index(), score.extra_time.map(|s| s.home));
        writer.write_uinteger(C::AetAway.index(), score.extra_time.map(|s| s.away));
        writer.write_uinteger(C::PenHome.index(), score.penalties.map(|s| s.home));
        writer.write_uinteger(C::PenAway.index(), score.penalties.map(|s| s.away));
        writer.write_varchar(
            C::HtRaw.index(),
            score.half_time_raw.as_deref(),
            parse_error,
        )?;
        writer.write_varchar(C::Section.index(), m.section.as_deref(), parse_error)?;
        writer.write_varchar(
            C::Stage.index(),
            m.stage.map(SectionKind::stage_label),
            parse_error,
        )?;
        writer.write_varchar(C::Source.index(), Some(input.file_name().as_str()), parse_error)?;
        Ok(())
    }
}

impl VTab for ReadWorldCupVTab {
    type InitData = ScanInitData<WorldCupMatch>;
    type BindData = ScanBindData<SectionKind>;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let inputs = bind_paths(bind)?
            .into_iter()
            .map(InputFile::plain)
            .collect();
        let compression = resolve_compression_mode(bind)?;
        let kind = parse_section_kind(named_varchar(bind, "section_kind")?.as_deref())?;

        add_result_columns(bind, WorldCupTable::COLUMNS);

        Ok(ScanBindData::new(inputs, compression, kind))
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        Ok(ScanInitData::default())
    }

    fn func(
        func: &TableFunctionInfo<Self>,
        output: &mut DataChunkHandle,
    ) -> Result<(), Box<dyn Error>> {
        fill_chunk::<WorldCupTable>(func.get_init_data(), func.get_bind_data(), output)
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        path_parameters()
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        varchar_named_parameters(&["section_kind", "compression"])
    }
}
