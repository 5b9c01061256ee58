mod duckdb_impl;
mod error;
mod log;
mod match_line;
mod reader;
mod score;
mod season;
mod sectioned;
mod stateful;
mod types;

use duckdb::{Connection, Result};
use duckdb_ext_macros::duckdb_extension;
use std::error::Error;

pub use match_line::{FootballMatchJsonScalar, parse_match_line};
pub use reader::{ReadChampionsLeagueVTab, ReadWorldCupVTab};
pub use score::{FootballScoreJsonScalar, parse_score_blob};
pub use season::{Season, season_from_path, season_in_range};
pub use sectioned::parse_sectioned_lines;
pub use stateful::{
    FootballStageScalar, ParseState, classify_stage, parse_stateful_document,
    parse_stateful_document_tagged,
};
pub use types::{ChampionsLeagueMatch, Score, ScoreSet, SectionKind, Stage, WorldCupMatch};

#[duckdb_extension(name = "football", api_version = "v1.0.0")]
pub unsafe fn extension_entrypoint(con: Connection) -> Result<(), Box<dyn Error>> {
    // Table functions
    con.register_table_function::<ReadWorldCupVTab>("read_worldcup_txt")?;
    con.register_table_function::<ReadChampionsLeagueVTab>("read_champions_league_txt")?;

    // Scalar functions
    con.register_scalar_function::<FootballScoreJsonScalar>("football_score_json")?;
    con.register_scalar_function::<FootballMatchJsonScalar>("football_match_json")?;
    con.register_scalar_function::<FootballStageScalar>("football_stage")?;

    Ok(())
}
