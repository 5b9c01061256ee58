extern crate duckdb;
extern crate libduckdb_sys;

pub mod football;
