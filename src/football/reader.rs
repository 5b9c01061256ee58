//! Shared machinery for the `read_*_txt` table functions: path expansion,
//! input decoding, per-call scan state and chunk writing.

use super::{
    duckdb_impl::bind_info_ffi::get_named_parameter_varchar, error::ErrorAccumulator, log,
};
use chrono::NaiveDate;
use duckdb::{
    core::{DataChunkHandle, Inserter, LogicalTypeHandle, LogicalTypeId},
    vtab::BindInfo,
};
use libduckdb_sys::duckdb_date;
use std::borrow::Cow;
use std::error::Error;
use std::ffi::CString;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use zstd::stream::read::Decoder as ZstdDecoder;

mod champions;
mod worldcup;

pub use champions::ReadChampionsLeagueVTab;
pub use worldcup::ReadWorldCupVTab;

const PATH_PATTERN_PARAM_INDEX: u64 = 0;
const ROWS_PER_CHUNK: usize = 2048;

const EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1970, 1, 1) {
    Some(date) => date,
    None => panic!("1970-01-01 is a valid date"),
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum CompressionMode {
    Plain,
    Zstd,
}

impl CompressionMode {
    fn parse(raw: &str) -> Result<Self, Box<dyn Error>> {
        let normalized = raw.trim();
        if normalized.eq_ignore_ascii_case("zstd") {
            Ok(Self::Zstd)
        } else {
            Err(format!(
                "Invalid compression value '{}'. Supported values: 'zstd' or NULL/omitted.",
                normalized
            )
            .into())
        }
    }
}

fn resolve_compression_mode(bind: &BindInfo) -> Result<CompressionMode, Box<dyn Error>> {
    match get_named_parameter_varchar(bind, "compression")?.into_option() {
        None => Ok(CompressionMode::Plain),
        Some(raw) => CompressionMode::parse(&raw),
    }
}

pub(crate) fn named_varchar(bind: &BindInfo, name: &str) -> Result<Option<String>, Box<dyn Error>> {
    Ok(get_named_parameter_varchar(bind, name)?.into_option())
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ColumnLogicalType {
    Varchar,
    UInteger,
    Boolean,
    Date,
}

impl ColumnLogicalType {
    fn to_handle(self) -> LogicalTypeHandle {
        match self {
            Self::Varchar => LogicalTypeHandle::from(LogicalTypeId::Varchar),
            Self::UInteger => LogicalTypeHandle::from(LogicalTypeId::UInteger),
            Self::Boolean => LogicalTypeHandle::from(LogicalTypeId::Boolean),
            Self::Date => LogicalTypeHandle::from(LogicalTypeId::Date),
        }
    }
}

pub(crate) struct ColumnDef {
    pub name: &'static str,
    pub logical_type: ColumnLogicalType,
}

/// One file to scan, with the season it belongs to when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InputFile {
    pub path: PathBuf,
    pub season: Option<String>,
}

impl InputFile {
    pub fn plain(path: PathBuf) -> Self {
        Self { path, season: None }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn label(&self) -> String {
        self.season
            .clone()
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Expand a single path or a glob pattern (`*`/`?`) into sorted file paths.
fn expand_paths(pattern: &str) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    if pattern.contains('*') || pattern.contains('?') {
        Ok(glob::glob(pattern)?.filter_map(|entry| entry.ok()).collect())
    } else {
        Ok(vec![PathBuf::from(pattern)])
    }
}

pub(crate) fn bind_paths(bind: &BindInfo) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let pattern = bind.get_parameter(PATH_PATTERN_PARAM_INDEX).to_string();
    expand_paths(&pattern)
}

pub(crate) fn add_result_columns(bind: &BindInfo, columns: &[ColumnDef]) {
    for column in columns {
        bind.add_result_column(column.name, column.logical_type.to_handle());
    }
}

pub(crate) fn path_parameters() -> Option<Vec<LogicalTypeHandle>> {
    Some(vec![
        LogicalTypeHandle::from(LogicalTypeId::Varchar), // path or glob pattern (required)
    ])
}

pub(crate) fn varchar_named_parameters(names: &[&str]) -> Option<Vec<(String, LogicalTypeHandle)>> {
    Some(
        names
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    LogicalTypeHandle::from(LogicalTypeId::Varchar),
                )
            })
            .collect(),
    )
}

struct DecodedText {
    text: String,
    lossy: bool,
}

fn decode_text(bytes: Vec<u8>) -> DecodedText {
    match String::from_utf8(bytes) {
        Ok(text) => DecodedText { text, lossy: false },
        Err(e) => DecodedText {
            text: String::from_utf8_lossy(e.as_bytes()).into_owned(),
            lossy: true,
        },
    }
}

fn read_input_text(path: &Path, compression: CompressionMode) -> Result<DecodedText, String> {
    let file =
        File::open(path).map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

    let mut reader: Box<dyn Read> = match compression {
        CompressionMode::Plain => Box::new(file),
        CompressionMode::Zstd => Box::new(ZstdDecoder::new(file).map_err(|e| {
            format!(
                "Failed to initialize zstd decoder for '{}': {}",
                path.display(),
                e
            )
        })?),
    };

    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| format!("Failed to read file '{}': {}", path.display(), e))?;
    Ok(decode_text(bytes))
}

pub(crate) fn to_duckdb_date(date: NaiveDate) -> Option<duckdb_date> {
    let days = i32::try_from(date.signed_duration_since(EPOCH).num_days()).ok()?;
    Some(duckdb_date { days })
}

fn sanitize_for_cstring<'a>(
    value: &'a str,
    field_name: &str,
    parse_error: &mut ErrorAccumulator,
) -> Cow<'a, str> {
    if value.contains('\0') {
        parse_error.push(format!("Sanitized interior NUL in {}", field_name));
        Cow::Owned(value.replace('\0', " "))
    } else {
        Cow::Borrowed(value)
    }
}

fn sanitize_for_cstring_silent(value: &str) -> Cow<'_, str> {
    if value.contains('\0') {
        Cow::Owned(value.replace('\0', " "))
    } else {
        Cow::Borrowed(value)
    }
}

/// A table function backed by one of the football parsers.
pub(crate) trait TableSource {
    type Options: Send + Sync;
    type Row: Send;

    const COLUMNS: &'static [ColumnDef];
    const PARSE_ERROR_COLUMN: usize;

    fn parse_input(input: &InputFile, text: &str, options: &Self::Options) -> Vec<Self::Row>;

    fn write_row(
        writer: &mut ChunkWriter<'_>,
        row: &Self::Row,
        input: &InputFile,
        parse_error: &mut ErrorAccumulator,
    ) -> Result<(), Box<dyn Error>>;
}

pub struct ScanBindData<O> {
    inputs: Vec<InputFile>,
    compression: CompressionMode,
    options: O,
}

impl<O> ScanBindData<O> {
    pub(crate) fn new(inputs: Vec<InputFile>, compression: CompressionMode, options: O) -> Self {
        Self {
            inputs,
            compression,
            options,
        }
    }
}

/// Rows parsed from one input, not yet written to an output chunk.
struct PendingRows<R> {
    input_idx: usize,
    rows: std::vec::IntoIter<R>,
    file_note: Option<String>,
}

struct ScanState<R> {
    next_input_idx: usize,
    available: Vec<PendingRows<R>>,
}

pub struct ScanInitData<R> {
    state: Mutex<ScanState<R>>,
}

impl<R> Default for ScanInitData<R> {
    fn default() -> Self {
        Self {
            state: Mutex::new(ScanState {
                next_input_idx: 0,
                available: Vec::new(),
            }),
        }
    }
}

impl<R> ScanInitData<R> {
    fn lock(&self) -> Result<MutexGuard<'_, ScanState<R>>, Box<dyn Error>> {
        self.state
            .lock()
            .map_err(|_| "football scan state lock poisoned".into())
    }
}

pub(crate) struct ChunkWriter<'a> {
    output: &'a mut DataChunkHandle,
    columns: &'static [ColumnDef],
    row_count: usize,
}

impl<'a> ChunkWriter<'a> {
    fn new(output: &'a mut DataChunkHandle, columns: &'static [ColumnDef]) -> Self {
        Self {
            output,
            columns,
            row_count: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.row_count >= ROWS_PER_CHUNK
    }

    pub fn write_varchar(
        &mut self,
        column: usize,
        value: Option<&str>,
        parse_error: &mut ErrorAccumulator,
    ) -> Result<(), Box<dyn Error>> {
        let mut vector = self.output.flat_vector(column);
        if let Some(value) = value {
            let sanitized = sanitize_for_cstring(value, self.columns[column].name, parse_error);
            vector.insert(self.row_count, CString::new(sanitized.as_ref())?);
        } else {
            vector.set_null(self.row_count);
        }
        Ok(())
    }

    pub fn write_uinteger(&mut self, column: usize, value: Option<u32>) {
        let mut vector = self.output.flat_vector(column);
        if let Some(value) = value {
            vector.as_mut_slice::<u32>()[self.row_count] = value;
        } else {
            vector.set_null(self.row_count);
        }
    }

    pub fn write_bool(&mut self, column: usize, value: bool) {
        let mut vector = self.output.flat_vector(column);
        vector.as_mut_slice::<bool>()[self.row_count] = value;
    }

    pub fn write_date(&mut self, column: usize, value: Option<duckdb_date>) {
        let mut vector = self.output.flat_vector(column);
        if let Some(value) = value {
            vector.as_mut_slice::<duckdb_date>()[self.row_count] = value;
        } else {
            vector.set_null(self.row_count);
        }
    }

    fn finish_row(
        &mut self,
        parse_error_column: usize,
        parse_error: &mut ErrorAccumulator,
    ) -> Result<(), Box<dyn Error>> {
        let mut vector = self.output.flat_vector(parse_error_column);
        match parse_error.take() {
            None => vector.set_null(self.row_count),
            Some(message) => {
                let message = sanitize_for_cstring_silent(message.as_str());
                vector.insert(self.row_count, CString::new(message.as_ref())?);
            }
        }
        self.row_count += 1;
        Ok(())
    }

    fn set_output_len(&mut self) {
        self.output.set_len(self.row_count);
    }
}

fn acquire_rows<T: TableSource>(
    init_data: &ScanInitData<T::Row>,
    bind_data: &ScanBindData<T::Options>,
) -> Result<Option<PendingRows<T::Row>>, Box<dyn Error>> {
    loop {
        let input_idx = {
            let mut state = init_data.lock()?;

            if let Some(pending) = state.available.pop() {
                return Ok(Some(pending));
            }

            if state.next_input_idx < bind_data.inputs.len() {
                let input_idx = state.next_input_idx;
                state.next_input_idx += 1;
                input_idx
            } else {
                return Ok(None);
            }
        };

        let input = &bind_data.inputs[input_idx];
        match read_input_text(&input.path, bind_data.compression) {
            Ok(decoded) => {
                let rows = T::parse_input(input, &decoded.text, &bind_data.options);
                log::info(format!("Parsed {}: {} matches", input.label(), rows.len()));
                let file_note = decoded
                    .lossy
                    .then(|| format!("Invalid UTF-8 replaced in {}", input.file_name()));
                return Ok(Some(PendingRows {
                    input_idx,
                    rows: rows.into_iter(),
                    file_note,
                }));
            }
            Err(err_msg) => {
                if bind_data.inputs.len() == 1 {
                    return Err(err_msg.into());
                }

                log::warn(&err_msg);
            }
        }
    }
}

/// Fill one output chunk with up to `ROWS_PER_CHUNK` rows, resuming where the
/// previous call stopped.
pub(crate) fn fill_chunk<T: TableSource>(
    init_data: &ScanInitData<T::Row>,
    bind_data: &ScanBindData<T::Options>,
    output: &mut DataChunkHandle,
) -> Result<(), Box<dyn Error>> {
    let mut writer = ChunkWriter::new(output, T::COLUMNS);
    let mut current: Option<PendingRows<T::Row>> = None;

    while !writer.is_full() {
        if current.is_none() {
            current = acquire_rows::<T>(init_data, bind_data)?;
            if current.is_none() {
                break;
            }
        }

        if let Some(mut pending) = current.take()
            && let Some(row) = pending.rows.next()
        {
            let input = &bind_data.inputs[pending.input_idx];
            let mut parse_error = ErrorAccumulator::with_note(pending.file_note.as_deref());
            T::write_row(&mut writer, &row, input, &mut parse_error)?;
            writer.finish_row(T::PARSE_ERROR_COLUMN, &mut parse_error)?;
            current = Some(pending);
        }
        // An exhausted input is dropped; the next iteration acquires more work.
    }

    if let Some(pending) = current {
        init_data.lock()?.available.push(pending);
    }

    writer.set_output_len();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compression_mode_zstd_case_insensitive() {
        assert_eq!(
            CompressionMode::parse("zstd").unwrap(),
            CompressionMode::Zstd
        );
        assert_eq!(
            CompressionMode::parse(" ZsTd ").unwrap(),
            CompressionMode::Zstd
        );
    }

    #[test]
    fn test_parse_compression_mode_rejects_empty_value() {
        let err = CompressionMode::parse("   ").unwrap_err().to_string();
        assert!(err.contains("Invalid compression value ''"));
    }

    #[test]
    fn test_parse_compression_mode_rejects_unsupported_value() {
        let err = CompressionMode::parse("gzip").unwrap_err().to_string();
        assert!(err.contains("Invalid compression value 'gzip'"));
    }

    #[test]
    fn test_expand_paths_single_file_is_kept_verbatim() {
        let paths = expand_paths("champions-league/2011-12/cl.txt").unwrap();
        assert_eq!(paths, vec![PathBuf::from("champions-league/2011-12/cl.txt")]);
    }

    #[test]
    fn test_expand_paths_glob_without_matches_is_empty() {
        let paths = expand_paths("/nonexistent-football-dir/*/cl.txt").unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_input_file_names_and_labels() {
        let input = InputFile {
            path: PathBuf::from("champions-league/2011-12/cl.txt"),
            season: Some("2011-12".to_string()),
        };
        assert_eq!(input.file_name(), "cl.txt");
        assert_eq!(input.label(), "2011-12");

        let plain = InputFile::plain(PathBuf::from("worldcup/cup.txt"));
        assert_eq!(plain.file_name(), "cup.txt");
        assert_eq!(plain.label(), "worldcup/cup.txt");
    }

    #[test]
    fn test_decode_text_flags_invalid_utf8() {
        let clean = decode_text("Estádio Mineirão".as_bytes().to_vec());
        assert_eq!(clean.text, "Estádio Mineirão");
        assert!(!clean.lossy);

        let dirty = decode_text(vec![b'A', 0xff, b'B']);
        assert_eq!(dirty.text, "A\u{fffd}B");
        assert!(dirty.lossy);
    }

    #[test]
    fn test_read_input_text_missing_file_reports_path() {
        let err = read_input_text(
            Path::new("/nonexistent-football-dir/cl.txt"),
            CompressionMode::Plain,
        )
        .err()
        .expect("missing file should fail");
        assert!(err.contains("Failed to open file '/nonexistent-football-dir/cl.txt'"));
    }

    #[test]
    fn test_to_duckdb_date_counts_days_from_epoch() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(to_duckdb_date(epoch).unwrap().days, 0);

        let final_2012 = NaiveDate::from_ymd_opt(2012, 5, 19).unwrap();
        assert_eq!(to_duckdb_date(final_2012).unwrap().days, 15479);

        let before = NaiveDate::from_ymd_opt(1969, 12, 31).unwrap();
        assert_eq!(to_duckdb_date(before).unwrap().days, -1);
    }

    #[test]
    fn test_sanitize_for_cstring_replaces_interior_nul_and_records_error() {
        let mut parse_error = ErrorAccumulator::default();
        let sanitized = sanitize_for_cstring("Bayern\0München", "home_team", &mut parse_error);
        assert_eq!(sanitized.as_ref(), "Bayern München");

        let message = parse_error.take().expect("expected parse_error message");
        assert!(message.contains("Sanitized interior NUL in home_team"));
    }

    #[test]
    fn test_sanitize_for_cstring_preserves_clean_values() {
        let mut parse_error = ErrorAccumulator::default();
        let sanitized = sanitize_for_cstring("Chelsea FC", "away_team", &mut parse_error);
        assert_eq!(sanitized.as_ref(), "Chelsea FC");
        assert!(parse_error.take().is_none());
    }

    #[test]
    fn test_rows_per_chunk_constant_matches_contract() {
        assert_eq!(ROWS_PER_CHUNK, 2048);
    }

    #[test]
    fn test_scan_init_data_starts_empty() {
        let init_data: ScanInitData<u32> = ScanInitData::default();
        let state = init_data.lock().unwrap();
        assert_eq!(state.next_input_idx, 0);
        assert!(state.available.is_empty());
    }
}
