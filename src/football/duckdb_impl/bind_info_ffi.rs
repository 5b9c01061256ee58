use duckdb::vtab::BindInfo;
use libduckdb_sys::{
    duckdb_bind_get_named_parameter, duckdb_bind_info, duckdb_destroy_value, duckdb_free,
    duckdb_get_varchar, duckdb_is_null_value, duckdb_value,
};
use std::ffi::{CStr, CString};
use std::os::raw::c_void;

#[derive(Debug, Eq, PartialEq)]
pub(crate) enum NamedParameterVarchar {
    Missing,
    Null,
    Value(String),
}

impl NamedParameterVarchar {
    /// Collapses omitted, SQL NULL and the literal `'null'` into `None`.
    pub(crate) fn into_option(self) -> Option<String> {
        match self {
            Self::Missing | Self::Null => None,
            Self::Value(raw) => {
                let trimmed = raw.trim();
                if trimmed.eq_ignore_ascii_case("null") {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }
}

/// A `duckdb_value` handed out by DuckDB, destroyed when dropped.
struct OwnedValue(duckdb_value);

impl OwnedValue {
    fn is_sql_null(&self) -> bool {
        // SAFETY: `self.0` is a live, non-null value handle.
        unsafe { duckdb_is_null_value(self.0) }
    }

    fn to_varchar(&self) -> Option<String> {
        // SAFETY: `self.0` is live; DuckDB allocates the returned C string.
        let raw = unsafe { duckdb_get_varchar(self.0) };
        if raw.is_null() {
            return None;
        }
        // SAFETY: `raw` is NUL-terminated and freed exactly once here.
        let text = unsafe {
            let text = CStr::from_ptr(raw).to_string_lossy().into_owned();
            duckdb_free(raw.cast::<c_void>());
            text
        };
        Some(text)
    }
}

impl Drop for OwnedValue {
    fn drop(&mut self) {
        // SAFETY: the handle is owned by this wrapper and not used after drop.
        unsafe { duckdb_destroy_value(&mut self.0) };
    }
}

/// Read a named VARCHAR parameter, telling an omitted parameter apart from SQL NULL.
pub(crate) fn get_named_parameter_varchar(
    bind: &BindInfo,
    name: &str,
) -> Result<NamedParameterVarchar, Box<dyn std::error::Error>> {
    let name_cstr = CString::new(name)?;

    // SAFETY: called during bind, while the bind handle is valid.
    let handle =
        unsafe { duckdb_bind_get_named_parameter(bind_info_ptr(bind), name_cstr.as_ptr()) };
    if handle.is_null() {
        return Ok(NamedParameterVarchar::Missing);
    }

    let value = OwnedValue(handle);
    if value.is_sql_null() {
        return Ok(NamedParameterVarchar::Null);
    }
    value
        .to_varchar()
        .map(NamedParameterVarchar::Value)
        .ok_or_else(|| format!("Named parameter '{}' is not readable as VARCHAR", name).into())
}

fn bind_info_ptr(bind: &BindInfo) -> duckdb_bind_info {
    // SAFETY: `BindInfo` wraps a single `duckdb_bind_info` and exposes no raw accessor.
    // Recheck its layout when bumping the duckdb crate.
    unsafe { *(bind as *const BindInfo as *const duckdb_bind_info) }
}
