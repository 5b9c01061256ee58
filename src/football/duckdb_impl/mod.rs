//! DuckDB C API interop shared by the table and scalar functions.

pub(crate) mod bind_info_ffi;
pub(crate) mod scalar;
pub(crate) mod string;
