use libduckdb_sys::duckdb_string_t;

/// Strings up to this length are stored inline in the `duckdb_string_t` itself.
const INLINE_CAPACITY: usize = 12;

/// Raw bytes of a DuckDB string, borrowed from the vector that owns them.
///
/// # Safety
///
/// `s` must be a non-NULL row of a VARCHAR vector that stays alive for `'a`.
unsafe fn duckdb_string_bytes<'a>(s: &'a duckdb_string_t) -> &'a [u8] {
    // SAFETY: both union variants start with the length.
    let len = unsafe { s.value.inlined.length } as usize;
    if len == 0 {
        return &[];
    }

    let data = if len <= INLINE_CAPACITY {
        // SAFETY: short strings use the inlined variant.
        unsafe { s.value.inlined.inlined.as_ptr() }
    } else {
        // SAFETY: long strings use the pointer variant, owned by the vector.
        unsafe { s.value.pointer.ptr }
    };

    // SAFETY: `data` points at `len` initialized bytes for this row.
    unsafe { std::slice::from_raw_parts(data.cast::<u8>(), len) }
}

/// Decode a VARCHAR row into an owned `String`, replacing invalid UTF-8.
///
/// # Safety
///
/// Same contract as reading the row directly: `s` must be a non-NULL row of
/// the input vector of the running scalar invocation.
pub unsafe fn decode_duckdb_string(s: &duckdb_string_t) -> String {
    // SAFETY: forwarded caller contract.
    let bytes = unsafe { duckdb_string_bytes(s) };
    String::from_utf8_lossy(bytes).into_owned()
}
