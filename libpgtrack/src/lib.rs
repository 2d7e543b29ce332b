//! The pg_track native module
//!
//! Registers a single function, `pg_track_version`, which reports the version
//! of the installed build as text. Only the compatibility marker and the
//! manifest are exported by name; the host reaches `pg_track_version` through
//! the manifest's entry pointer.

use std::os::raw::c_char;

use pgtrack_abi::{
    Datum, FunctionCallInfo, FunctionFlags, FunctionInfo, ModuleMagic, ModuleManifest, ValueType,
};

/// Version reported by `pg_track_version()`.
const PG_TRACK_VERSION: &str = "1.0.0\0";

static MAGIC: ModuleMagic = ModuleMagic::current();

/// Resolved by the loader before any other symbol.
#[no_mangle]
pub extern "C" fn pg_track_module_magic() -> *const ModuleMagic {
    &MAGIC
}

unsafe extern "C" fn pg_track_version(_fcinfo: *const FunctionCallInfo) -> Datum {
    Datum::text(PG_TRACK_VERSION.as_ptr() as *const c_char)
}

static FUNCTIONS: [FunctionInfo; 1] = [FunctionInfo {
    name: "pg_track_version\0".as_ptr() as *const c_char,
    nargs: 0,
    arg_types: std::ptr::null(),
    return_type: ValueType::Text,
    flags: FunctionFlags::IMMUTABLE.bits() | FunctionFlags::PARALLEL_SAFE.bits(),
    entry: pg_track_version,
}];

static MANIFEST: ModuleManifest = ModuleManifest {
    name: "pg_track\0".as_ptr() as *const c_char,
    function_count: FUNCTIONS.len(),
    functions: FUNCTIONS.as_ptr(),
};

/// Registration table consulted by the host dispatcher.
#[no_mangle]
pub extern "C" fn pg_track_module_manifest() -> *const ModuleManifest {
    &MANIFEST
}
