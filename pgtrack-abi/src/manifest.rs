use std::os::raw::c_char;

use bitflags::bitflags;

use crate::datum::{Datum, FunctionCallInfo, ValueType};

/// Marker value identifying a shared object as a pg_track module.
pub const PG_TRACK_ABI_MAGIC: u32 = 0x5054_4d31; // "PTM1"

/// Bumped on any incompatible change to the types in this crate.
pub const PG_TRACK_ABI_VERSION: u32 = 1;

/// Symbol the loader resolves first, before anything else is touched.
pub const MAGIC_SYMBOL: &str = "pg_track_module_magic";

/// Symbol producing the function registration table.
pub const MANIFEST_SYMBOL: &str = "pg_track_module_manifest";

/// Compatibility block every module exports exactly once.
///
/// The size fields guard against layout drift between the host build and the
/// module build; a mismatch in either means the two were compiled against
/// incompatible revisions of this crate.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ModuleMagic {
    pub magic: u32,
    pub abi_version: u32,
    pub funcinfo_size: u32,
    pub datum_size: u32,
}

impl ModuleMagic {
    /// The magic block matching the ABI this crate was compiled with.
    pub const fn current() -> Self {
        Self {
            magic: PG_TRACK_ABI_MAGIC,
            abi_version: PG_TRACK_ABI_VERSION,
            funcinfo_size: std::mem::size_of::<FunctionInfo>() as u32,
            datum_size: std::mem::size_of::<Datum>() as u32,
        }
    }
}

bitflags! {
    /// Behavioral properties a module declares for a registered function.
    pub struct FunctionFlags: u32 {
        /// Result depends only on the arguments.
        const IMMUTABLE = 1 << 0;
        /// Safe to invoke from parallel workers without coordination.
        const PARALLEL_SAFE = 1 << 1;
    }
}

/// Native entry point invoked by the host dispatcher.
pub type FunctionEntry = unsafe extern "C" fn(fcinfo: *const FunctionCallInfo) -> Datum;

/// One row of the registration table.
#[repr(C)]
pub struct FunctionInfo {
    /// Host-visible function name, NUL-terminated.
    pub name: *const c_char,
    /// Number of declared parameters.
    pub nargs: u16,
    /// Parameter types, `nargs` entries; may be null when `nargs` is zero.
    pub arg_types: *const ValueType,
    pub return_type: ValueType,
    /// [`FunctionFlags`] bits.
    pub flags: u32,
    pub entry: FunctionEntry,
}

// SAFETY: rows are 'static tables of pointers into 'static data, never
// written to after compilation.
unsafe impl Sync for FunctionInfo {}

/// Registration table exported by a module, read once at load time.
#[repr(C)]
pub struct ModuleManifest {
    /// Module name, NUL-terminated.
    pub name: *const c_char,
    pub function_count: usize,
    pub functions: *const FunctionInfo,
}

// SAFETY: same as FunctionInfo.
unsafe impl Sync for ModuleManifest {}
