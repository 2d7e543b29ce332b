//! C ABI definitions shared between pg_track native modules and their hosts
//!
//! A loadable module exports exactly two symbols: a compatibility marker the
//! loader verifies before binding anything else, and a manifest describing
//! every function the module registers. All call dispatch goes through the
//! manifest's entry pointers; entry points are never exported by name.

mod datum;
mod manifest;

pub use datum::{Datum, DatumPayload, FunctionCallInfo, ValueType};
pub use manifest::{
    FunctionEntry, FunctionFlags, FunctionInfo, ModuleMagic, ModuleManifest, MAGIC_SYMBOL,
    MANIFEST_SYMBOL, PG_TRACK_ABI_MAGIC, PG_TRACK_ABI_VERSION,
};
