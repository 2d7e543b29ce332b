//! A dynamic library exposing only the symbol `pg_track_module_magic`
//!
//! This is useful to demonstrate that the client code can verify binary
//! compatibility from this single symbol and based on it, can make decisions
//! about loading further sets of symbols (the module manifest). Binding the
//! full module API against this library fails at symbol resolution.

use pgtrack_abi::ModuleMagic;

static MAGIC: ModuleMagic = ModuleMagic::current();

#[no_mangle]
pub extern "C" fn pg_track_module_magic() -> *const ModuleMagic {
    &MAGIC
}
