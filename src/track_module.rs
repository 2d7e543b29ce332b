//! Loading and verification of pg_track shared modules
//!
//! Loading happens in two stages: only the compatibility marker is bound
//! first, and the full module API is bound after the marker checks out.

use std::path::Path;

use dlopen2::wrapper::Container;
use dlopen2::wrapper::WrapperApi;
use pgtrack_abi::{
    Datum, FunctionInfo, ModuleMagic, ModuleManifest, PG_TRACK_ABI_MAGIC, PG_TRACK_ABI_VERSION,
};

use crate::error::{Result, TrackError};
use crate::registry::{Registry, Value};

/// First-stage bindings: nothing but the compatibility marker.
#[derive(dlopen2_derive::WrapperApi)]
struct MagicBindings {
    #[dlopen2_name = "pg_track_module_magic"]
    module_magic: unsafe extern "C" fn() -> *const ModuleMagic,
}

/// Full bindings, resolved only for verified modules.
#[derive(dlopen2_derive::WrapperApi)]
struct ModuleBindings {
    #[dlopen2_name = "pg_track_module_magic"]
    module_magic: unsafe extern "C" fn() -> *const ModuleMagic,
    #[dlopen2_name = "pg_track_module_manifest"]
    module_manifest: unsafe extern "C" fn() -> *const ModuleManifest,
}

/// A loaded pg_track module: the dlopen handle plus its registration table.
///
/// The handle must stay alive for as long as the registry is used; entry
/// pointers lead into the mapped library.
pub struct TrackModule {
    api: Container<ModuleBindings>,
    registry: Registry,
}

impl TrackModule {
    /// Opens a shared module, verifies its compatibility marker, and reads
    /// its registration table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().canonicalize()?;
        let libname = path.to_string_lossy().into_owned();
        let marker: Container<MagicBindings> = unsafe { Container::load(path.as_os_str()) }?;
        let magic_ptr = unsafe { marker.module_magic() };
        if magic_ptr.is_null() {
            return Err(TrackError::BadMagic(libname, 0));
        }
        let magic = unsafe { *magic_ptr };
        verify_magic(&libname, &magic)?;
        log::debug!("{libname}: module ABI v{}", magic.abi_version);

        let api: Container<ModuleBindings> = unsafe { Container::load(path.as_os_str()) }?;
        let manifest_ptr = unsafe { api.module_manifest() };
        if manifest_ptr.is_null() {
            return Err(TrackError::BadManifest("manifest is null"));
        }
        let registry = Registry::from_manifest(unsafe { &*manifest_ptr })?;
        Ok(Self { api, registry })
    }

    pub fn name(&self) -> &str {
        self.registry.module_name()
    }

    /// Compatibility marker re-read from the live module.
    pub fn magic(&self) -> ModuleMagic {
        // Checked non-null during load.
        unsafe { *self.api.module_magic() }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Dispatches a call through the module's registration table.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.registry.call(name, args)
    }
}

/// Checks a module's compatibility marker against this host build.
pub fn verify_magic(source: &str, magic: &ModuleMagic) -> Result<()> {
    if magic.magic != PG_TRACK_ABI_MAGIC {
        return Err(TrackError::BadMagic(source.to_string(), magic.magic));
    }
    if magic.abi_version != PG_TRACK_ABI_VERSION {
        return Err(TrackError::UnsupportedAbi(
            source.to_string(),
            magic.abi_version,
            PG_TRACK_ABI_VERSION,
        ));
    }
    if magic.funcinfo_size != std::mem::size_of::<FunctionInfo>() as u32 {
        return Err(TrackError::LayoutMismatch(
            source.to_string(),
            "function info size",
        ));
    }
    if magic.datum_size != std::mem::size_of::<Datum>() as u32 {
        return Err(TrackError::LayoutMismatch(source.to_string(), "datum size"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pgtrack_abi::ModuleMagic;

    use super::verify_magic;
    use crate::error::TrackError;

    #[test]
    fn accepts_current_marker() {
        verify_magic("test", &ModuleMagic::current()).unwrap();
    }

    #[test]
    fn rejects_foreign_magic() {
        let magic = ModuleMagic {
            magic: 0xdead_beef,
            ..ModuleMagic::current()
        };
        let err = verify_magic("test", &magic).unwrap_err();
        assert!(matches!(err, TrackError::BadMagic(_, 0xdead_beef)));
    }

    #[test]
    fn rejects_unsupported_abi_version() {
        let magic = ModuleMagic {
            abi_version: 999,
            ..ModuleMagic::current()
        };
        let err = verify_magic("test", &magic).unwrap_err();
        assert!(matches!(err, TrackError::UnsupportedAbi(_, 999, _)));
    }

    #[test]
    fn rejects_layout_drift() {
        let magic = ModuleMagic {
            funcinfo_size: 1,
            ..ModuleMagic::current()
        };
        assert!(matches!(
            verify_magic("test", &magic).unwrap_err(),
            TrackError::LayoutMismatch(_, _)
        ));

        let magic = ModuleMagic {
            datum_size: 1,
            ..ModuleMagic::current()
        };
        assert!(matches!(
            verify_magic("test", &magic).unwrap_err(),
            TrackError::LayoutMismatch(_, _)
        ));
    }
}
