//! Host-side loading and dispatch for pg_track native modules

pub use error::{Result, TrackError};

pub mod registry;
pub mod track_module;
mod error;

pub use registry::{RegisteredFunction, Registry, Value};
pub use track_module::TrackModule;

#[cfg(test)]
mod tests {
    use pgtrack_abi::{FunctionFlags, ValueType};

    use crate::registry::{Registry, Value};
    use crate::track_module::verify_magic;
    use crate::TrackError;

    fn load_registry() -> Registry {
        let magic = unsafe { &*pg_track::pg_track_module_magic() };
        verify_magic("pg_track", magic).unwrap();
        let manifest = unsafe { &*pg_track::pg_track_module_manifest() };
        Registry::from_manifest(manifest).unwrap()
    }

    #[test]
    fn version_query_returns_fixed_literal() {
        let registry = load_registry();
        let value = registry.call("pg_track_version", &[]).unwrap();
        assert_eq!(Value::Text("1.0.0".to_string()), value);
    }

    #[test]
    fn version_query_is_deterministic() {
        let registry = load_registry();
        for _ in 0..100 {
            let value = registry.call("pg_track_version", &[]).unwrap();
            assert_eq!(Value::Text("1.0.0".to_string()), value);
        }
    }

    #[test]
    fn version_query_declares_no_parameters() {
        let registry = load_registry();
        let function = registry.function("pg_track_version").unwrap();
        assert!(function.arg_types().is_empty());
        assert_eq!(ValueType::Text, function.return_type());
        assert!(function.flags().contains(FunctionFlags::IMMUTABLE));
        assert!(function.flags().contains(FunctionFlags::PARALLEL_SAFE));
    }

    #[test]
    fn version_query_rejects_arguments_at_dispatch() {
        let registry = load_registry();
        let err = registry
            .call("pg_track_version", &[Value::Int32(1)])
            .unwrap_err();
        assert!(matches!(err, TrackError::ArityMismatch(_, 0, 1)));
    }

    #[test]
    fn version_query_from_many_threads() {
        let registry = load_registry();
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..200 {
                        let value = registry.call("pg_track_version", &[]).unwrap();
                        assert_eq!(Value::Text("1.0.0".to_string()), value);
                    }
                });
            }
        });
    }
}
