use pgtrack::track_module::verify_magic;
use pgtrack::{Registry, Value};
use pgtrack_abi::FunctionFlags;

#[test]
fn version_roundtrip() -> anyhow::Result<()> {
    let magic = unsafe { &*pg_track::pg_track_module_magic() };
    verify_magic("libpg_track", magic)?;

    let manifest = unsafe { &*pg_track::pg_track_module_manifest() };
    let registry = Registry::from_manifest(manifest)?;
    assert_eq!("pg_track", registry.module_name());

    let names: Vec<&str> = registry.functions().map(|f| f.name()).collect();
    assert_eq!(vec!["pg_track_version"], names);

    let value = registry.call("pg_track_version", &[])?;
    assert_eq!(Value::Text("1.0.0".to_string()), value);
    Ok(())
}

#[test]
fn version_query_is_marked_immutable() -> anyhow::Result<()> {
    let manifest = unsafe { &*pg_track::pg_track_module_manifest() };
    let registry = Registry::from_manifest(manifest)?;
    let function = registry.function("pg_track_version").expect("registered");
    assert!(function.flags().contains(FunctionFlags::IMMUTABLE));
    assert!(function.flags().contains(FunctionFlags::PARALLEL_SAFE));
    Ok(())
}
