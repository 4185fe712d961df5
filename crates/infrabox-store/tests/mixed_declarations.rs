//! Overlap scans across environments written by different generations of
//! the tool: some with the structured record, some with only `variables.tf`.

use infrabox_schema::{AddressBlock, EnvName, EnvParams, EnvRecord, ParamDefaults};
use infrabox_store::{
    check_overlap, read_declaration, DeclarationSource, EnvLayout, EnvStore,
};
use std::fs;

fn block(s: &str) -> AddressBlock {
    AddressBlock::parse(s).unwrap()
}

fn store_with_two_generations() -> (tempfile::TempDir, EnvStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = EnvStore::new(EnvLayout::new(dir.path().join("environments")));

    // Current generation: sidecar record.
    let dev = EnvName::sanitize("dev").unwrap();
    store.create_dir(&dev).unwrap();
    let record = EnvRecord::new(EnvParams::from_defaults(&dev, &ParamDefaults::default()));
    store.write_record(&record).unwrap();

    // Older generation: only the variables file.
    let stage = EnvName::sanitize("stage").unwrap();
    store.create_dir(&stage).unwrap();
    store
        .write_file(
            &stage,
            "variables.tf",
            "locals {\n  vnet_cidr = \"10.20.0.0/16\"\n  subnet_cidr = \"10.20.1.0/24\"\n}\n",
        )
        .unwrap();

    // Hand-made directory with nothing to read.
    fs::create_dir(store.layout().env_path("scratch")).unwrap();

    (dir, store)
}

fn listing(store: &EnvStore) -> Vec<(String, std::path::PathBuf)> {
    store
        .list()
        .unwrap()
        .into_iter()
        .map(|e| (e.name, e.path))
        .collect()
}

#[test]
fn both_generations_are_discovered() {
    let (_dir, store) = store_with_two_generations();
    let dev = read_declaration(&store.layout().env_path("dev")).unwrap();
    let stage = read_declaration(&store.layout().env_path("stage")).unwrap();
    assert_eq!(dev.source, DeclarationSource::Record);
    assert_eq!(stage.source, DeclarationSource::VariablesFile);
    assert!(read_declaration(&store.layout().env_path("scratch")).is_none());
}

#[test]
fn candidate_clashing_with_record_env_is_rejected() {
    let (_dir, store) = store_with_two_generations();
    let err = check_overlap(&block("10.0.0.0/24"), "prod", listing(&store)).unwrap_err();
    assert_eq!(err.conflicting_environment, "dev");
    assert_eq!(err.conflicting_block, block("10.0.0.0/16"));
}

#[test]
fn candidate_clashing_with_legacy_env_is_rejected() {
    let (_dir, store) = store_with_two_generations();
    let err = check_overlap(&block("10.20.1.128/25"), "prod", listing(&store)).unwrap_err();
    assert_eq!(err.conflicting_environment, "stage");
}

#[test]
fn free_space_passes() {
    let (_dir, store) = store_with_two_generations();
    assert!(check_overlap(&block("10.30.0.0/16"), "prod", listing(&store)).is_ok());
}
