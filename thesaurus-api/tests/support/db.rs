use thesaurus_storage::{DbConfig, PgGraphStore};

pub fn test_graph_store() -> PgGraphStore {
    let config = DbConfig::from_env();
    PgGraphStore::from_config(&config).expect("Failed to create graph store")
}
