use workforce_db::{
    Column, ColumnType, Database, DatabaseSettings, EngineSettings, MetaData, Table,
};

static PROBES: Table = Table::new(
    "probes",
    &[
        Column::new("id", ColumnType::Integer).primary_key(),
        Column::new("label", ColumnType::Text),
    ],
);

#[tokio::test]
async fn database_engines_share_one_store() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("shared.db");
    let settings = DatabaseSettings {
        url_sync: path.display().to_string(),
        url_async: format!("sqlite://{}", path.display()),
        engine: EngineSettings {
            pool_size: 1,
            max_overflow: 2,
            ..EngineSettings::default()
        },
    };

    let db = Database::connect(&settings).expect("failed to connect");
    assert_eq!(db.sync_engine().pool().max_size(), 3);

    MetaData::new()
        .with_table(&PROBES)
        .create_all(db.sync_engine())
        .expect("failed to create tables");

    sqlx::query("INSERT INTO probes (label) VALUES ('from-async')")
        .execute(db.async_engine().pool())
        .await
        .expect("failed to insert through async engine");

    let conn = db.sync_engine().connection().expect("failed to get connection");
    let label: String = conn
        .query_row("SELECT label FROM probes", [], |row| row.get(0))
        .expect("failed to read through sync engine");
    assert_eq!(label, "from-async");

    let sync_version = db.sync_engine().server_version().expect("sync version");
    let async_version = db
        .async_engine()
        .server_version()
        .await
        .expect("async version");
    assert_eq!(sync_version, async_version, "both drivers link the same sqlite");
}
