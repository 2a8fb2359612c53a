use rusqlite::{params, Connection};
use sheetforge_core::db::migrations::{latest_version, schema_version};
use sheetforge_core::db::{open_db, open_db_in_memory, DbError};

fn insert_character(conn: &Connection, name: &str) -> i64 {
    conn.execute(
        "INSERT INTO characters (
            name, age, gender, residence, background,
            profession, attributes, allocated_points
        ) VALUES (?1, '30', 'male', 'Arkham', 'Drifter', 'Accountant', '{}', '{}');",
        params![name],
    )
    .unwrap();
    conn.last_insert_rowid()
}

fn column_names(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("SELECT name FROM pragma_table_info('{table}') ORDER BY cid;"))
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test]
fn fresh_database_gets_the_character_schema() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert_eq!(
        column_names(&conn, "characters"),
        vec![
            "id",
            "name",
            "age",
            "gender",
            "residence",
            "background",
            "profession",
            "attributes",
            "allocated_points",
            "created_at",
        ]
    );

    let indexed: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type = 'index' AND name = 'idx_characters_profession';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(indexed, 1);
}

#[test]
fn created_at_is_filled_by_default() {
    let conn = open_db_in_memory().unwrap();
    let id = insert_character(&conn, "Harvey Walters");

    let created_at: i64 = conn
        .query_row(
            "SELECT created_at FROM characters WHERE id = ?1;",
            [id],
            |row| row.get(0),
        )
        .unwrap();
    // 2020-01-01T00:00:00Z in milliseconds.
    assert!(created_at > 1_577_836_800_000, "created_at = {created_at}");
}

#[test]
fn ids_are_never_reused_after_a_delete() {
    let conn = open_db_in_memory().unwrap();
    let first = insert_character(&conn, "Harvey Walters");
    let second = insert_character(&conn, "Joe Diamond");
    assert!(second > first);

    conn.execute("DELETE FROM characters WHERE id = ?1;", [second])
        .unwrap();
    let third = insert_character(&conn, "Kate Ruiz");
    assert!(third > second, "id {second} was handed out again");
}

#[test]
fn reopening_a_file_keeps_saved_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheetforge.sqlite3");

    let conn = open_db(&path).unwrap();
    let id = insert_character(&conn, "Harvey Walters");
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    let name: String = conn
        .query_row("SELECT name FROM characters WHERE id = ?1;", [id], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(name, "Harvey Walters");
}

#[test]
fn database_from_a_newer_build_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.pragma_update(None, "user_version", latest_version() + 1)
        .unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, latest_version() + 1);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}
