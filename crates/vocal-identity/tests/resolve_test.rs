use vocal_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings};
use vocal_identity::{get_user, resolve_user};

fn setup() -> (tempfile::TempDir, DbPool) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("identity.db");
    let pool = create_pool(path.to_str().unwrap(), DbRuntimeSettings::default()).unwrap();
    run_migrations(&pool.get().unwrap()).unwrap();
    (dir, pool)
}

#[test]
fn same_address_different_agent_returns_first_record() {
    let (_dir, pool) = setup();
    let conn = pool.get().unwrap();

    let first = resolve_user(&conn, Some("203.0.113.7"), Some("Firefox/130")).unwrap();
    let second = resolve_user(&conn, Some("203.0.113.7"), Some("Chrome/128")).unwrap();

    assert_eq!(second, first);
    assert_eq!(second.user_agent, "Firefox/130");

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn distinct_addresses_get_distinct_records() {
    let (_dir, pool) = setup();
    let conn = pool.get().unwrap();

    resolve_user(&conn, Some("203.0.113.7"), Some("Firefox/130")).unwrap();
    resolve_user(&conn, Some("203.0.113.8"), Some("Firefox/130")).unwrap();

    assert!(get_user(&conn, "203.0.113.7").unwrap().is_some());
    assert!(get_user(&conn, "203.0.113.8").unwrap().is_some());
    assert!(get_user(&conn, "203.0.113.9").unwrap().is_none());
}

#[test]
fn address_is_trimmed_before_lookup() {
    let (_dir, pool) = setup();
    let conn = pool.get().unwrap();

    let first = resolve_user(&conn, Some("198.51.100.1"), Some("a")).unwrap();
    let again = resolve_user(&conn, Some(" 198.51.100.1 "), Some("b")).unwrap();
    assert_eq!(again, first);
}
