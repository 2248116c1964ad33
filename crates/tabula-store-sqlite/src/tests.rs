//! Integration tests for `SqliteStore` against an in-memory database.

use tabula_core::{
  join::{JoinCondition, JoinRequest},
  row::{Row, RowUpdate, Value},
  schema::ColumnType,
  store::{ClassifyError, Database},
};

use crate::{Error, SqliteStore};

const FIXTURE: &str = "
CREATE TABLE courses (courseid INTEGER, title TEXT, credits REAL);
CREATE TABLE profs (profid INTEGER, profname TEXT);
CREATE TABLE coursesprofs (courseid INTEGER, profid INTEGER);

INSERT INTO courses VALUES (1, 'Compilers', 1.0), (2, 'Databases', 0.5);
INSERT INTO profs VALUES (10, 'Knuth'), (20, 'Codd');
INSERT INTO coursesprofs VALUES (1, 10), (2, 20);
";

async fn store() -> SqliteStore {
  let s = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  s.execute_batch(FIXTURE).await.expect("fixture");
  s
}

fn row(cells: &[(&str, Value)]) -> Row {
  cells.iter().cloned().collect()
}

fn cond(lt: &str, lc: &str, rt: &str, rc: &str) -> JoinCondition {
  JoinCondition {
    left_table:   lt.into(),
    left_column:  lc.into(),
    right_table:  rt.into(),
    right_column: rc.into(),
  }
}

const FILES: &str = "
CREATE TABLE files (id INTEGER, data BLOB);
INSERT INTO files VALUES (1, x'DEAD'), (2, x'BEEF');
";

async fn files_store() -> SqliteStore {
  let s = store().await;
  s.execute_batch(FILES).await.expect("files fixture");
  s
}

// ─── Opening ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn open_refuses_a_missing_file() {
  let path = std::env::temp_dir().join(format!(
    "tabula-missing-{}.sqlite",
    std::process::id()
  ));
  assert!(!path.exists());

  assert!(SqliteStore::open(&path).await.is_err());
  assert!(!path.exists(), "open must not create {path:?}");
}

// ─── Catalogue ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_tables_in_creation_order() {
  let s = store().await;
  assert_eq!(
    s.list_tables().await.unwrap(),
    ["courses", "profs", "coursesprofs"]
  );
}

#[tokio::test]
async fn list_columns_covers_every_table() {
  let s = store().await;
  let columns = s.list_columns().await.unwrap();
  assert_eq!(columns.len(), 3);
  assert_eq!(columns["courses"], ["courseid", "title", "credits"]);
  assert_eq!(columns["profs"], ["profid", "profname"]);
}

// ─── Fetch ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_table_returns_columns_types_and_rows() {
  let s = store().await;
  let data = s.fetch_table("courses").await.unwrap();

  assert_eq!(data.columns, ["courseid", "title", "credits"]);
  assert_eq!(data.types["courseid"], ColumnType::Integer);
  assert_eq!(data.types["title"], ColumnType::Text);
  assert_eq!(data.types["credits"], ColumnType::Real);
  assert_eq!(data.data.len(), 2);
  assert_eq!(
    data.data[0],
    row(&[
      ("courseid", Value::Integer(1)),
      ("title", Value::Text("Compilers".into())),
      ("credits", Value::Real(1.0)),
    ])
  );
}

#[tokio::test]
async fn fetch_unknown_table_is_invalid_request() {
  let s = store().await;
  let err = s.fetch_table("nope").await.unwrap_err();
  assert!(matches!(err, Error::InvalidTable(ref t) if t == "nope"));
  assert!(err.is_invalid_request());
}

#[tokio::test]
async fn fetch_table_reads_blobs_as_base64() {
  let s = store().await;
  s.execute_batch("CREATE TABLE files (data BLOB); INSERT INTO files VALUES (x'DEAD');")
    .await
    .unwrap();
  let data = s.fetch_table("files").await.unwrap();
  assert_eq!(data.data[0].get("data"), Some(&Value::Text("3q0=".into())));
}

#[tokio::test]
async fn table_data_serialises_with_columns_data_and_types() {
  let s = store().await;
  let json = serde_json::to_value(s.fetch_table("profs").await.unwrap()).unwrap();
  assert_eq!(
    json,
    serde_json::json!({
      "columns": ["profid", "profname"],
      "data": [
        { "profid": 10, "profname": "Knuth" },
        { "profid": 20, "profname": "Codd" },
      ],
      "types": { "profid": "INTEGER", "profname": "TEXT" },
    })
  );
}

// ─── Insert ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_row_appends() {
  let s = store().await;
  s.insert_row(
    "profs",
    &row(&[("profid", Value::Integer(30)), ("profname", "Hopper".into())]),
  )
  .await
  .unwrap();

  let data = s.fetch_table("profs").await.unwrap();
  assert_eq!(data.data.len(), 3);
  assert_eq!(data.data[2].get("profname"), Some(&Value::Text("Hopper".into())));
}

#[tokio::test]
async fn insert_row_requires_every_column() {
  let s = store().await;
  let err = s
    .insert_row("profs", &row(&[("profid", Value::Integer(30))]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::BadFields { .. }), "{err}");
  assert!(err.is_invalid_request());
}

#[tokio::test]
async fn insert_row_rejects_unknown_columns() {
  let s = store().await;
  let err = s
    .insert_row(
      "profs",
      &row(&[("profid", Value::Integer(30)), ("nickname", "Grace".into())]),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::BadFields { .. }), "{err}");
}

// ─── Update / delete ─────────────────────────────────────────────────────────

#[tokio::test]
async fn update_row_matches_on_full_identifier_snapshot() {
  let s = store().await;
  let original = s.fetch_table("courses").await.unwrap().data[1].clone();

  s.update_row(
    "courses",
    &RowUpdate {
      values:      row(&[
        ("courseid", Value::Integer(2)),
        ("title", "Relational Databases".into()),
        ("credits", Value::Real(0.5)),
      ]),
      identifiers: original,
    },
  )
  .await
  .unwrap();

  let data = s.fetch_table("courses").await.unwrap();
  assert_eq!(
    data.data[1].get("title"),
    Some(&Value::Text("Relational Databases".into()))
  );
  assert_eq!(
    data.data[0].get("title"),
    Some(&Value::Text("Compilers".into()))
  );
}

#[tokio::test]
async fn update_row_matches_null_identifiers() {
  let s = store().await;
  s.execute_batch("INSERT INTO profs VALUES (30, NULL);").await.unwrap();

  s.update_row(
    "profs",
    &RowUpdate {
      values:      row(&[("profname", "Liskov".into())]),
      identifiers: row(&[("profid", Value::Integer(30)), ("profname", Value::Null)]),
    },
  )
  .await
  .unwrap();

  let data = s.fetch_table("profs").await.unwrap();
  assert_eq!(data.data[2].get("profname"), Some(&Value::Text("Liskov".into())));
}

#[tokio::test]
async fn update_row_without_identifiers_is_rejected() {
  let s = store().await;
  let err = s
    .update_row(
      "profs",
      &RowUpdate {
        values:      row(&[("profname", "Everyone".into())]),
        identifiers: Row::default(),
      },
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::BadFields { .. }), "{err}");
}

#[tokio::test]
async fn delete_row_removes_only_the_matching_row() {
  let s = store().await;
  s.delete_row(
    "profs",
    &row(&[("profid", Value::Integer(10)), ("profname", "Knuth".into())]),
  )
  .await
  .unwrap();

  let data = s.fetch_table("profs").await.unwrap();
  assert_eq!(data.data.len(), 1);
  assert_eq!(data.data[0].get("profid"), Some(&Value::Integer(20)));
}

// ─── Blob columns ────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_row_matches_blob_cells_of_the_fetched_snapshot() {
  let s = files_store().await;
  let fetched = s.fetch_table("files").await.unwrap().data[0].clone();

  s.delete_row("files", &fetched).await.unwrap();

  let data = s.fetch_table("files").await.unwrap();
  assert_eq!(data.data.len(), 1);
  assert_eq!(data.data[0].get("id"), Some(&Value::Integer(2)));
}

#[tokio::test]
async fn update_row_keeps_blob_cells_as_blobs() {
  let s = files_store().await;
  let fetched = s.fetch_table("files").await.unwrap().data[1].clone();

  s.update_row(
    "files",
    &RowUpdate {
      values:      row(&[("id", Value::Integer(3)), ("data", "vu8=".into())]),
      identifiers: fetched,
    },
  )
  .await
  .unwrap();

  let updated = s.fetch_table("files").await.unwrap().data[1].clone();
  assert_eq!(updated.get("id"), Some(&Value::Integer(3)));
  assert_eq!(updated.get("data"), Some(&Value::Text("vu8=".into())));

  // Only a real blob is matched by its base64 snapshot, so this delete proves
  // the update wrote bytes rather than text.
  s.delete_row("files", &updated).await.unwrap();
  assert_eq!(s.fetch_table("files").await.unwrap().data.len(), 1);
}

#[tokio::test]
async fn insert_row_decodes_base64_into_blob_columns() {
  let s = files_store().await;
  let new = row(&[("id", Value::Integer(4)), ("data", "AQI=".into())]);
  s.insert_row("files", &new).await.unwrap();

  let data = s.fetch_table("files").await.unwrap();
  assert_eq!(data.data[2], new);
  s.delete_row("files", &new).await.unwrap();
  assert_eq!(s.fetch_table("files").await.unwrap().data.len(), 2);
}

#[tokio::test]
async fn non_base64_text_for_a_blob_column_is_rejected() {
  let s = files_store().await;
  let fetched = s.fetch_table("files").await.unwrap().data[0].clone();
  let err = s
    .update_row(
      "files",
      &RowUpdate {
        values:      row(&[("data", "plain text".into())]),
        identifiers: fetched,
      },
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::BadFields { .. }), "{err}");
  assert!(err.is_invalid_request());

  let data = s.fetch_table("files").await.unwrap();
  assert_eq!(data.data[0].get("data"), Some(&Value::Text("3q0=".into())));
}

// ─── Join ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn join_chains_secondary_tables_in_order() {
  let s = store().await;
  let request = JoinRequest {
    primary_table:    "courses".into(),
    secondary_tables: vec!["coursesprofs".into(), "profs".into()],
    clauses:          vec![
      vec![cond("courses", "courseid", "coursesprofs", "courseid")],
      vec![cond("coursesprofs", "profid", "profs", "profid")],
    ],
  };

  let rows = s.join(&request).await.unwrap();
  assert_eq!(rows.len(), 2);
  assert_eq!(
    rows[0].columns().collect::<Vec<_>>(),
    ["courseid", "title", "credits", "profid", "profname"]
  );
  let mut names: Vec<String> = rows
    .iter()
    .filter_map(|r| r.get("profname"))
    .map(Value::to_string)
    .collect();
  names.sort();
  assert_eq!(names, ["Codd", "Knuth"]);
}

#[tokio::test]
async fn join_keys_clashing_columns_by_table() {
  let s = store().await;
  s.execute_batch(
    "CREATE TABLE rooms (courseid INTEGER, title TEXT);
     INSERT INTO rooms VALUES (1, 'Room 101');",
  )
  .await
  .unwrap();

  let request = JoinRequest {
    primary_table:    "courses".into(),
    secondary_tables: vec!["rooms".into()],
    clauses:          vec![vec![cond("courses", "courseid", "rooms", "courseid")]],
  };
  let rows = s.join(&request).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].get("title"), Some(&Value::Text("Compilers".into())));
  assert_eq!(rows[0].get("rooms.title"), Some(&Value::Text("Room 101".into())));
  assert!(!rows[0].contains("rooms.courseid"));
}

#[tokio::test]
async fn join_ands_conditions_within_a_group() {
  let s = store().await;
  let request = JoinRequest {
    primary_table:    "courses".into(),
    secondary_tables: vec!["coursesprofs".into()],
    clauses:          vec![vec![
      cond("courses", "courseid", "coursesprofs", "courseid"),
      cond("coursesprofs", "profid", "coursesprofs", "profid"),
    ]],
  };
  assert_eq!(s.join(&request).await.unwrap().len(), 2);
}

#[tokio::test]
async fn join_rejects_unknown_column() {
  let s = store().await;
  let request = JoinRequest {
    primary_table:    "courses".into(),
    secondary_tables: vec!["profs".into()],
    clauses:          vec![vec![cond("courses", "nope", "profs", "profid")]],
  };
  let err = s.join(&request).await.unwrap_err();
  assert!(err.is_invalid_request(), "{err}");
}

#[tokio::test]
async fn join_rejects_mismatched_group_count() {
  let s = store().await;
  let request = JoinRequest {
    primary_table:    "courses".into(),
    secondary_tables: vec!["profs".into(), "coursesprofs".into()],
    clauses:          vec![vec![cond("courses", "courseid", "coursesprofs", "courseid")]],
  };
  let err = s.join(&request).await.unwrap_err();
  assert!(matches!(err, Error::Core(_)), "{err}");
}
