use std::fs;
use std::path::Path;
use tempfile::TempDir;

use litindex_core::traits::IndexBackend;
use litindex_core::{BatchDriver, Error, FieldTreatment, OpenMode, RawRecord, RawValue, Schema};
use litindex_text::{StoreInspector, TantivyBackend};

fn scenario_schema() -> Schema {
    Schema::builder()
        .field("id", FieldTreatment::ExactStored)
        .field("title", FieldTreatment::TokenizedStored)
        .field("note", FieldTreatment::StoredOnly)
        .field("secret", FieldTreatment::ExactNotStored)
        .date("date", "date_text")
        .multi_valued("tags", "tags")
        .build()
        .expect("schema")
}

fn scenario_rows() -> Vec<RawRecord> {
    vec![
        RawRecord::new().with("id", "A").with("date", "2020").with("tags", "x y").with("title", "The Heart of Mice").with("note", "n1").with("secret", "s1"),
        RawRecord::new().with("id", "B").with("date", "2020-03-15").with("tags", RawValue::Null),
        RawRecord::new().with("id", "C").with("date", "bogus").with("tags", "z"),
    ]
}

fn run(store: &Path, rows: Vec<RawRecord>, mode: OpenMode) -> litindex_core::BatchReport {
    let backend = TantivyBackend::default();
    BatchDriver::new(&backend).run(rows, &scenario_schema(), store, mode).expect("batch")
}

#[test]
fn scenario_commits_two_documents() {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("store");
    let report = run(&store, scenario_rows(), OpenMode::Create);
    eprintln!("{}", report);
    assert_eq!((report.seen, report.indexed, report.skipped), (3, 2, 1));
    assert_eq!(report.committed, Some(2));

    let inspector = StoreInspector::open(&store).expect("inspector");
    assert_eq!(inspector.num_docs(), 2);

    let a = inspector.lookup("id", "A").expect("lookup A");
    assert_eq!(a.len(), 1);
    assert_eq!(a[0]["tags"], vec!["x", "y"]);
    assert_eq!(a[0]["date_text"], vec!["2020"]);
    assert_eq!(a[0]["title"], vec!["The Heart of Mice"]);
    assert_eq!(a[0]["note"], vec!["n1"]);
    assert!(!a[0].contains_key("secret"), "exact-not-stored fields are not retrievable");
    assert!(!a[0].contains_key("date"), "numeric points are not stored");
    assert!(!a[0].contains_key("_seq"), "sequence numbers stay internal");

    let b = inspector.lookup("id", "B").expect("lookup B");
    assert_eq!(b.len(), 1);
    assert!(!b[0].contains_key("tags"));
    assert!(inspector.lookup("id", "C").expect("lookup C").is_empty());

    assert_eq!(inspector.count_range("date", 20200101, 20200101).expect("range"), 1);
    assert_eq!(inspector.count_range("date", 20200315, 20200315).expect("range"), 1);
    assert_eq!(inspector.count_range("date", 20190101, 20211231).expect("range"), 2);
    assert_eq!(inspector.count_range("date", 20210101, 20211231).expect("range"), 0);
    assert_eq!(inspector.count_exact("secret", "s1").expect("exact"), 1);
    assert_eq!(inspector.count_exact("tags", "y").expect("exact"), 1);
}

#[test]
fn create_twice_yields_same_count() {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("store");
    let first = run(&store, scenario_rows(), OpenMode::Create);
    let second = run(&store, scenario_rows(), OpenMode::Create);
    assert_eq!(first.committed, second.committed);
    assert_eq!(StoreInspector::open(&store).unwrap().num_docs(), 2);
}

#[test]
fn append_adds_to_existing_store() {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("store");
    let created = run(&store, scenario_rows(), OpenMode::Create);
    let appended = run(&store, scenario_rows(), OpenMode::Append);
    assert!(appended.committed >= created.committed);
    assert_eq!(appended.committed, Some(4));
    assert_eq!(StoreInspector::open(&store).unwrap().lookup("id", "A").unwrap().len(), 2);
}

#[test]
fn append_to_missing_store_creates_it() {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("fresh");
    let report = run(&store, scenario_rows(), OpenMode::Append);
    assert_eq!(report.committed, Some(2));
}

#[test]
fn append_with_different_schema_is_a_mismatch() {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("store");
    run(&store, scenario_rows(), OpenMode::Create);

    let backend = TantivyBackend::default();
    let aborted = BatchDriver::new(&backend)
        .run(scenario_rows(), &Schema::publications(), &store, OpenMode::Append)
        .unwrap_err();
    assert!(matches!(aborted.source, Error::SchemaMismatch { .. }));
    assert_eq!(StoreInspector::open(&store).unwrap().num_docs(), 2, "existing content untouched");
}

#[test]
fn second_writer_on_open_store_is_refused() {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("store");
    let backend = TantivyBackend::default();
    let first = backend.open(&store, OpenMode::Create, &scenario_schema()).expect("first writer");
    let second = backend.open(&store, OpenMode::Append, &scenario_schema());
    assert!(matches!(second, Err(Error::StoreUnavailable { .. })));
    assert_eq!(first.close().expect("close"), 0);
}

#[test]
fn flush_makes_documents_visible_mid_session() {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("store");
    let backend = TantivyBackend::default();
    let schema = scenario_schema();
    let mut session = backend.open(&store, OpenMode::Create, &schema).expect("open");
    let doc = litindex_core::normalize::normalize(&RawRecord::new().with("id", "A"), &schema).expect("doc");
    session.insert(doc).expect("insert");
    assert_eq!(session.flush().expect("flush"), 1);
    assert_eq!(StoreInspector::open(&store).unwrap().num_docs(), 1);
    assert_eq!(session.close().expect("close"), 1);
}

#[test]
fn publications_schema_round_trip() {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("pubs");
    let row = RawRecord::new()
        .with("docId", "PMC42")
        .with("title", "Imaging modalities")
        .with("pub_date", "2018-11-02")
        .with("modalities", "mic exp")
        .with("num_figures", 7i64);
    let backend = TantivyBackend::default();
    let report = BatchDriver::new(&backend).run(vec![row], &Schema::publications(), &store, OpenMode::Create).expect("batch");
    assert_eq!(report.indexed, 1);

    let inspector = StoreInspector::open(&store).unwrap();
    let found = inspector.lookup("docId", "PMC42").unwrap();
    let doc = &found[0];
    assert_eq!(doc["publish"], vec!["2018-11-02"]);
    assert_eq!(doc["modality"], vec!["mic", "exp"]);
    assert_eq!(doc["num_figures"], vec!["7"]);
    assert_eq!(inspector.count_range("pub_date", 20180101, 20181231).unwrap(), 1);
}

fn numbered_doc(schema: &Schema, i: usize) -> litindex_core::Document {
    let row = RawRecord::new().with("id", format!("r{:03}", i)).with("tags", "all");
    litindex_core::normalize::normalize(&row, schema).expect("doc")
}

fn ids(docs: &[litindex_text::StoredFields]) -> Vec<String> {
    docs.iter().map(|d| d["id"][0].clone()).collect()
}

#[test]
fn insertion_order_survives_many_commits_and_append() {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("store");
    let backend = TantivyBackend::default();
    let schema = scenario_schema();

    let mut session = backend.open(&store, OpenMode::Create, &schema).expect("open");
    for i in 0..200 {
        session.insert(numbered_doc(&schema, i)).expect("insert");
        if i % 10 == 9 {
            session.flush().expect("flush");
        }
    }
    assert_eq!(session.close().expect("close"), 200);

    let mut session = backend.open(&store, OpenMode::Append, &schema).expect("reopen");
    for i in 200..250 {
        session.insert(numbered_doc(&schema, i)).expect("insert");
        if i % 7 == 0 {
            session.flush().expect("flush");
        }
    }
    assert_eq!(session.close().expect("close"), 250);

    let expected: Vec<String> = (0..250).map(|i| format!("r{:03}", i)).collect();
    let inspector = StoreInspector::open(&store).unwrap();
    assert_eq!(ids(&inspector.documents().unwrap()), expected);
    assert_eq!(ids(&inspector.lookup("tags", "all").unwrap()), expected);
}

#[test]
fn append_batches_follow_earlier_batches() {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("store");
    run(&store, scenario_rows(), OpenMode::Create);
    run(&store, vec![RawRecord::new().with("id", "D")], OpenMode::Append);
    run(&store, vec![RawRecord::new().with("id", "E")], OpenMode::Append);

    let docs = StoreInspector::open(&store).unwrap().documents().unwrap();
    assert_eq!(ids(&docs), vec!["A", "B", "D", "E"]);
}

#[test]
fn reserved_sequence_name_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let schema = Schema::builder().field("_seq", FieldTreatment::ExactStored).build().expect("schema");
    let opened = TantivyBackend::default().open(&tmp.path().join("store"), OpenMode::Create, &schema);
    assert!(matches!(opened, Err(Error::InvalidConfig(_))));
}

#[test]
fn store_path_under_a_regular_file_is_unavailable() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();
    let store = blocker.join("store");
    let backend = TantivyBackend::default();

    for mode in [OpenMode::Create, OpenMode::Append] {
        let opened = backend.open(&store, mode, &scenario_schema());
        assert!(matches!(opened, Err(Error::StoreUnavailable { .. })), "{} should be unavailable", mode);

        let aborted = BatchDriver::new(&backend).run(scenario_rows(), &scenario_schema(), &store, mode).unwrap_err();
        assert!(matches!(aborted.source, Error::StoreUnavailable { .. }));
        assert_eq!(aborted.report.seen, 0);
        assert_eq!(aborted.report.committed, None);
    }
}

#[test]
fn append_accepts_schema_with_other_column_names() {
    let tmp = TempDir::new().unwrap();
    let store = tmp.path().join("store");
    run(&store, scenario_rows(), OpenMode::Create);

    let renamed = Schema::builder()
        .renamed("identifier", "id", FieldTreatment::ExactStored)
        .field("title", FieldTreatment::TokenizedStored)
        .field("note", FieldTreatment::StoredOnly)
        .field("secret", FieldTreatment::ExactNotStored)
        .date("date", "date_text")
        .multi_valued("labels", "tags")
        .build()
        .expect("schema");
    let backend = TantivyBackend::default();
    let rows = vec![RawRecord::new().with("identifier", "D").with("labels", "q")];
    let report = BatchDriver::new(&backend).run(rows, &renamed, &store, OpenMode::Append).expect("append");
    assert_eq!(report.committed, Some(3));

    let found = StoreInspector::open(&store).unwrap().lookup("id", "D").unwrap();
    assert_eq!(found[0]["tags"], vec!["q"]);
}
