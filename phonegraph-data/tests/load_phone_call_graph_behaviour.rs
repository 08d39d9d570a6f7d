//! Behavioural tests for loading the phone-call graph into SQLite.

use phonegraph_core::{Job, RecordKind, TransactionPolicy};
use phonegraph_data::{LoadError, LoadPlan, LoadReport, SqliteSession};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;

mod support;

use support::{Scratch, compress_fixture, count_rows, fixtures_dir};

type Outcome = Result<LoadReport, LoadError>;

#[fixture]
fn scratch() -> Scratch {
    Scratch::new()
}

#[fixture]
fn jobs() -> RefCell<Option<Vec<Job>>> {
    RefCell::new(None)
}

#[fixture]
fn graph() -> RefCell<Option<SqliteSession>> {
    RefCell::new(None)
}

#[fixture]
fn outcome() -> RefCell<Option<Outcome>> {
    RefCell::new(None)
}

#[given("the sample phone-call sources")]
fn sample_sources(#[from(jobs)] cell: &RefCell<Option<Vec<Job>>>) {
    *cell.borrow_mut() = Some(Job::phone_call_graph(&fixtures_dir()));
}

#[given("the sample phone-call sources compressed with bzip2")]
fn compressed_sources(scratch: &Scratch, #[from(jobs)] cell: &RefCell<Option<Vec<Job>>>) {
    let jobs = RecordKind::LOAD_ORDER
        .into_iter()
        .map(|kind| Job::new(compress_fixture(scratch.path(), kind.file_name()), kind))
        .collect();
    *cell.borrow_mut() = Some(jobs);
}

#[given("the sample phone-call sources with contracts ahead of people")]
fn misordered_sources(#[from(jobs)] cell: &RefCell<Option<Vec<Job>>>) {
    let dir = fixtures_dir();
    let order = [RecordKind::Company, RecordKind::Contract, RecordKind::Person];
    let jobs = order
        .into_iter()
        .map(|kind| Job::new(dir.join(kind.file_name()), kind))
        .collect();
    *cell.borrow_mut() = Some(jobs);
}

#[given("an empty graph database")]
fn empty_graph(scratch: &Scratch, #[from(graph)] cell: &RefCell<Option<SqliteSession>>) {
    let path = scratch.path().join("graph/phone_calls.db");
    let session = SqliteSession::open(&path)
        .unwrap_or_else(|err| panic!("failed to open {path}: {err}"));
    *cell.borrow_mut() = Some(session);
}

#[when("I load the phone-call graph")]
fn load_graph(
    #[from(jobs)] jobs_cell: &RefCell<Option<Vec<Job>>>,
    #[from(graph)] graph_cell: &RefCell<Option<SqliteSession>>,
    #[from(outcome)] outcome_cell: &RefCell<Option<Outcome>>,
) {
    let jobs = jobs_cell
        .borrow()
        .clone()
        .unwrap_or_else(|| panic!("jobs must be prepared"));
    let mut graph = graph_cell.borrow_mut();
    let session = graph
        .as_mut()
        .unwrap_or_else(|| panic!("graph database must be open"));
    let result = LoadPlan::new(jobs, TransactionPolicy::PerJob).run(session);
    *outcome_cell.borrow_mut() = Some(result);
}

fn with_graph<T>(cell: &RefCell<Option<SqliteSession>>, check: impl FnOnce(&SqliteSession) -> T) -> T {
    let graph = cell.borrow();
    let session = graph
        .as_ref()
        .unwrap_or_else(|| panic!("graph database must be open"));
    check(session)
}

#[then("the graph holds every sample company, person, contract and call")]
fn holds_sample(
    #[from(graph)] graph_cell: &RefCell<Option<SqliteSession>>,
    #[from(outcome)] outcome_cell: &RefCell<Option<Outcome>>,
) {
    match outcome_cell.borrow().as_ref() {
        Some(Ok(report)) => assert_eq!(report.total_records(), 11),
        other => panic!("expected a successful load, got {other:?}"),
    }
    with_graph(graph_cell, |session| {
        assert_eq!(count_rows(session, "company"), 2);
        assert_eq!(count_rows(session, "person"), 4);
        assert_eq!(count_rows(session, "contract"), 2);
        assert_eq!(count_rows(session, "call"), 3);
    });
}

#[then("Melli Winchcum is a customer of Telecom")]
fn melli_is_customer(#[from(graph)] cell: &RefCell<Option<SqliteSession>>) {
    with_graph(cell, |session| {
        let provider: String = session
            .connection()
            .query_row(
                "SELECT company.name FROM contract
                    JOIN company ON company.id = contract.provider
                    JOIN person ON person.id = contract.customer
                    WHERE person.first_name = 'Melli' AND person.is_customer = 1",
                [],
                |row| row.get(0),
            )
            .unwrap_or_else(|err| panic!("failed to query contract: {err}"));
        assert_eq!(provider, "Telecom");
    });
}

#[then("the load fails while loading contracts")]
fn fails_on_contracts(#[from(outcome)] cell: &RefCell<Option<Outcome>>) {
    match cell.borrow().as_ref() {
        Some(Err(LoadError::Store { path, .. })) => {
            assert!(path.ends_with("contracts.xml"), "unexpected path {path}");
        }
        other => panic!("expected a store failure, got {other:?}"),
    }
}

#[then("no contract or person is stored")]
fn nothing_after_failure(#[from(graph)] cell: &RefCell<Option<SqliteSession>>) {
    with_graph(cell, |session| {
        assert_eq!(count_rows(session, "contract"), 0);
        assert_eq!(count_rows(session, "person"), 0);
        assert_eq!(count_rows(session, "company"), 2);
    });
}

#[scenario(path = "tests/features/load_phone_call_graph.feature", index = 0)]
fn sample_graph_loads(
    scratch: Scratch,
    jobs: RefCell<Option<Vec<Job>>>,
    graph: RefCell<Option<SqliteSession>>,
    outcome: RefCell<Option<Outcome>>,
) {
    let _ = (scratch, jobs, graph, outcome);
}

#[scenario(path = "tests/features/load_phone_call_graph.feature", index = 1)]
fn compressed_graph_loads(
    scratch: Scratch,
    jobs: RefCell<Option<Vec<Job>>>,
    graph: RefCell<Option<SqliteSession>>,
    outcome: RefCell<Option<Outcome>>,
) {
    let _ = (scratch, jobs, graph, outcome);
}

#[scenario(path = "tests/features/load_phone_call_graph.feature", index = 2)]
fn misordered_graph_fails(
    scratch: Scratch,
    jobs: RefCell<Option<Vec<Job>>>,
    graph: RefCell<Option<SqliteSession>>,
    outcome: RefCell<Option<Outcome>>,
) {
    let _ = (scratch, jobs, graph, outcome);
}
