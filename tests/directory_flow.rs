use std::io::Write;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use peopledir::domain::{DirConfig, Message};
use peopledir::editor::ValidRecord;
use peopledir::generator::Generator;
use peopledir::location::QueryPairs;
use peopledir::model::{Modus, Model};
use peopledir::record::{ImageRef, Role, Status, Team};
use peopledir::store::RecordStore;
use peopledir::table::{TableView, ViewState};

fn person(generator: &mut Generator, name: &str, role: Role) -> peopledir::record::PersonRecord {
    generator.enrich(ValidRecord {
        name: name.to_string(),
        email: format!("{}@untitledui.com", name.to_lowercase().replace(' ', ".")),
        role,
        status: Status::Active,
        teams: vec![Team::Product],
        profile_image: ImageRef::placeholder(),
    })
}

fn key(code: KeyCode) -> Message {
    Message::RawKey(KeyEvent::new(code, KeyModifiers::NONE))
}

#[test]
fn role_filter_then_search() {
    let mut generator = Generator::new(Some(2024));
    let mut store = RecordStore::from_records(generator.people(100));
    store.add(person(&mut generator, "Jane Cooper", Role::ProductManager));
    store.add(person(&mut generator, "Mary Jane Watson", Role::ProductManager));
    store.add(person(&mut generator, "Jane Roe", Role::QaEngineer));

    let mut table = TableView::new(ViewState::new(10));
    table.set_role_filter(Some(Role::ProductManager));
    table.derive(&store);
    assert!(table.total() >= 2);
    for &idx in table.rows() {
        assert_eq!(store.records()[idx].role, Role::ProductManager);
    }
    let role_subset: Vec<usize> = table.rows().to_vec();

    table.set_query(Some("jane".to_string()));
    table.derive(&store);
    assert!(table.total() >= 2);
    for &idx in table.rows() {
        let record = &store.records()[idx];
        assert_eq!(record.role, Role::ProductManager);
        assert!(record.name.to_lowercase().contains("jane"), "{}", record.name);
        assert!(role_subset.contains(&idx));
    }
    assert!(
        !table
            .rows()
            .iter()
            .any(|&idx| store.records()[idx].name == "Jane Roe")
    );
}

#[test]
fn view_state_round_trips_through_the_location() {
    let mut table = TableView::new(ViewState::new(10));
    table.set_query(Some("jane doe".to_string()));
    table.set_team_filter(Some(Team::Marketing));
    let query = table.state().to_query();
    assert_eq!(query.to_string(), "query=jane+doe&team=Marketing");

    let mounted = TableView::mount(&QueryPairs::parse(&query.to_string()), 10);
    assert_eq!(mounted.state().query.as_deref(), Some("jane doe"));
    assert_eq!(mounted.state().team, Some(Team::Marketing));
    assert_eq!(mounted.state().role, None);
}

#[test]
fn imported_directory_is_edited_through_the_model() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(
        b"name,email,role,teams\n\
          Ada Lovelace,ada@x.com,Backend Developer,Technology\n\
          Grace Hopper,grace@x.com,QA Engineer,Technology;Product\n\
          Alan Kay,alan@x.com,UX Designer,Design\n",
    )
    .unwrap();
    let cfg = DirConfig::default()
        .with_seed(1)
        .with_import(file.path().to_path_buf())
        .with_location("/people?query=grace".to_string());
    let mut model = Model::init(&cfg).unwrap();
    assert_eq!(model.store().len(), 3);
    assert_eq!(model.table().unwrap().total(), 1);

    model.update(Some(Message::Edit)).unwrap();
    assert_eq!(model.modus(), Modus::Editor);
    // Name -> Email -> Role -> Teams -> Status
    for _ in 0..4 {
        model.update(Some(key(KeyCode::Tab))).unwrap();
    }
    model.update(Some(key(KeyCode::Right))).unwrap();
    model.update(Some(key(KeyCode::Char(' ')))).unwrap();
    let save = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
    model.update(Some(Message::RawKey(save))).unwrap();

    assert_eq!(model.modus(), Modus::Table);
    let grace = model
        .store()
        .records()
        .iter()
        .find(|r| r.email == "grace@x.com")
        .unwrap();
    assert_eq!(grace.status, Status::Inactive);
    assert_eq!(grace.teams, vec![Team::Technology, Team::Product]);

    model.update(Some(Message::ClearFilters)).unwrap();
    assert_eq!(model.table().unwrap().total(), 3);
    assert_eq!(model.location().to_string(), "/people");
}

#[test]
fn deleting_the_last_row_of_the_last_page_steps_back() {
    let cfg = DirConfig::default()
        .with_seed(9)
        .with_seed_count(11)
        .with_page_size(10);
    let mut model = Model::init(&cfg).unwrap();
    model.update(Some(Message::NextPage)).unwrap();
    assert_eq!(model.table().unwrap().page_index(), 1);
    model.update(Some(Message::Delete)).unwrap();
    let table = model.table().unwrap();
    assert_eq!(table.total(), 10);
    assert_eq!(table.page_count(), 1);
    assert_eq!(table.page_index(), 0);
    assert!(!table.can_next());
}
