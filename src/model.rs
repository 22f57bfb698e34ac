use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, error, info, trace};

use crate::domain::{DirConfig, DirError, HELP_TEXT, Message};
use crate::editor::{EditorEvent, RecordEditor, commit};
use crate::generator::Generator;
use crate::import::import_people;
use crate::inputter::Inputter;
use crate::location::{Location, Navigation, Route};
use crate::photo::PhotoLoader;
use crate::record::{PersonRecord, RecordId};
use crate::store::RecordStore;
use crate::table::{RowAction, TableView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    Ready,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modus {
    Dashboard,
    Table,
    Record,
    Editor,
    SearchInput,
    Popup,
}

pub struct Model {
    config: DirConfig,
    pub status: AppStatus,
    modus: Modus,
    previous_modus: Modus,
    store: RecordStore,
    generator: Generator,
    navigation: Navigation,
    table: Option<TableView>, // Only mounted while the directory route is current
    detail: Option<RecordId>,
    editor: Option<RecordEditor>,
    photos: PhotoLoader,
    search_input: Inputter,
    search_before: Option<String>,
    clipboard: Option<Clipboard>,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(config: &DirConfig) -> Result<Self, DirError> {
        let mut generator = Generator::new(config.seed);
        let people = match &config.import {
            Some(path) => import_people(path, &mut generator)?,
            None => generator.people(config.seed_count),
        };
        let location = Location::parse(&config.location)?;
        info!("Starting with {} people at {location}", people.len());

        let mut model = Self {
            config: config.clone(),
            status: AppStatus::Ready,
            modus: Modus::Dashboard,
            previous_modus: Modus::Dashboard,
            store: RecordStore::from_records(people),
            generator,
            navigation: Navigation::new(location),
            table: None,
            detail: None,
            editor: None,
            photos: PhotoLoader::new(config.max_photo_bytes),
            search_input: Inputter::default(),
            search_before: None,
            clipboard: None,
            status_message: "Started pd!".to_string(),
            last_status_message_update: Instant::now(),
        };
        model.apply_route();
        Ok(model)
    }

    // -------------------- Accessors for rendering ---------------------- //

    pub fn modus(&self) -> Modus {
        self.modus
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn table(&self) -> Option<&TableView> {
        self.table.as_ref()
    }

    pub fn editor(&self) -> Option<&RecordEditor> {
        self.editor.as_ref()
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn location(&self) -> &Location {
        self.navigation.current()
    }

    pub fn detail_record(&self) -> Option<&PersonRecord> {
        self.detail.and_then(|id| self.store.find(id))
    }

    pub fn search_input(&self) -> Option<&Inputter> {
        (self.modus == Modus::SearchInput).then_some(&self.search_input)
    }

    pub fn popup_message(&self) -> Option<&'static str> {
        (self.modus == Modus::Popup).then_some(HELP_TEXT)
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn last_status_message_update(&self) -> Instant {
        self.last_status_message_update
    }

    pub fn raw_keyevents(&self) -> bool {
        matches!(self.modus, Modus::Editor | Modus::SearchInput)
    }

    /// Member counts per role, largest first.
    pub fn role_counts(&self) -> Vec<(usize, String)> {
        Self::histogram(self.store.records().iter().map(|r| r.role.label()))
    }

    /// Member counts per team, largest first. People in several teams count once per team.
    pub fn team_counts(&self) -> Vec<(usize, String)> {
        Self::histogram(
            self.store
                .records()
                .iter()
                .flat_map(|r| r.teams.iter().map(|t| t.label())),
        )
    }

    fn histogram<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<(usize, String)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for label in labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        let mut sorted: Vec<(usize, String)> =
            counts.iter().map(|(k, v)| (*v, k.to_string())).collect();
        sorted.sort_unstable();
        sorted.reverse();
        sorted
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    pub fn quit(&mut self) {
        self.status = AppStatus::Quitting;
    }

    // -------------------- Update loop ---------------------- //

    pub fn update(&mut self, message: Option<Message>) -> Result<(), DirError> {
        self.poll_photos();

        if let Some(msg) = message {
            trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);
            match self.modus {
                Modus::Dashboard => match msg {
                    Message::Quit => self.quit(),
                    Message::Help => self.show_help(),
                    Message::Enter | Message::GotoDirectory => self.goto(Route::Directory),
                    Message::Exit => self.go_back(),
                    _ => (),
                },
                Modus::Table => match msg {
                    Message::Quit => self.quit(),
                    Message::Help => self.show_help(),
                    Message::Exit => self.go_back(),
                    Message::MoveUp => self.with_table(TableView::move_up),
                    Message::MoveDown => self.with_table(TableView::move_down),
                    Message::MoveLeft => self.with_table(TableView::move_left),
                    Message::MoveRight => self.with_table(TableView::move_right),
                    Message::NextPage => self.next_page(),
                    Message::PrevPage => self.prev_page(),
                    Message::Search => self.enter_search(),
                    Message::CycleRoleFilter => self.change_filter(TableView::cycle_role_filter),
                    Message::CycleTeamFilter => self.change_filter(TableView::cycle_team_filter),
                    Message::ClearFilters => self.change_filter(TableView::clear_filters),
                    Message::ToggleSort => self.toggle_sort(),
                    Message::Enter => self.row_action(|t, s, row| t.on_row_click(s, row)),
                    Message::Edit => self.row_action(|t, s, row| t.on_edit(s, row)),
                    Message::Delete => self.row_action(|t, _, row| t.on_delete(row)),
                    Message::Add => {
                        if let Some(action) = self.table.as_ref().map(TableView::on_add) {
                            self.on_row_action(action);
                        }
                    }
                    Message::CopyEmail => self.copy_email(),
                    Message::GotoDashboard => self.goto(Route::Dashboard),
                    _ => (),
                },
                Modus::Record => match msg {
                    Message::Quit => self.quit(),
                    Message::Help => self.show_help(),
                    Message::Exit | Message::Enter => self.close_detail(),
                    Message::MoveUp | Message::MoveLeft => self.follow_detail(TableView::move_up),
                    Message::MoveDown | Message::MoveRight => {
                        self.follow_detail(TableView::move_down)
                    }
                    Message::Edit => {
                        if let Some(id) = self.detail {
                            self.on_row_action(RowAction::Edit(id));
                        }
                    }
                    Message::CopyEmail => self.copy_email(),
                    Message::GotoDashboard => self.goto(Route::Dashboard),
                    _ => (),
                },
                Modus::Editor => match msg {
                    Message::Quit => self.quit(),
                    Message::RawKey(key) => self.editor_key(key),
                    _ => (),
                },
                Modus::SearchInput => match msg {
                    Message::Quit => self.quit(),
                    Message::RawKey(key) => self.search_key(key),
                    _ => (),
                },
                Modus::Popup => match msg {
                    Message::Quit => self.quit(),
                    Message::Exit | Message::Help | Message::Enter => self.close_popup(),
                    _ => (),
                },
            }
        }

        if let Some(table) = self.table.as_mut() {
            table.refresh(&self.store);
        }
        Ok(())
    }

    // -------------------- Navigation ---------------------- //

    fn goto(&mut self, route: Route) {
        if self.navigation.current().route != route {
            self.navigation.push(Location::new(route));
            self.apply_route();
        }
    }

    fn go_back(&mut self) {
        if self.navigation.back() {
            self.apply_route();
        }
    }

    /// Mounts whatever the current location points at. The directory view is
    /// built fresh from the location's query; leaving it drops its view state.
    fn apply_route(&mut self) {
        self.detail = None;
        match self.navigation.current().route {
            Route::Dashboard => {
                self.table = None;
                self.modus = Modus::Dashboard;
            }
            Route::Directory => {
                let mut table =
                    TableView::mount(&self.navigation.current().query, self.config.page_size);
                table.derive(&self.store);
                self.table = Some(table);
                self.modus = Modus::Table;
                self.reflect_location();
            }
        }
        debug!("Now at {}", self.navigation.current());
    }

    fn reflect_location(&mut self) {
        if let Some(table) = &self.table {
            self.navigation.replace_query(table.state().to_query());
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::Popup;
    }

    fn close_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::Popup;
    }

    // -------------------- Table handling ---------------------- //

    fn with_table(&mut self, f: fn(&mut TableView)) {
        if let Some(table) = self.table.as_mut() {
            f(table);
        }
    }

    fn change_filter(&mut self, f: fn(&mut TableView)) {
        if let Some(table) = self.table.as_mut() {
            f(table);
            table.refresh(&self.store);
            let state = table.state();
            let message = format!(
                "Role: {}, Team: {}, {} matches",
                state.role.map(|r| r.label()).unwrap_or("All Roles"),
                state.team.map(|t| t.label()).unwrap_or("All Teams"),
                table.total()
            );
            self.set_status_message(message);
        }
        self.reflect_location();
    }

    fn toggle_sort(&mut self) {
        if let Some(table) = self.table.as_mut() {
            let column = table.selected_column();
            if !table.toggle_sort_selected() {
                self.set_status_message(format!("{} cannot be sorted", column.title()));
            }
        }
    }

    fn next_page(&mut self) {
        if let Some(table) = self.table.as_mut()
            && !table.next_page()
        {
            self.set_status_message("Already on the last page");
        }
    }

    fn prev_page(&mut self) {
        if let Some(table) = self.table.as_mut()
            && !table.prev_page()
        {
            self.set_status_message("Already on the first page");
        }
    }

    fn row_action(&mut self, f: impl Fn(&TableView, &RecordStore, usize) -> Option<RowAction>) {
        let action = self
            .table
            .as_ref()
            .and_then(|t| f(t, &self.store, t.curser_row()));
        match action {
            Some(action) => self.on_row_action(action),
            None => self.set_status_message("No row selected"),
        }
    }

    pub fn on_row_action(&mut self, action: RowAction) {
        debug!("Row action {action:?}");
        match action {
            RowAction::Open(id) => {
                self.detail = Some(id);
                self.modus = Modus::Record;
            }
            RowAction::Edit(id) => match self.store.find(id) {
                Some(record) => {
                    let editor = RecordEditor::edit(record);
                    self.open_editor(editor);
                }
                None => error!("Edit of unknown record {id}"),
            },
            RowAction::Add => {
                self.detail = None;
                self.modus = Modus::Table;
                self.open_editor(RecordEditor::create());
            }
            RowAction::Delete(index) => match self.store.remove(index) {
                Ok(removed) => {
                    if self.detail == Some(removed.id) {
                        self.detail = None;
                    }
                    self.set_status_message(format!("Deleted {}", removed.name));
                }
                Err(e) => {
                    error!("Delete failed: {e}");
                    self.set_status_message(e.to_string());
                }
            },
        }
        if let Some(table) = self.table.as_mut() {
            table.refresh(&self.store);
        }
    }

    fn close_detail(&mut self) {
        self.detail = None;
        self.modus = Modus::Table;
    }

    fn follow_detail(&mut self, f: fn(&mut TableView)) {
        if let Some(table) = self.table.as_mut() {
            f(table);
            if let Some(record) = table.record_at(&self.store, table.curser_row()) {
                self.detail = Some(record.id);
            }
        }
    }

    fn copy_email(&mut self) {
        let email = match self.detail_record() {
            Some(record) => Some(record.email.clone()),
            None => self.table.as_ref().and_then(|t| {
                t.record_at(&self.store, t.curser_row())
                    .map(|r| r.email.clone())
            }),
        };
        let Some(email) = email else {
            return;
        };
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => error!("Clipboard unavailable: {e:?}"),
            }
        }
        let copied = match self.clipboard.as_mut() {
            Some(clipboard) => match clipboard.set_text(email.clone()) {
                Ok(_) => true,
                Err(e) => {
                    error!("Error copying to clipboard: {e:?}");
                    false
                }
            },
            None => false,
        };
        if copied {
            self.set_status_message(format!("Copied {email}"));
        } else {
            self.set_status_message("Clipboard unavailable");
        }
    }

    // -------------------- Search input ---------------------- //

    fn enter_search(&mut self) {
        trace!("Entering search mode ...");
        let current = self.table.as_ref().and_then(|t| t.state().query.clone());
        self.search_input = Inputter::with_value(current.as_deref().unwrap_or(""));
        self.search_before = current;
        self.previous_modus = self.modus;
        self.modus = Modus::SearchInput;
    }

    fn search_key(&mut self, key: KeyEvent) {
        let result = self.search_input.read(key);
        let query = if result.canceled {
            self.search_before.take()
        } else {
            Some(result.input.clone())
        };
        if let Some(table) = self.table.as_mut() {
            table.set_query(query);
            table.refresh(&self.store);
            let total = table.total();
            if result.finished {
                self.set_status_message(format!("Found {total} results"));
            }
        }
        self.reflect_location();
        if result.finished {
            self.modus = self.previous_modus;
            self.previous_modus = Modus::SearchInput;
        }
    }

    // -------------------- Editor ---------------------- //

    fn open_editor(&mut self, editor: RecordEditor) {
        // Only one editor at a time; a replaced one is closed properly.
        if let Some(old) = self.editor.replace(editor) {
            old.close();
        }
        self.previous_modus = self.modus;
        self.modus = Modus::Editor;
    }

    fn close_editor(&mut self) {
        if let Some(editor) = self.editor.take() {
            editor.close();
        }
        self.modus = self.previous_modus;
        self.previous_modus = Modus::Editor;
    }

    fn editor_key(&mut self, key: KeyEvent) {
        let event = match self.editor.as_mut() {
            Some(editor) => editor.handle_key(key),
            None => {
                self.modus = self.previous_modus;
                return;
            }
        };
        match event {
            EditorEvent::None => {}
            EditorEvent::RemovePhoto => self.set_status_message("Photo removed"),
            EditorEvent::LoadPhoto(path) => {
                let ticket = self.photos.request(path.clone());
                if let Some(editor) = self.editor.as_mut() {
                    editor.await_photo(ticket);
                }
                self.set_status_message(format!("Loading {} ...", path.display()));
            }
            EditorEvent::Cancel => {
                self.close_editor();
                self.set_status_message("Changes discarded");
            }
            EditorEvent::Submit => self.submit_editor(),
        }
    }

    fn submit_editor(&mut self) {
        let result = match self.editor.as_mut() {
            Some(editor) => editor.submit(),
            None => return,
        };
        match result {
            Ok(c) => {
                let id = commit(c, &mut self.store, &mut self.generator);
                self.close_editor();
                let name = self
                    .store
                    .find(id)
                    .map(|r| r.name.clone())
                    .unwrap_or_default();
                info!("Saved {id} {name}");
                self.set_status_message(format!("Saved {name}"));
            }
            Err(errors) => {
                self.set_status_message(format!("Not saved: {errors}"));
            }
        }
    }

    fn poll_photos(&mut self) {
        for load in self.photos.drain() {
            let applied = match self.editor.as_mut() {
                Some(editor) => editor.accept_photo(load),
                None => {
                    debug!("Discarding photo load {} for a closed editor", load.generation);
                    false
                }
            };
            if applied {
                self.set_status_message("Photo updated");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Field;
    use crate::inputter::key;
    use crate::photo::PhotoLoad;
    use crate::record::ImageRef;
    use crate::record::Role;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn model() -> Model {
        let cfg = DirConfig::default().with_seed(42).with_seed_count(30);
        Model::init(&cfg).unwrap()
    }

    fn send(model: &mut Model, msg: Message) {
        model.update(Some(msg)).unwrap();
    }

    fn type_raw(model: &mut Model, s: &str) {
        for c in s.chars() {
            send(model, Message::RawKey(key(KeyCode::Char(c))));
        }
    }

    #[test]
    fn starts_on_the_configured_route() {
        let m = model();
        assert_eq!(m.modus(), Modus::Table);
        assert_eq!(m.location().to_string(), "/people");
        assert_eq!(m.store().len(), 30);

        let cfg = DirConfig::default().with_seed(1).with_location("/".to_string());
        let m = Model::init(&cfg).unwrap();
        assert_eq!(m.modus(), Modus::Dashboard);
        assert!(m.table().is_none());
    }

    #[test]
    fn mount_reads_filters_from_location() {
        let cfg = DirConfig::default()
            .with_seed(5)
            .with_location("/people?role=QA%20Engineer&team=Nope".to_string());
        let m = Model::init(&cfg).unwrap();
        let table = m.table().unwrap();
        assert_eq!(table.state().role, Some(Role::QaEngineer));
        assert_eq!(table.state().team, None);
        assert_eq!(m.location().to_string(), "/people?role=QA+Engineer");
    }

    #[test]
    fn filters_are_mirrored_into_the_location() {
        let mut m = model();
        let history = m.navigation().len();
        send(&mut m, Message::CycleRoleFilter);
        send(&mut m, Message::CycleTeamFilter);
        assert_eq!(
            m.location().to_string(),
            "/people?role=Product+Designer&team=Design"
        );
        send(&mut m, Message::ClearFilters);
        assert_eq!(m.location().to_string(), "/people");
        assert_eq!(m.navigation().len(), history);
    }

    #[test]
    fn search_updates_live_and_escape_restores() {
        let mut m = model();
        send(&mut m, Message::Search);
        assert!(m.raw_keyevents());
        type_raw(&mut m, "ja");
        assert_eq!(m.table().unwrap().state().query.as_deref(), Some("ja"));
        send(&mut m, Message::RawKey(key(KeyCode::Esc)));
        assert_eq!(m.modus(), Modus::Table);
        assert_eq!(m.table().unwrap().state().query, None);
        assert_eq!(m.location().to_string(), "/people");
    }

    #[test]
    fn leaving_the_directory_discards_view_state() {
        let mut m = model();
        send(&mut m, Message::CycleRoleFilter);
        send(&mut m, Message::GotoDashboard);
        assert!(m.table().is_none());
        send(&mut m, Message::GotoDirectory);
        assert_eq!(m.table().unwrap().state().role, None);
        // Going back restores the earlier entry's query.
        send(&mut m, Message::Exit);
        send(&mut m, Message::Exit);
        assert_eq!(
            m.table().unwrap().state().role,
            Some(Role::ProductDesigner)
        );
    }

    #[test]
    fn add_member_through_the_editor() {
        let mut m = model();
        send(&mut m, Message::Add);
        assert_eq!(m.modus(), Modus::Editor);
        type_raw(&mut m, "Zed Quinn");
        send(&mut m, Message::RawKey(key(KeyCode::Tab)));
        type_raw(&mut m, "zed@untitledui.com");
        send(&mut m, Message::RawKey(key(KeyCode::Tab)));
        send(&mut m, Message::RawKey(key(KeyCode::Char(' '))));
        send(&mut m, Message::RawKey(key(KeyCode::Tab)));
        send(&mut m, Message::RawKey(key(KeyCode::Char(' '))));
        let save = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        send(&mut m, Message::RawKey(save));
        assert_eq!(m.modus(), Modus::Table);
        assert_eq!(m.store().len(), 31);
        let added = m.store().records().last().unwrap();
        assert_eq!(added.name, "Zed Quinn");
        assert!(!added.nationality.is_empty());
    }

    #[test]
    fn invalid_submit_keeps_the_editor_open() {
        let mut m = model();
        send(&mut m, Message::Add);
        let save = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        send(&mut m, Message::RawKey(save));
        assert_eq!(m.modus(), Modus::Editor);
        let errors = m.editor().unwrap().errors();
        assert!(errors.get(Field::Name).is_some());
        assert!(errors.get(Field::Teams).is_some());
        assert_eq!(m.store().len(), 30);
    }

    fn request_photo(model: &mut Model, path: &str) {
        send(model, Message::RawKey(key(KeyCode::BackTab)));
        type_raw(model, path);
        send(model, Message::RawKey(key(KeyCode::Enter)));
    }

    #[test]
    fn photo_for_a_closed_editor_is_dropped() {
        let mut m = model();
        send(&mut m, Message::Add);
        request_photo(&mut m, "/does/not/exist.png");
        assert!(m.editor().unwrap().is_loading_photo());
        send(&mut m, Message::RawKey(key(KeyCode::Esc)));
        assert!(m.editor().is_none());

        // Arrives with no editor open.
        let late = || PhotoLoad {
            generation: 1,
            result: Ok(ImageRef::new("data:image/png;base64,AAAA")),
        };
        m.photos.deliver(late());
        m.update(None).unwrap();

        send(&mut m, Message::Add);
        m.photos.deliver(late());
        m.update(None).unwrap();
        assert!(m.editor().unwrap().draft().photo.is_placeholder());

        // A newer editor waiting on its own read ignores the older result too.
        request_photo(&mut m, "/does/not/exist/either.png");
        m.photos.deliver(late());
        m.update(None).unwrap();
        assert!(m.editor().unwrap().draft().photo.is_placeholder());
    }

    #[test]
    fn cancel_leaves_the_store_alone() {
        let mut m = model();
        let before = m.store().records().to_vec();
        send(&mut m, Message::Edit);
        type_raw(&mut m, "XYZ");
        send(&mut m, Message::RawKey(key(KeyCode::Esc)));
        assert!(m.editor().is_none());
        assert_eq!(m.store().records(), before.as_slice());
    }

    #[test]
    fn edit_from_detail_panel_updates_the_record() {
        let mut m = model();
        send(&mut m, Message::Enter);
        assert_eq!(m.modus(), Modus::Record);
        let id = m.detail_record().unwrap().id;
        send(&mut m, Message::Edit);
        // Name field: clear and retype.
        for _ in 0..40 {
            send(&mut m, Message::RawKey(key(KeyCode::Backspace)));
        }
        type_raw(&mut m, "Renamed Person");
        let save = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        send(&mut m, Message::RawKey(save));
        assert_eq!(m.modus(), Modus::Record);
        assert_eq!(m.detail_record().unwrap().id, id);
        assert_eq!(m.detail_record().unwrap().name, "Renamed Person");
    }

    #[test]
    fn delete_removes_the_selected_row() {
        let mut m = model();
        send(&mut m, Message::MoveDown);
        let target = m.store().get(1).unwrap().id;
        send(&mut m, Message::Delete);
        assert_eq!(m.store().len(), 29);
        assert!(m.store().find(target).is_none());
    }

    #[test]
    fn unsortable_column_reports_instead_of_sorting() {
        let mut m = model();
        send(&mut m, Message::MoveRight);
        send(&mut m, Message::MoveRight); // Role
        send(&mut m, Message::ToggleSort);
        assert_eq!(m.table().unwrap().state().sort, None);
        assert_eq!(m.status_message(), "Role cannot be sorted");
    }

    #[test]
    fn help_popup_returns_to_previous_mode() {
        let mut m = model();
        send(&mut m, Message::Help);
        assert!(m.popup_message().is_some());
        send(&mut m, Message::Exit);
        assert_eq!(m.modus(), Modus::Table);
    }

    #[test]
    fn histograms_are_sorted_by_count() {
        let m = model();
        let roles = m.role_counts();
        assert_eq!(roles.iter().map(|(c, _)| c).sum::<usize>(), 30);
        assert!(roles.windows(2).all(|w| w[0].0 >= w[1].0));
        assert!(!m.team_counts().is_empty());
    }
}
