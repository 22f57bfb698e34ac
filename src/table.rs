//! Filtered, sorted and paginated projection of the record store.

use std::sync::Arc;

use derive_setters::Setters;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::location::QueryPairs;
use crate::record::{PersonRecord, RecordId, Role, Team};
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Profile,
    Name,
    Status,
    Role,
    Email,
    Teams,
    Actions,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::Profile,
        Column::Name,
        Column::Status,
        Column::Role,
        Column::Email,
        Column::Teams,
        Column::Actions,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Column::Profile => "Profile",
            Column::Name => "Name",
            Column::Status => "Status",
            Column::Role => "Role",
            Column::Email => "Email",
            Column::Teams => "Teams",
            Column::Actions => "Actions",
        }
    }

    pub fn is_sortable(&self) -> bool {
        matches!(self, Column::Name | Column::Status)
    }

    /// Rendered text of the cell, as searched and sorted.
    pub fn text(&self, record: &PersonRecord) -> String {
        match self {
            Column::Profile => record.profile_image.describe(),
            Column::Name => record.name.clone(),
            Column::Status => record.status.label().to_string(),
            Column::Role => record.role.label().to_string(),
            Column::Email => record.email.clone(),
            Column::Teams => record.teams_label(),
            Column::Actions => String::new(),
        }
    }
}

/// Columns the global search looks at.
pub const SEARCH_COLUMNS: [Column; 4] = [Column::Name, Column::Role, Column::Email, Column::Teams];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: Column,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Setters)]
#[setters(prefix = "with_", strip_option)]
pub struct ViewState {
    pub query: Option<String>,
    pub role: Option<Role>,
    pub team: Option<Team>,
    pub sort: Option<SortSpec>,
    pub page_index: usize,
    pub page_size: usize,
}

impl ViewState {
    pub fn new(page_size: usize) -> Self {
        Self {
            query: None,
            role: None,
            team: None,
            sort: None,
            page_index: 0,
            page_size: page_size.max(1),
        }
    }

    /// Rebuilds the primitives found in a location query. Unknown labels are dropped.
    pub fn from_query(query: &QueryPairs, page_size: usize) -> Self {
        let mut state = Self::new(page_size);
        state.query = query
            .get("query")
            .filter(|q| !q.is_empty())
            .map(str::to_string);
        state.role = query.get("role").and_then(|r| match r.parse() {
            Ok(role) => Some(role),
            Err(e) => {
                debug!("Ignoring role from location: {e}");
                None
            }
        });
        state.team = query.get("team").and_then(|t| match t.parse() {
            Ok(team) => Some(team),
            Err(e) => {
                debug!("Ignoring team from location: {e}");
                None
            }
        });
        state
    }

    /// `query`, `role`, `team` in that order; unset values are left out.
    pub fn to_query(&self) -> QueryPairs {
        let mut pairs = QueryPairs::default();
        if let Some(q) = &self.query {
            pairs.push("query", q);
        }
        if let Some(role) = self.role {
            pairs.push("role", role.label());
        }
        if let Some(team) = self.team {
            pairs.push("team", team.label());
        }
        pairs
    }
}

/// What a row action asks the container to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit(RecordId),
    Delete(usize),
    Open(RecordId),
    Add,
}

pub struct TableView {
    state: ViewState,
    rows: Arc<Vec<usize>>, // Mapping of view row index to store index, over all pages.
    revision: Option<u64>,  // Store revision the rows were derived from.
    curser_row: usize,      // Row within the current page
    curser_column: usize,
}

impl TableView {
    pub fn new(state: ViewState) -> Self {
        Self {
            state,
            rows: Arc::new(Vec::new()),
            revision: None,
            curser_row: 0,
            curser_column: 1,
        }
    }

    pub fn mount(query: &QueryPairs, page_size: usize) -> Self {
        let state = ViewState::from_query(query, page_size);
        debug!("Mounting table view with {:?}", state);
        Self::new(state)
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn is_stale(&self, store: &RecordStore) -> bool {
        self.revision != Some(store.revision())
    }

    pub fn refresh(&mut self, store: &RecordStore) {
        if self.is_stale(store) {
            self.derive(store);
        }
    }

    /// Runs filter, search and sort over the store, then clamps the page.
    pub fn derive(&mut self, store: &RecordStore) {
        let records = store.records();
        let filtered = Self::filter_rows(records, self.state.role, self.state.team);
        let searched = match &self.state.query {
            Some(q) => Self::search_rows(records, &filtered, q),
            None => filtered,
        };
        let sorted = match self.state.sort {
            Some(spec) => Self::sort_rows(records, searched, spec),
            None => searched,
        };
        trace!(
            "Derived {} of {} rows (rev {})",
            sorted.len(),
            records.len(),
            store.revision()
        );
        self.rows = Arc::new(sorted);
        self.revision = Some(store.revision());

        let last_page = self.page_count().saturating_sub(1);
        if self.state.page_index > last_page {
            self.state.page_index = last_page;
        }
        self.clamp_curser();
    }

    pub fn filter_rows(records: &[PersonRecord], role: Option<Role>, team: Option<Team>) -> Vec<usize> {
        records
            .iter()
            .enumerate()
            .filter(|(_, r)| role.is_none_or(|role| r.role == role))
            .filter(|(_, r)| team.is_none_or(|team| r.teams.contains(&team)))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Keeps the rows where `query` is a case-insensitive substring of a searchable column.
    pub fn search_rows(records: &[PersonRecord], mask: &[usize], query: &str) -> Vec<usize> {
        let needle = query.to_lowercase();
        mask.par_iter()
            .copied()
            .filter(|&idx| {
                SEARCH_COLUMNS
                    .iter()
                    .any(|c| c.text(&records[idx]).to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn sort_rows(records: &[PersonRecord], mut rows: Vec<usize>, spec: SortSpec) -> Vec<usize> {
        if !spec.column.is_sortable() {
            return rows;
        }
        rows.sort_by(|&a, &b| {
            let ord = Self::sort_key(spec.column, &records[a])
                .cmp(&Self::sort_key(spec.column, &records[b]));
            match spec.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
        rows
    }

    /// Text ordering ignores case; the raw text only breaks ties.
    pub fn sort_key(column: Column, record: &PersonRecord) -> (String, String) {
        let text = column.text(record);
        (text.to_lowercase(), text)
    }

    // -------------------- View state transitions ---------------------- //

    fn invalidate(&mut self) {
        self.revision = None;
        self.state.page_index = 0;
        self.curser_row = 0;
    }

    pub fn set_query(&mut self, query: Option<String>) {
        let query = query.filter(|q| !q.is_empty());
        if query != self.state.query {
            self.state.query = query;
            self.invalidate();
        }
    }

    pub fn set_role_filter(&mut self, role: Option<Role>) {
        if role != self.state.role {
            self.state.role = role;
            self.invalidate();
        }
    }

    pub fn set_team_filter(&mut self, team: Option<Team>) {
        if team != self.state.team {
            self.state.team = team;
            self.invalidate();
        }
    }

    pub fn cycle_role_filter(&mut self) {
        self.set_role_filter(Self::next_option(Role::ALL, self.state.role));
    }

    pub fn cycle_team_filter(&mut self) {
        self.set_team_filter(Self::next_option(Team::ALL, self.state.team));
    }

    fn next_option<T: Copy + PartialEq>(all: &[T], current: Option<T>) -> Option<T> {
        match current.and_then(|c| all.iter().position(|&o| o == c)) {
            None => all.first().copied(),
            Some(pos) => all.get(pos + 1).copied(),
        }
    }

    pub fn clear_filters(&mut self) {
        self.set_query(None);
        self.set_role_filter(None);
        self.set_team_filter(None);
    }

    /// Unsorted → ascending → descending → unsorted. A new column replaces the old sort.
    /// Returns false when the column cannot be sorted.
    pub fn toggle_sort(&mut self, column: Column) -> bool {
        if !column.is_sortable() {
            trace!("Column {} is not sortable", column.title());
            return false;
        }
        self.state.sort = match self.state.sort {
            Some(SortSpec {
                column: c,
                direction: SortDirection::Ascending,
            }) if c == column => Some(SortSpec {
                column,
                direction: SortDirection::Descending,
            }),
            Some(SortSpec {
                column: c,
                direction: SortDirection::Descending,
            }) if c == column => None,
            _ => Some(SortSpec {
                column,
                direction: SortDirection::Ascending,
            }),
        };
        self.revision = None;
        true
    }

    pub fn toggle_sort_selected(&mut self) -> bool {
        self.toggle_sort(self.selected_column())
    }

    // -------------------- Pagination ---------------------- //

    pub fn total(&self) -> usize {
        self.rows.len()
    }

    pub fn page_index(&self) -> usize {
        self.state.page_index
    }

    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.state.page_size)
    }

    pub fn can_prev(&self) -> bool {
        self.state.page_index > 0
    }

    pub fn can_next(&self) -> bool {
        (self.state.page_index + 1) * self.state.page_size < self.rows.len()
    }

    pub fn next_page(&mut self) -> bool {
        if self.can_next() {
            self.state.page_index += 1;
            self.clamp_curser();
            true
        } else {
            false
        }
    }

    pub fn prev_page(&mut self) -> bool {
        if self.can_prev() {
            self.state.page_index -= 1;
            self.clamp_curser();
            true
        } else {
            false
        }
    }

    /// Store indices of the rows on the current page.
    pub fn page_rows(&self) -> &[usize] {
        let begin = std::cmp::min(self.state.page_index * self.state.page_size, self.rows.len());
        let end = std::cmp::min(begin + self.state.page_size, self.rows.len());
        &self.rows[begin..end]
    }

    pub fn store_index(&self, page_row: usize) -> Option<usize> {
        self.page_rows().get(page_row).copied()
    }

    // -------------------- Cursor ---------------------- //

    pub fn curser_row(&self) -> usize {
        self.curser_row
    }

    pub fn curser_column(&self) -> usize {
        self.curser_column
    }

    pub fn selected_column(&self) -> Column {
        Column::ALL[self.curser_column]
    }

    fn clamp_curser(&mut self) {
        let visible = self.page_rows().len();
        self.curser_row = std::cmp::min(self.curser_row, visible.saturating_sub(1));
    }

    pub fn move_up(&mut self) {
        if self.curser_row > 0 {
            self.curser_row -= 1;
        } else if self.prev_page() {
            self.curser_row = self.page_rows().len().saturating_sub(1);
        }
    }

    pub fn move_down(&mut self) {
        if self.curser_row + 1 < self.page_rows().len() {
            self.curser_row += 1;
        } else if self.next_page() {
            self.curser_row = 0;
        }
    }

    pub fn move_left(&mut self) {
        self.curser_column = self.curser_column.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.curser_column + 1 < Column::ALL.len() {
            self.curser_column += 1;
        }
    }

    // -------------------- Row actions ---------------------- //

    pub fn on_edit(&self, store: &RecordStore, page_row: usize) -> Option<RowAction> {
        self.record_at(store, page_row).map(|r| RowAction::Edit(r.id))
    }

    pub fn on_delete(&self, page_row: usize) -> Option<RowAction> {
        self.store_index(page_row).map(RowAction::Delete)
    }

    pub fn on_row_click(&self, store: &RecordStore, page_row: usize) -> Option<RowAction> {
        self.record_at(store, page_row).map(|r| RowAction::Open(r.id))
    }

    pub fn on_add(&self) -> RowAction {
        RowAction::Add
    }

    pub fn record_at<'a>(&self, store: &'a RecordStore, page_row: usize) -> Option<&'a PersonRecord> {
        self.store_index(page_row).and_then(|idx| store.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sample;

    fn store() -> RecordStore {
        RecordStore::from_records([
            sample("Jane Doe", "jane@x.com", Role::ProductManager, &[Team::Product]),
            sample("Bob Stone", "bob@x.com", Role::ProductManager, &[Team::Design]),
            sample("Alma Jansen", "alma@x.com", Role::FrontendDeveloper, &[Team::Technology]),
            sample("Carl Berg", "carl@x.com", Role::ProductManager, &[Team::Product, Team::Marketing]),
            sample("Mary Jane", "mary@x.com", Role::QaEngineer, &[Team::Technology]),
        ])
    }

    fn names(table: &TableView, store: &RecordStore) -> Vec<String> {
        table
            .rows()
            .iter()
            .map(|&i| store.get(i).unwrap().name.clone())
            .collect()
    }

    #[test]
    fn role_and_team_filters_combine() {
        let store = store();
        let mut table = TableView::new(ViewState::new(10));
        table.set_role_filter(Some(Role::ProductManager));
        table.set_team_filter(Some(Team::Product));
        table.derive(&store);
        assert_eq!(names(&table, &store), vec!["Jane Doe", "Carl Berg"]);
    }

    #[test]
    fn search_runs_after_filter_and_ignores_case() {
        let store = store();
        let mut table = TableView::new(ViewState::new(10));
        table.set_query(Some("JANE".into()));
        table.derive(&store);
        assert_eq!(names(&table, &store), vec!["Jane Doe", "Mary Jane"]);

        table.set_role_filter(Some(Role::ProductManager));
        table.derive(&store);
        assert_eq!(names(&table, &store), vec!["Jane Doe"]);
    }

    #[test]
    fn search_reaches_teams_column() {
        let store = store();
        let mut table = TableView::new(ViewState::new(10));
        table.set_query(Some("marketing".into()));
        table.derive(&store);
        assert_eq!(names(&table, &store), vec!["Carl Berg"]);
    }

    #[test]
    fn sort_cycles_back_to_insertion_order() {
        let store = store();
        let mut table = TableView::new(ViewState::new(10));
        table.derive(&store);
        let original = names(&table, &store);

        assert!(table.toggle_sort(Column::Name));
        table.derive(&store);
        assert_eq!(names(&table, &store)[0], "Alma Jansen");

        table.toggle_sort(Column::Name);
        table.derive(&store);
        assert_eq!(names(&table, &store)[0], "Mary Jane");

        table.toggle_sort(Column::Name);
        table.derive(&store);
        assert_eq!(table.state().sort, None);
        assert_eq!(names(&table, &store), original);
    }

    #[test]
    fn name_sort_ignores_case() {
        let store = RecordStore::from_records([
            sample("Zed Quinn", "zed@x.com", Role::QaEngineer, &[Team::Design]),
            sample("alice smith", "alice@x.com", Role::QaEngineer, &[Team::Design]),
            sample("Bob Stone", "bob@x.com", Role::QaEngineer, &[Team::Design]),
            sample("Alice Smith", "alice.s@x.com", Role::QaEngineer, &[Team::Design]),
        ]);
        let mut table = TableView::new(ViewState::new(10));
        table.toggle_sort(Column::Name);
        table.derive(&store);
        assert_eq!(
            names(&table, &store),
            vec!["Alice Smith", "alice smith", "Bob Stone", "Zed Quinn"]
        );

        table.toggle_sort(Column::Name);
        table.derive(&store);
        assert_eq!(
            names(&table, &store),
            vec!["Zed Quinn", "Bob Stone", "alice smith", "Alice Smith"]
        );
    }

    #[test]
    fn new_sort_column_replaces_previous() {
        let mut table = TableView::new(ViewState::new(10));
        table.toggle_sort(Column::Name);
        table.toggle_sort(Column::Name);
        table.toggle_sort(Column::Status);
        assert_eq!(
            table.state().sort,
            Some(SortSpec {
                column: Column::Status,
                direction: SortDirection::Ascending
            })
        );
    }

    #[test]
    fn excluded_columns_never_sort() {
        let mut table = TableView::new(ViewState::new(10));
        for column in [Column::Profile, Column::Role, Column::Email, Column::Teams, Column::Actions] {
            assert!(!table.toggle_sort(column));
            assert_eq!(table.state().sort, None);
        }
        let store = store();
        let forced = SortSpec {
            column: Column::Email,
            direction: SortDirection::Descending,
        };
        let rows = TableView::sort_rows(store.records(), vec![0, 1, 2], forced);
        assert_eq!(rows, vec![0, 1, 2]);
    }

    #[test]
    fn pagination_bounds() {
        let store = store();
        let mut table = TableView::new(ViewState::new(2));
        table.derive(&store);
        assert_eq!(table.page_count(), 3);
        assert!(!table.can_prev());
        assert!(table.next_page());
        assert!(table.next_page());
        assert!(!table.can_next());
        assert!(!table.next_page());
        assert_eq!(table.page_rows().len(), 1);
    }

    #[test]
    fn filter_change_resets_page() {
        let store = store();
        let mut table = TableView::new(ViewState::new(2));
        table.derive(&store);
        table.next_page();
        table.set_team_filter(Some(Team::Technology));
        assert_eq!(table.page_index(), 0);
        table.derive(&store);
        assert_eq!(table.total(), 2);
    }

    #[test]
    fn delete_action_maps_page_row_to_store_index() {
        let store = store();
        let mut table = TableView::new(ViewState::new(2));
        table.toggle_sort(Column::Name);
        table.derive(&store);
        table.next_page();
        // Sorted: Alma, Bob, Carl, Jane, Mary. Page 1 holds Carl and Jane.
        assert_eq!(table.on_delete(1), Some(RowAction::Delete(0)));
        assert_eq!(table.on_delete(2), None);
        assert_eq!(
            table.on_row_click(&store, 0),
            Some(RowAction::Open(store.get(3).unwrap().id))
        );
    }

    #[test]
    fn page_is_clamped_when_rows_disappear() {
        let mut store = store();
        let mut table = TableView::new(ViewState::new(2));
        table.derive(&store);
        table.next_page();
        table.next_page();
        store.remove(4).unwrap();
        table.refresh(&store);
        assert_eq!(table.page_index(), 1);
    }

    #[test]
    fn view_state_query_round_trip() {
        let state = ViewState::new(10)
            .with_query("jane".to_string())
            .with_role(Role::ProductManager);
        let pairs = state.to_query();
        assert_eq!(pairs.to_string(), "query=jane&role=Product+Manager");
        let back = ViewState::from_query(&pairs, 10);
        assert_eq!(back, state);
    }

    #[test]
    fn unknown_labels_in_query_are_dropped() {
        let pairs = QueryPairs::parse("role=Wizard&team=Design");
        let state = ViewState::from_query(&pairs, 10);
        assert_eq!(state.role, None);
        assert_eq!(state.team, Some(Team::Design));
    }
}
