//! Create/edit form for a single person.
//!
//! The editor works on a [`Draft`] of raw form values. Nothing reaches the
//! store until [`RecordEditor::submit`] validated the draft and [`commit`]
//! applied the result through `RecordStore::add` or `RecordStore::update`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use regex::Regex;
use tracing::{debug, trace};

use crate::generator::Generator;
use crate::inputter::Inputter;
use crate::photo::{PhotoLoad, PhotoTicket};
use crate::record::{ImageRef, PersonRecord, RecordId, RecordPatch, Role, Status, Team};
use crate::store::RecordStore;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

pub fn is_email(s: &str) -> bool {
    !s.starts_with('.') && !s.contains("..") && EMAIL.is_match(s)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Photo,
    Name,
    Email,
    Role,
    Teams,
    Status,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Photo => "Photo",
            Field::Name => "Name",
            Field::Email => "Email",
            Field::Role => "Role",
            Field::Teams => "Teams",
            Field::Status => "Status",
        }
    }
}

/// Focus order of the form.
pub const FORM_FIELDS: [Field; 6] = [
    Field::Photo,
    Field::Name,
    Field::Email,
    Field::Role,
    Field::Teams,
    Field::Status,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Required,
    InvalidFormat,
    InvalidEnum,
    Pending,
    Rejected(String),
}

impl FieldError {
    pub fn message(&self, field: Field) -> String {
        match (self, field) {
            (FieldError::Required, Field::Teams) => "At least one team is required".to_string(),
            (FieldError::Required, f) => format!("{} is required", f.label()),
            (FieldError::InvalidFormat, Field::Email) => "Invalid email address".to_string(),
            (FieldError::InvalidFormat, f) => format!("Invalid {}", f.label().to_lowercase()),
            (FieldError::InvalidEnum, f) => format!("Unknown {} option", f.label().to_lowercase()),
            (FieldError::Pending, f) => format!("{} is still loading", f.label()),
            (FieldError::Rejected(why), _) => why.clone(),
        }
    }
}

/// Every failing field of one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<Field, FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.0.get(&field)
    }

    pub fn fields(&self) -> Vec<Field> {
        self.0.keys().copied().collect()
    }

    fn insert(&mut self, field: Field, error: FieldError) {
        self.0.insert(field, error);
    }

    fn remove(&mut self, field: Field) {
        self.0.remove(&field);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(|(field, e)| e.message(*field)).collect();
        f.write_str(&messages.join("; "))
    }
}

/// Raw form values, exactly as entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub teams: Vec<String>,
    pub photo: ImageRef,
}

impl Draft {
    pub fn blank() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            role: String::new(),
            status: Status::Active.label().to_string(),
            teams: Vec::new(),
            photo: ImageRef::placeholder(),
        }
    }

    pub fn from_record(record: &PersonRecord) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            role: record.role.label().to_string(),
            status: record.status.label().to_string(),
            teams: record.teams.iter().map(|t| t.label().to_string()).collect(),
            photo: record.profile_image.clone(),
        }
    }

    /// Values of an option-driven field.
    pub fn choice(&self, field: Field) -> Vec<String> {
        match field {
            Field::Role if !self.role.is_empty() => vec![self.role.clone()],
            Field::Status if !self.status.is_empty() => vec![self.status.clone()],
            Field::Teams => self.teams.clone(),
            _ => Vec::new(),
        }
    }

    pub fn set_choice(&mut self, field: Field, values: Vec<String>) {
        let first = values.first().cloned().unwrap_or_default();
        match field {
            Field::Role => self.role = first,
            Field::Status => self.status = first,
            Field::Teams => self.teams = values,
            _ => trace!("{} is not an option field", field.label()),
        }
    }
}

/// A draft that passed validation, with typed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRecord {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: Status,
    pub teams: Vec<Team>,
    pub profile_image: ImageRef,
}

pub fn validate(draft: &Draft) -> Result<ValidRecord, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if draft.name.trim().is_empty() {
        errors.insert(Field::Name, FieldError::Required);
    }
    if !is_email(&draft.email) {
        errors.insert(Field::Email, FieldError::InvalidFormat);
    }
    let role = if draft.role.trim().is_empty() {
        errors.insert(Field::Role, FieldError::Required);
        None
    } else {
        match draft.role.parse::<Role>() {
            Ok(role) => Some(role),
            Err(_) => {
                errors.insert(Field::Role, FieldError::InvalidEnum);
                None
            }
        }
    };
    let status = match draft.status.parse::<Status>() {
        Ok(status) => Some(status),
        Err(_) => {
            errors.insert(Field::Status, FieldError::InvalidEnum);
            None
        }
    };
    let teams: Result<Vec<Team>, _> = draft.teams.iter().map(|t| t.parse::<Team>()).collect();
    let teams = match teams {
        Ok(teams) if teams.is_empty() => {
            errors.insert(Field::Teams, FieldError::Required);
            None
        }
        Ok(teams) => Some(teams),
        Err(_) => {
            errors.insert(Field::Teams, FieldError::InvalidEnum);
            None
        }
    };

    match (role, status, teams) {
        (Some(role), Some(status), Some(teams)) if errors.is_empty() => Ok(ValidRecord {
            name: draft.name.clone(),
            email: draft.email.clone(),
            role,
            status,
            teams,
            profile_image: draft.photo.clone(),
        }),
        _ => Err(errors),
    }
}

pub fn validate_record(record: &PersonRecord) -> Result<ValidRecord, ValidationErrors> {
    validate(&Draft::from_record(record))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    Single,
    Multi,
}

/// "Pick one / pick many" control over a fixed option set, bound to one draft field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelector {
    pub field: Field,
    pub options: &'static [&'static str],
    pub mode: SelectMode,
    highlighted: usize,
}

impl FieldSelector {
    pub const fn new(field: Field, options: &'static [&'static str], mode: SelectMode) -> Self {
        Self {
            field,
            options,
            mode,
            highlighted: 0,
        }
    }

    pub fn form_selectors() -> Vec<FieldSelector> {
        vec![
            FieldSelector::new(Field::Role, Role::LABELS, SelectMode::Single),
            FieldSelector::new(Field::Teams, Team::LABELS, SelectMode::Multi),
            FieldSelector::new(Field::Status, Status::LABELS, SelectMode::Single),
        ]
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    pub fn move_highlight(&mut self, step: isize) {
        let n = self.options.len() as isize;
        if n > 0 {
            self.highlighted = (self.highlighted as isize + step).rem_euclid(n) as usize;
        }
    }

    /// Single mode replaces the value; multi mode toggles membership.
    pub fn pick(&self, draft: &mut Draft, option: &str) {
        match self.mode {
            SelectMode::Single => draft.set_choice(self.field, vec![option.to_string()]),
            SelectMode::Multi => {
                let mut current = draft.choice(self.field);
                match current.iter().position(|v| v == option) {
                    Some(pos) => {
                        current.remove(pos);
                    }
                    None => current.push(option.to_string()),
                }
                draft.set_choice(self.field, current);
            }
        }
    }

    pub fn pick_highlighted(&self, draft: &mut Draft) {
        if let Some(option) = self.options.get(self.highlighted) {
            self.pick(draft, option);
        }
    }

    pub fn is_selected(&self, draft: &Draft, option: &str) -> bool {
        draft.choice(self.field).iter().any(|v| v == option)
    }

    fn highlight_current(mut self, draft: &Draft) -> Self {
        if let Some(pos) = draft
            .choice(self.field)
            .first()
            .and_then(|v| self.options.iter().position(|o| o == v))
        {
            self.highlighted = pos;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(RecordId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    None,
    Submit,
    Cancel,
    LoadPhoto(PathBuf),
    RemovePhoto,
}

/// Validated outcome of an editor session, ready for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
    Create(ValidRecord),
    Update(RecordId, RecordPatch),
}

/// Applies a commit. The only way an editor's result reaches the store.
pub fn commit(commit: Commit, store: &mut RecordStore, generator: &mut Generator) -> RecordId {
    match commit {
        Commit::Create(valid) => store.add(generator.enrich(valid)),
        Commit::Update(id, patch) => {
            store.update(id, &patch);
            id
        }
    }
}

pub struct RecordEditor {
    mode: EditorMode,
    draft: Draft,
    focus: usize,
    name_input: Inputter,
    email_input: Inputter,
    photo_path: Inputter,
    selectors: Vec<FieldSelector>,
    errors: ValidationErrors,
    submitted: bool,
    pending_photo: Option<PhotoTicket>,
}

impl RecordEditor {
    pub fn create() -> Self {
        Self::with_draft(EditorMode::Create, Draft::blank())
    }

    pub fn edit(record: &PersonRecord) -> Self {
        Self::with_draft(EditorMode::Edit(record.id), Draft::from_record(record))
    }

    fn with_draft(mode: EditorMode, draft: Draft) -> Self {
        let selectors = FieldSelector::form_selectors()
            .into_iter()
            .map(|s| s.highlight_current(&draft))
            .collect();
        Self {
            mode,
            name_input: Inputter::with_value(&draft.name),
            email_input: Inputter::with_value(&draft.email),
            photo_path: Inputter::default(),
            draft,
            focus: 1,
            selectors,
            errors: ValidationErrors::default(),
            submitted: false,
            pending_photo: None,
        }
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn focused(&self) -> Field {
        FORM_FIELDS[self.focus]
    }

    pub fn selector(&self, field: Field) -> Option<&FieldSelector> {
        self.selectors.iter().find(|s| s.field == field)
    }

    pub fn text_input(&self, field: Field) -> Option<&Inputter> {
        match field {
            Field::Name => Some(&self.name_input),
            Field::Email => Some(&self.email_input),
            Field::Photo => Some(&self.photo_path),
            _ => None,
        }
    }

    pub fn is_loading_photo(&self) -> bool {
        self.pending_photo.is_some()
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % FORM_FIELDS.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + FORM_FIELDS.len() - 1) % FORM_FIELDS.len();
    }

    pub fn set_text(&mut self, field: Field, value: &str) {
        match field {
            Field::Name => {
                self.name_input.set(value);
                self.draft.name = value.to_string();
            }
            Field::Email => {
                self.email_input.set(value);
                self.draft.email = value.to_string();
            }
            Field::Photo => self.photo_path.set(value),
            _ => trace!("{} is not a text field", field.label()),
        }
        self.revalidate();
    }

    pub fn pick(&mut self, field: Field, option: &str) {
        if let Some(selector) = self.selectors.iter().find(|s| s.field == field) {
            selector.pick(&mut self.draft, option);
            self.revalidate();
        }
    }

    /// After the first submit, every edit re-runs validation so messages track the input.
    fn revalidate(&mut self) {
        if self.submitted {
            let photo_error = self.errors.get(Field::Photo).cloned();
            self.errors = validate(&self.draft).err().unwrap_or_default();
            if let Some(e) = photo_error {
                self.errors.insert(Field::Photo, e);
            }
        }
    }

    /// Holds on to the ticket of a new photo read; an older read in flight is cancelled.
    pub fn await_photo(&mut self, ticket: PhotoTicket) {
        if let Some(old) = self.pending_photo.replace(ticket) {
            old.cancel();
        }
    }

    /// Applies a finished read if it belongs to the pending ticket. Returns whether it applied.
    pub fn accept_photo(&mut self, load: PhotoLoad) -> bool {
        let matches = self
            .pending_photo
            .as_ref()
            .is_some_and(|t| t.generation() == load.generation && !t.is_canceled());
        if !matches {
            debug!("Discarding stale photo load {}", load.generation);
            return false;
        }
        self.pending_photo = None;
        match load.result {
            Ok(image) => {
                self.draft.photo = image;
                self.errors.remove(Field::Photo);
            }
            Err(e) => {
                debug!("Photo rejected: {e}");
                self.errors
                    .insert(Field::Photo, FieldError::Rejected(e.to_string()));
            }
        }
        true
    }

    pub fn remove_photo(&mut self) {
        if let Some(ticket) = self.pending_photo.take() {
            ticket.cancel();
        }
        self.draft.photo = ImageRef::placeholder();
        self.errors.remove(Field::Photo);
    }

    /// Closes the editor without touching the store. In-flight photo reads are cancelled.
    pub fn close(self) {
        if let Some(ticket) = self.pending_photo {
            ticket.cancel();
        }
        trace!("Editor closed");
    }

    /// Refused while a photo read is in flight, so a chosen photo is never dropped silently.
    pub fn submit(&mut self) -> Result<Commit, ValidationErrors> {
        self.submitted = true;
        let result = validate(&self.draft);
        let mut errors = result.as_ref().err().cloned().unwrap_or_default();
        if self.pending_photo.is_some() {
            errors.insert(Field::Photo, FieldError::Pending);
        }
        match result {
            Ok(valid) if errors.is_empty() => {
                self.errors = ValidationErrors::default();
                Ok(match self.mode {
                    EditorMode::Create => Commit::Create(valid),
                    EditorMode::Edit(id) => Commit::Update(
                        id,
                        RecordPatch {
                            name: Some(valid.name),
                            email: Some(valid.email),
                            role: Some(valid.role),
                            status: Some(valid.status),
                            teams: Some(valid.teams),
                            profile_image: Some(valid.profile_image),
                        },
                    ),
                })
            }
            _ => {
                debug!("Submit refused on {:?}", errors.fields());
                self.errors = errors.clone();
                Err(errors)
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorEvent {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => return EditorEvent::Cancel,
            (KeyCode::Char('s'), KeyModifiers::CONTROL) => return EditorEvent::Submit,
            (KeyCode::Char('r'), KeyModifiers::CONTROL) => {
                self.remove_photo();
                return EditorEvent::RemovePhoto;
            }
            (KeyCode::Tab, _) | (KeyCode::Down, _) => {
                self.focus_next();
                return EditorEvent::None;
            }
            (KeyCode::BackTab, _) | (KeyCode::Up, _) => {
                self.focus_prev();
                return EditorEvent::None;
            }
            _ => {}
        }

        let field = self.focused();
        match field {
            Field::Photo => {
                let result = self.photo_path.read(key);
                if result.finished {
                    self.photo_path.resume();
                    let path = result.input.trim();
                    if !path.is_empty() {
                        return EditorEvent::LoadPhoto(PathBuf::from(
                            shellexpand::tilde(path).into_owned(),
                        ));
                    }
                }
            }
            Field::Name | Field::Email => {
                let input = if field == Field::Name {
                    &mut self.name_input
                } else {
                    &mut self.email_input
                };
                let result = input.read(key);
                if result.finished {
                    input.resume();
                    self.focus_next();
                } else if field == Field::Name {
                    self.draft.name = result.input;
                    self.revalidate();
                } else {
                    self.draft.email = result.input;
                    self.revalidate();
                }
            }
            Field::Role | Field::Teams | Field::Status => {
                if let Some(idx) = self.selectors.iter().position(|s| s.field == field) {
                    match key.code {
                        KeyCode::Left => self.selectors[idx].move_highlight(-1),
                        KeyCode::Right => self.selectors[idx].move_highlight(1),
                        KeyCode::Char(' ') | KeyCode::Enter => {
                            self.selectors[idx].pick_highlighted(&mut self.draft);
                            self.revalidate();
                        }
                        _ => {}
                    }
                }
            }
        }
        EditorEvent::None
    }
}
