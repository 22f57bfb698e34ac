use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, Wrap},
};

use crate::editor::{FORM_FIELDS, Field, RecordEditor, SelectMode};
use crate::location::Route;
use crate::model::{Modus, Model};
use crate::record::{PersonRecord, Status};
use crate::table::{Column, SortDirection, TableView};

const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(5);
const BAR_WIDTH: usize = 30;

#[derive(Debug, Default)]
pub struct DirUI {}

impl DirUI {
    pub fn new() -> Self {
        Self {}
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        let area = frame.area();
        let [header, body, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);

        self.draw_header(model, frame, header);
        match model.table() {
            Some(table) => self.draw_directory(model, table, frame, body),
            None => self.draw_dashboard(model, frame, body),
        }
        self.draw_footer(model, frame, footer);

        if let Some(editor) = model.editor() {
            self.draw_editor(editor, frame, popup_area(area, 70, 85));
        }
        if let Some(message) = model.popup_message() {
            let popup = popup_area(area, 60, 80);
            frame.render_widget(Clear, popup);
            frame.render_widget(
                Paragraph::new(message).block(Block::bordered().title(" Help ".bold())),
                popup,
            );
        }
    }

    fn draw_header(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let route = model.location().route;
        let tab = |label: &'static str, active: bool| {
            if active {
                Span::styled(label, Style::new().add_modifier(Modifier::REVERSED))
            } else {
                Span::raw(label)
            }
        };
        let line = Line::from(vec![
            " pd ".bold(),
            tab(" 1 Dashboard ", route == Route::Dashboard),
            tab(" 2 Directory ", route == Route::Directory),
            "  ".into(),
            Span::styled(model.location().to_string(), Style::new().fg(Color::Yellow)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_footer(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let line = if model.last_status_message_update().elapsed() < STATUS_MESSAGE_TTL {
            Line::from(Span::raw(model.status_message().to_string()))
        } else {
            let hints = match model.modus() {
                Modus::Dashboard => " 2/Enter directory  ? help  q quit",
                Modus::Table => " / search  r role  t team  s sort  a add  e edit  d delete  ? help",
                Modus::Record => " j/k previous/next  e edit  y copy e-mail  Esc close",
                Modus::SearchInput => " Enter keep  Esc restore",
                Modus::Editor => " Tab next field  Space pick  Ctrl-S save  Esc cancel",
                Modus::Popup => " Esc close",
            };
            Line::from(hints.dim())
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    // -------------------- Dashboard ---------------------- //

    fn draw_dashboard(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let mut lines = vec![
            Line::from("Welcome back!".bold()),
            Line::from(format!("{} people in the directory", model.store().len())),
            Line::default(),
        ];
        lines.extend(histogram_lines("Members per role", &model.role_counts()));
        lines.push(Line::default());
        lines.extend(histogram_lines("Members per team", &model.team_counts()));

        frame.render_widget(
            Paragraph::new(Text::from(lines)).block(Block::bordered().title(" Dashboard ")),
            area,
        );
    }

    // -------------------- Directory ---------------------- //

    fn draw_directory(&self, model: &Model, table: &TableView, frame: &mut Frame, area: Rect) {
        let [filters, content, pager] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(area);

        self.draw_filter_bar(model, table, frame, filters);

        match model.detail_record() {
            Some(record) => {
                let [left, right] =
                    Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                        .areas(content);
                self.draw_table(model, table, frame, left);
                self.draw_detail(record, frame, right);
            }
            None => self.draw_table(model, table, frame, content),
        }

        self.draw_pager(table, frame, pager);
    }

    fn draw_filter_bar(&self, model: &Model, table: &TableView, frame: &mut Frame, area: Rect) {
        let state = table.state();
        let mut spans = vec![" Search: ".bold()];
        match model.search_input() {
            Some(input) => spans.extend(input_spans(input.value(), input.curser_pos())),
            None => match &state.query {
                Some(query) => spans.push(Span::raw(query.clone())),
                None => spans.push("(none)".dim()),
            },
        }
        spans.push("  Role: ".bold());
        spans.push(Span::raw(state.role.map(|r| r.label()).unwrap_or("All Roles")));
        spans.push("  Team: ".bold());
        spans.push(Span::raw(state.team.map(|t| t.label()).unwrap_or("All Teams")));
        spans.push(Span::styled(
            format!("  {} members", table.total()),
            Style::new().add_modifier(Modifier::DIM),
        ));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_table(&self, model: &Model, table: &TableView, frame: &mut Frame, area: Rect) {
        let block = Block::bordered().title(" Team members ");
        if table.total() == 0 {
            frame.render_widget(
                Paragraph::new("No members match the current search and filters.".dim())
                    .block(block),
                area,
            );
            return;
        }

        let sort = table.state().sort;
        let header = Row::new(Column::ALL.iter().enumerate().map(|(i, column)| {
            let mut title = column.title().to_string();
            if let Some(spec) = sort
                && spec.column == *column
            {
                title.push_str(match spec.direction {
                    SortDirection::Ascending => " ▲",
                    SortDirection::Descending => " ▼",
                });
            }
            let mut style = Style::new().add_modifier(Modifier::BOLD);
            if i == table.curser_column() {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Cell::from(title).style(style)
        }));

        let detail_id = model.detail_record().map(|r| r.id);
        let rows: Vec<Row> = table
            .page_rows()
            .iter()
            .enumerate()
            .filter_map(|(i, &idx)| model.store().get(idx).map(|r| (i, r)))
            .map(|(i, record)| {
                let cells = Column::ALL.iter().map(|column| match column {
                    Column::Status => status_cell(record.status),
                    Column::Actions => Cell::from("e edit  d del".dim()),
                    _ => Cell::from(column.text(record)),
                });
                let mut style = Style::new();
                if i == table.curser_row() {
                    style = style.bg(Color::DarkGray);
                }
                if detail_id == Some(record.id) {
                    style = style.add_modifier(Modifier::BOLD);
                }
                Row::new(cells).style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(12),
            Constraint::Fill(2),
            Constraint::Length(10),
            Constraint::Fill(2),
            Constraint::Fill(3),
            Constraint::Fill(2),
            Constraint::Length(13),
        ];
        let widget = Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .block(block);
        frame.render_widget(widget, area);
    }

    fn draw_pager(&self, table: &TableView, frame: &mut Frame, area: Rect) {
        let button = |label: &'static str, enabled: bool| {
            if enabled {
                label.bold()
            } else {
                Span::styled(label, Style::new().fg(Color::DarkGray))
            }
        };
        let line = Line::from(vec![
            button("◀ Previous", table.can_prev()),
            " | ".into(),
            Span::raw(format!(
                "Page {} of {}",
                table.page_index() + 1,
                table.page_count().max(1)
            )),
            " | ".into(),
            button("Next ▶", table.can_next()),
        ]);
        frame.render_widget(Paragraph::new(line.centered()), area);
    }

    fn draw_detail(&self, record: &PersonRecord, frame: &mut Frame, area: Rect) {
        let heading = Style::new().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        let field = |label: &'static str, value: String| {
            Line::from(vec![
                Span::styled(format!("{label:<15}"), Style::new().fg(Color::Gray)),
                Span::raw(value),
            ])
        };
        let lines = vec![
            Line::from(Span::styled(
                record.name.clone(),
                Style::new().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(record.handle(), Style::new().fg(Color::Cyan))),
            Line::default(),
            field("Status", record.status.label().to_string()),
            field("Role", record.role.label().to_string()),
            field("Teams", record.teams_label()),
            field("Photo", record.profile_image.describe()),
            Line::default(),
            Line::from(Span::styled("Personal information", heading)),
            field("Date of birth", record.date_of_birth.clone()),
            field("Gender", record.gender.clone()),
            field("Nationality", record.nationality.clone()),
            field("Contact no.", record.contact_no.clone()),
            field("E-mail", record.email.clone()),
            field("Work e-mail", record.email.clone()),
            Line::default(),
            Line::from(Span::styled("Research & publication", heading)),
            Line::from(Span::styled(
                record.research.title.clone(),
                Style::new().add_modifier(Modifier::ITALIC),
            )),
            Line::from(Span::styled(
                format!(
                    "{}, {}",
                    record.research.publication_name, record.research.publication_year
                ),
                Style::new().fg(Color::Gray),
            )),
            Line::from(record.research.abstract_text.clone()),
        ];
        frame.render_widget(
            Paragraph::new(Text::from(lines))
                .wrap(Wrap { trim: false })
                .block(Block::bordered().title(format!(" {} ", record.id))),
            area,
        );
    }

    // -------------------- Editor ---------------------- //

    fn draw_editor(&self, editor: &RecordEditor, frame: &mut Frame, area: Rect) {
        let title = match editor.mode() {
            crate::editor::EditorMode::Create => " Add member ".to_string(),
            crate::editor::EditorMode::Edit(id) => format!(" Edit member {id} "),
        };
        let mut lines: Vec<Line> = Vec::new();
        for field in FORM_FIELDS {
            let focused = editor.focused() == field;
            let marker = if focused { "› " } else { "  " };
            let mut spans = vec![
                Span::raw(marker),
                Span::styled(
                    format!("{:<8}", field.label()),
                    Style::new().add_modifier(Modifier::BOLD),
                ),
            ];
            match field {
                Field::Photo => {
                    spans.push(Span::raw(editor.draft().photo.describe()));
                    if editor.is_loading_photo() {
                        spans.push(" (loading ...)".dim());
                    }
                    lines.push(Line::from(spans));
                    let mut path = vec![Span::raw("          path: ")];
                    if let Some(input) = editor.text_input(Field::Photo) {
                        if focused {
                            path.extend(input_spans(input.value(), input.curser_pos()));
                        } else {
                            path.push(Span::raw(input.value().to_string()));
                        }
                    }
                    lines.push(Line::from(path));
                }
                Field::Name | Field::Email => {
                    if let Some(input) = editor.text_input(field) {
                        if focused {
                            spans.extend(input_spans(input.value(), input.curser_pos()));
                        } else {
                            spans.push(Span::raw(input.value().to_string()));
                        }
                    }
                    lines.push(Line::from(spans));
                }
                Field::Role | Field::Teams | Field::Status => {
                    if let Some(selector) = editor.selector(field) {
                        for (i, option) in selector.options.iter().enumerate() {
                            let selected = selector.is_selected(editor.draft(), option);
                            let mark = match (selector.mode, selected) {
                                (SelectMode::Single, true) => "(•) ",
                                (SelectMode::Single, false) => "( ) ",
                                (SelectMode::Multi, true) => "[x] ",
                                (SelectMode::Multi, false) => "[ ] ",
                            };
                            let mut style = Style::new();
                            if selected {
                                style = style.fg(Color::Green);
                            }
                            if focused && i == selector.highlighted() {
                                style = style.add_modifier(Modifier::REVERSED);
                            }
                            spans.push(Span::styled(format!("{mark}{option}"), style));
                            spans.push(Span::raw("  "));
                        }
                    }
                    lines.push(Line::from(spans));
                }
            }
            if let Some(error) = editor.errors().get(field) {
                lines.push(Line::from(Span::styled(
                    format!("          {}", error.message(field)),
                    Style::new().fg(Color::Red),
                )));
            }
            lines.push(Line::default());
        }
        lines.push(Line::from(
            "Tab next  Space pick  Enter load photo  Ctrl-R remove photo  Ctrl-S save  Esc cancel"
                .dim(),
        ));

        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(Text::from(lines))
                .wrap(Wrap { trim: false })
                .block(Block::bordered().title(Span::styled(
                    title,
                    Style::new().add_modifier(Modifier::BOLD),
                ))),
            area,
        );
    }
}

fn status_cell(status: Status) -> Cell<'static> {
    match status {
        Status::Active => Cell::from(Span::styled("● Active", Style::new().fg(Color::Green))),
        Status::Inactive => Cell::from(Span::styled("○ Inactive", Style::new().fg(Color::DarkGray))),
    }
}

fn histogram_lines(title: &'static str, counts: &[(usize, String)]) -> Vec<Line<'static>> {
    let max = counts.first().map(|(c, _)| *c).unwrap_or(0).max(1);
    let mut lines = vec![Line::from(title.bold())];
    for (count, label) in counts {
        lines.push(Line::from(vec![
            Span::raw(format!("  {label:<20}")),
            Span::styled(
                "█".repeat(count * BAR_WIDTH / max),
                Style::new().fg(Color::Cyan),
            ),
            Span::raw(format!(" {count}")),
        ]));
    }
    lines
}

/// Text with the character under the cursor drawn inverted.
fn input_spans(value: &str, cursor: usize) -> Vec<Span<'static>> {
    let before: String = value.chars().take(cursor).collect();
    let at = value
        .chars()
        .nth(cursor)
        .map(String::from)
        .unwrap_or_else(|| " ".to_string());
    let after: String = value.chars().skip(cursor + 1).collect();
    vec![
        Span::raw(before),
        Span::styled(at, Style::new().add_modifier(Modifier::REVERSED)),
        Span::raw(after),
    ]
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}
