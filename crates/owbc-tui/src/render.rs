//! Main render/view function (View in TEA pattern)
//!
//! Pure rendering over the application state; the only writes back
//! into the state are the table geometry fields the popover placement
//! needs on the next key press.

use owbc_app::state::{AnchorRect, AppState, View};
use owbc_app::table::{EntityTable, SortDirection, SortField};
use owbc_core::TableRow;
use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use crate::layout;
use crate::popup;

const ACCENT: Color = Color::Cyan;
const DIM: Color = Color::DarkGray;
const ERROR: Color = Color::Red;

/// Render the complete UI.
pub fn view(frame: &mut Frame, state: &mut AppState) {
    let viewport = frame.area();
    let areas = layout::create(viewport);

    render_header(frame, areas.header, state.view);
    match state.view {
        View::Lists => render_entity_table(frame, areas.content, &state.lists, "Package Lists"),
        View::Profiles => render_entity_table(frame, areas.content, &state.profiles, "Profiles"),
        View::Builds => render_builds(frame, areas.content, state),
        View::Files => render_files(frame, areas.content, state),
        View::Settings => render_settings(frame, areas.content, state),
    }
    render_status(frame, areas.status, state);
    render_popover(frame, viewport, state);
}

fn render_header(frame: &mut Frame, area: Rect, active: View) {
    let views = [
        View::Lists,
        View::Profiles,
        View::Builds,
        View::Files,
        View::Settings,
    ];
    let mut spans: Vec<Span> = Vec::new();
    for (i, view) in views.iter().enumerate() {
        let label = format!(" {} {} ", i + 1, view.title());
        let style = if *view == active {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DIM)
        };
        spans.push(Span::styled(label, style));
    }
    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" owbc "));
    frame.render_widget(header, area);
}

fn sort_marker(table_field: SortField, field: SortField, direction: SortDirection) -> &'static str {
    if table_field != field {
        return "";
    }
    match direction {
        SortDirection::Asc => " ^",
        SortDirection::Desc => " v",
    }
}

fn render_entity_table<R: TableRow>(
    frame: &mut Frame,
    area: Rect,
    table: &EntityTable<R>,
    title: &str,
) {
    let sort = table.sort;
    let header = Row::new([
        Cell::from(""),
        Cell::from(format!(
            "Name{}",
            sort_marker(sort.field, SortField::Name, sort.direction)
        )),
        Cell::from(format!(
            "Updated{}",
            sort_marker(sort.field, SortField::Updated, sort.direction)
        )),
        Cell::from("Id"),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = table
        .visible()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mark = if table.selection.contains(row.id()) {
                "*"
            } else {
                " "
            };
            let style = if i == table.cursor {
                Style::default().fg(ACCENT).add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Row::new([
                Cell::from(mark),
                Cell::from(row.name().to_string()),
                Cell::from(row.updated_at().to_string()),
                Cell::from(row.id().to_string()),
            ])
            .style(style)
        })
        .collect();

    let mut block_title = format!(" {title} ");
    if !table.filter().is_empty() {
        block_title.push_str(&format!("(filter: {}) ", table.filter()));
    }
    if table.loading {
        block_title.push_str("... ");
    }

    let widget = Table::new(
        rows,
        [
            Constraint::Length(1),
            Constraint::Percentage(40),
            Constraint::Length(20),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(block_title));
    frame.render_widget(widget, area);
}

fn render_builds(frame: &mut Frame, area: Rect, state: &mut AppState) {
    let cascade_height = 3;
    let table_area = Rect {
        y: area.y + cascade_height,
        height: area.height.saturating_sub(cascade_height),
        ..area
    };

    let chain = &state.cascade;
    let chain_line = Line::from(vec![
        Span::styled("version ", Style::default().fg(DIM)),
        Span::raw(display_or_placeholder(&chain.version)),
        Span::styled("  target ", Style::default().fg(DIM)),
        Span::raw(display_or_placeholder(&chain.target)),
        Span::styled("  subtarget ", Style::default().fg(DIM)),
        Span::raw(display_or_placeholder(&chain.subtarget)),
        Span::styled("  platform ", Style::default().fg(DIM)),
        Span::raw(display_or_placeholder(&chain.platform)),
    ]);
    let chain_widget = Paragraph::new(chain_line)
        .block(Block::default().borders(Borders::ALL).title(" Parameters "));
    frame.render_widget(
        chain_widget,
        Rect {
            height: cascade_height,
            ..area
        },
    );

    // Record body geometry for popover anchoring (inside the border,
    // below the header row) and slide the scroll window over the cursor
    // before any row is built, so what is drawn matches the anchors.
    state.builds.table_area = AnchorRect {
        x: table_area.x + 1,
        y: table_area.y + 2,
        width: table_area.width.saturating_sub(2),
        height: table_area.height.saturating_sub(3),
    };
    let visible_rows = state.builds.table_area.height as usize;
    state.builds.sync_scroll(visible_rows);

    let header = Row::new(["", "Id", "State", "Progress", "Updated"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = state
        .builds
        .rows
        .iter()
        .enumerate()
        .skip(state.builds.scroll_offset)
        .take(visible_rows)
        .map(|(i, build)| {
            let mark = if state.builds.selection.contains(&build.build_id) {
                "*"
            } else {
                " "
            };
            let style = if i == state.builds.cursor {
                Style::default().fg(ACCENT).add_modifier(Modifier::REVERSED)
            } else if build.state.is_final() {
                Style::default().fg(DIM)
            } else {
                Style::default()
            };
            Row::new([
                Cell::from(mark),
                Cell::from(build.build_id.clone()),
                Cell::from(build.state.label()),
                Cell::from(format!("{}%", build.progress)),
                Cell::from(build.updated_at.clone()),
            ])
            .style(style)
        })
        .collect();

    let widget = Table::new(
        rows,
        [
            Constraint::Length(1),
            Constraint::Min(12),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(20),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(" Builds "));
    frame.render_widget(widget, table_area);
}

fn display_or_placeholder(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

fn render_files(frame: &mut Frame, area: Rect, state: &AppState) {
    let header = Row::new(["Source", "Target", "Size"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = state
        .files
        .rows
        .iter()
        .enumerate()
        .map(|(i, file)| {
            let target = match state.files.draft(&file.source_path) {
                Some(draft) => format!("{draft} (edited)"),
                None => file.target_path.clone().unwrap_or_default(),
            };
            let style = if i == state.files.cursor {
                Style::default().fg(ACCENT).add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Row::new([
                Cell::from(file.source_path.clone()),
                Cell::from(target),
                Cell::from(format!("{}", file.size)),
            ])
            .style(style)
        })
        .collect();

    let widget = Table::new(
        rows,
        [
            Constraint::Percentage(45),
            Constraint::Percentage(45),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(" Files "));
    frame.render_widget(widget, area);
}

fn render_settings(frame: &mut Frame, area: Rect, state: &AppState) {
    let settings = &state.settings;
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Address:  ", Style::default().fg(DIM)),
            Span::raw(settings.address_entry.clone()),
        ]),
        Line::from(vec![
            Span::styled("API path: ", Style::default().fg(DIM)),
            Span::raw(settings.api_path_entry.clone()),
        ]),
        Line::from(vec![
            Span::styled("Base URL: ", Style::default().fg(DIM)),
            Span::raw(state.endpoint.base_url().to_string()),
        ]),
    ];
    if let Some(error) = &settings.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(ERROR),
        )));
    }
    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Settings "));
    frame.render_widget(widget, area);
}

fn render_status(frame: &mut Frame, area: Rect, state: &AppState) {
    let (error, notice) = match state.view {
        View::Lists => (state.lists.error.as_deref(), state.lists.notice.as_deref()),
        View::Profiles => (
            state.profiles.error.as_deref(),
            state.profiles.notice.as_deref(),
        ),
        View::Builds => (
            state.builds.error.as_deref(),
            state.builds.notice.as_deref(),
        ),
        View::Files => (state.files.error.as_deref(), state.files.notice.as_deref()),
        View::Settings => (
            state.settings.error.as_deref(),
            state.settings.notice.as_deref(),
        ),
    };

    let banner = if let Some(entry) = &state.entry {
        Line::from(Span::styled(
            format!("{}: {}_", entry.purpose.label(), entry.buffer),
            Style::default().fg(ACCENT),
        ))
    } else if let Some(error) = error {
        Line::from(Span::styled(
            error.lines().next().unwrap_or_default().to_string(),
            Style::default().fg(ERROR),
        ))
    } else if let Some(notice) = notice {
        Line::from(Span::raw(
            notice.lines().next().unwrap_or_default().to_string(),
        ))
    } else {
        Line::from("")
    };

    let hints = Line::from(Span::styled(key_hints(state.view), Style::default().fg(DIM)));
    let widget = Paragraph::new(vec![banner, hints]).alignment(Alignment::Left);
    frame.render_widget(widget, area);
}

fn key_hints(view: View) -> &'static str {
    match view {
        View::Lists => {
            "1-5 views  r refresh  / filter  n/u sort  N new  I import  e rename  space select  a/c all/none  x delete  q quit"
        }
        View::Profiles => {
            "1-5 views  r refresh  / filter  n/u sort  N new  e rename  s submit  space select  a/c all/none  x delete  q quit"
        }
        View::Builds => {
            "1-5 views  r refresh  space select  a/c all/none  x delete  d/m detail  l log  D artifacts  k cancel  b rebuild  q quit"
        }
        View::Files => "1-5 views  r refresh  u upload  e target  x delete  q quit",
        View::Settings => "1-5 views  q quit",
    }
}

/// Render the open detail popover, if any, over everything else.
fn render_popover(frame: &mut Frame, viewport: Rect, state: &AppState) {
    let Some(popover) = &state.popover.open else {
        return;
    };

    // Size the popover to its text, borders included.
    let text_width = popover
        .text
        .lines()
        .map(|line| line.chars().count() as u16)
        .max()
        .unwrap_or(0)
        .max(20);
    let text_height = popover.text.lines().count().max(1) as u16;
    let size = (text_width + 2, text_height + 2);

    let anchor = popup::anchor_to_rect(popover.anchor);
    let placed = popup::place(anchor, size, viewport, popup::POPOVER_MARGIN);

    let title = format!(" {} ", popover.build_id);
    let widget = Paragraph::new(popover.text.clone())
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(Clear, placed);
    frame.render_widget(widget, placed);
}
