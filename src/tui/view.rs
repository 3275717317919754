use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};

use super::app::{App, FormField, Mode, TaskForm};
use crate::model::{Priority, Task};
use crate::output;
use crate::query::{due_status, DueStatus};
use crate::session::NoticeKind;

/// Center a rectangle within an area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_list(frame, app, chunks[1]);
    render_footer(frame, app, chunks[2]);

    match app.mode {
        Mode::Help => render_help(frame),
        Mode::ConfirmClear => render_confirm_clear(frame, app),
        Mode::Normal | Mode::Search => {}
    }
    if let Some(form) = &app.form {
        render_form(frame, form);
    }
}

fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::High => Style::default().fg(Color::Red),
        Priority::Medium => Style::default().fg(Color::Yellow),
        Priority::Low => Style::default().fg(Color::Green),
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let stats = app.session.stats();
    let view = &app.session.view;
    let dim = Style::default().fg(Color::DarkGray);

    let counts = Line::from(vec![
        Span::styled("taskpad", Style::default().bold()),
        Span::raw(format!(
            "  {} total  {} completed  {} pending",
            stats.total, stats.completed, stats.pending
        )),
    ]);

    let mut filters = vec![
        Span::styled("filter ", dim),
        Span::raw(view.status.as_str()),
        Span::styled("  priority ", dim),
        match view.priority {
            Some(p) => Span::styled(p.as_str(), priority_style(p)),
            None => Span::raw("any"),
        },
        Span::styled("  sort ", dim),
        Span::raw(view.sort.as_str()),
    ];
    if !view.search.is_empty() || app.mode == Mode::Search {
        filters.push(Span::styled("  search ", dim));
        filters.push(Span::raw(view.search.clone()));
        if app.mode == Mode::Search {
            filters.push(Span::raw("_"));
        }
    }

    frame.render_widget(
        Paragraph::new(vec![counts, Line::from(filters)]),
        area,
    );
}

fn task_item(task: &Task, app: &App) -> ListItem<'static> {
    let text_style = if task.completed {
        Style::default().fg(Color::DarkGray).crossed_out()
    } else {
        Style::default()
    };
    let marker = if app.drag.source() == Some(task.id) {
        "» "
    } else {
        "  "
    };

    let mut spans = vec![
        Span::styled(marker, Style::default().fg(Color::Cyan)),
        Span::raw(format!("{} ", task.checkbox())),
        Span::styled(task.text.clone(), text_style),
        Span::raw("  "),
        Span::styled(format!("[{}]", task.priority), priority_style(task.priority)),
        Span::styled(
            format!(" ({})", task.category),
            Style::default().fg(Color::Blue),
        ),
    ];

    if let Some(label) = output::due_label(task, app.today) {
        let style = match due_status(task, app.today) {
            Some(DueStatus::Overdue { .. }) => Style::default().fg(Color::Red).bold(),
            Some(DueStatus::Today) => Style::default().fg(Color::Yellow),
            _ => Style::default().fg(Color::DarkGray),
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(label, style));
    }

    let mut lines = vec![Line::from(spans)];
    if !task.notes.is_empty() {
        let first = task.notes.lines().next().unwrap_or_default();
        lines.push(Line::styled(
            format!("      {first}"),
            Style::default().fg(Color::DarkGray).italic(),
        ));
    }
    ListItem::new(lines)
}

fn render_list(frame: &mut Frame, app: &mut App, area: Rect) {
    let visible = app.visible();
    let title = format!(" Tasks ({}) ", visible.len());
    let items: Vec<ListItem> = if visible.is_empty() {
        let hint = if app.session.store().is_empty() {
            "No tasks yet. Press a to add one."
        } else {
            "No tasks match the current filters."
        };
        vec![ListItem::new(Line::styled(
            format!("  {hint}"),
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        visible.iter().map(|task| task_item(task, app)).collect()
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray));
    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let paragraph = match (&app.notice, app.mode) {
        (_, Mode::Search) => Paragraph::new("type to search  Enter: keep  Esc: clear")
            .style(Style::default().fg(Color::DarkGray)),
        (Some(notice), _) => {
            let style = match notice.kind {
                NoticeKind::Success => Style::default().fg(Color::Green),
                NoticeKind::Error => Style::default().fg(Color::Red),
                NoticeKind::Info => Style::default(),
            };
            Paragraph::new(notice.message.as_str()).style(style)
        }
        (None, _) => Paragraph::new(
            "a: add  e: edit  space: toggle  d: delete  u: undo  /: search  ?: help  q: quit",
        )
        .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(paragraph, area);
}

fn render_confirm_clear(frame: &mut Frame, app: &App) {
    let term = frame.area();
    let width = 50.min(term.width.saturating_sub(4));
    let height = 5.min(term.height.saturating_sub(2));
    let area = centered_rect(width, height, term);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Clear completed ")
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let completed = app.session.stats().completed;
    let text = vec![
        Line::from(vec![
            Span::raw("Remove "),
            Span::styled(completed.to_string(), Style::default().bold()),
            Span::raw(" completed task(s)?"),
        ]),
        Line::raw(""),
        Line::from(vec![
            Span::raw("Proceed? "),
            Span::styled("y", Style::default().fg(Color::Green).bold()),
            Span::raw("/"),
            Span::styled("n", Style::default().fg(Color::Red).bold()),
        ]),
    ];
    frame.render_widget(Paragraph::new(text), inner);
}

fn render_field(
    frame: &mut Frame,
    label: &str,
    value: &str,
    focused: bool,
    chunks: &[Rect],
    idx: &mut usize,
) {
    let label_style = if focused {
        Style::default().fg(Color::Cyan).bold()
    } else {
        Style::default()
    };
    frame.render_widget(Paragraph::new(label).style(label_style), chunks[*idx]);
    *idx += 1;

    let cursor = if focused { "_" } else { "" };
    frame.render_widget(
        Paragraph::new(format!("  {value}{cursor}")).style(Style::default().fg(Color::White)),
        chunks[*idx],
    );
    *idx += 1;
}

fn render_form(frame: &mut Frame, form: &TaskForm) {
    let term = frame.area();
    let width = 64.min(term.width.saturating_sub(4));
    // 5 fields of label + input, then the hint.
    let content_rows: u16 = 11 + u16::from(form.error.is_some());
    let height = (content_rows + 2).min(term.height.saturating_sub(2));
    let area = centered_rect(width, height, term);

    frame.render_widget(Clear, area);

    let title = match form.editing {
        Some(_) => " Edit Task ",
        None => " Add Task ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut constraints = vec![Constraint::Length(1); 10];
    if form.error.is_some() {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Length(1));
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    let mut idx = 0;
    let notes_preview = form.notes.replace('\n', " / ");
    let priority = format!("< {} >", form.priority);
    for (label, value, field) in [
        ("Task:", form.text.as_str(), FormField::Text),
        ("Notes:", notes_preview.as_str(), FormField::Notes),
        ("Due date (YYYY-MM-DD, today, tomorrow):", form.date.as_str(), FormField::Date),
        ("Category:", form.category.as_str(), FormField::Category),
        ("Priority:", priority.as_str(), FormField::Priority),
    ] {
        render_field(frame, label, value, form.focused == field, &chunks, &mut idx);
    }

    if let Some(err) = &form.error {
        frame.render_widget(
            Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red)),
            chunks[idx],
        );
        idx += 1;
    }

    frame.render_widget(
        Paragraph::new("Enter: save  Tab/S-Tab: fields  </>: priority  C-e: editor  Esc: cancel")
            .style(Style::default().fg(Color::DarkGray)),
        chunks[idx],
    );
}

fn help_line(key: &'static str, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{key:<8}"), Style::default().fg(Color::Cyan)),
        Span::raw(what),
    ])
}

fn render_help(frame: &mut Frame) {
    let term = frame.area();
    let width = 50.min(term.width.saturating_sub(4));
    let height = 22.min(term.height.saturating_sub(2));
    let area = centered_rect(width, height, term);

    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let help_text = vec![
        help_line("j/k", "Move down/up"),
        help_line("Space/x", "Toggle completed"),
        help_line("a", "Add task"),
        help_line("e/Enter", "Edit task"),
        help_line("d", "Delete task"),
        help_line("u", "Undo last change"),
        help_line("C", "Clear completed tasks"),
        help_line("/", "Search"),
        help_line("f", "Cycle status filter"),
        help_line("1/2/3", "Filter high/medium/low"),
        help_line("s", "Cycle sort"),
        help_line("m", "Pick up / drop on target"),
        help_line("J/K", "Swap with next/previous"),
        help_line("Esc", "Cancel move"),
        help_line("?", "Toggle help"),
        help_line("q", "Quit"),
        Line::raw(""),
        Line::from(Span::styled("Task dialog:", Style::default().bold())),
        help_line("  C-e", "Edit notes in $EDITOR"),
        help_line("  C-u", "Clear field"),
    ];

    frame.render_widget(Paragraph::new(help_text), inner);
}
