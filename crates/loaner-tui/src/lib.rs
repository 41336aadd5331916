// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod prompt;
mod screen;

pub use prompt::{PendingNavigation, TerminalPrompt};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use loaner_app::{
    ActionError, CheckinForm, DeviceBackend, DeviceController, DeviceId, DeviceTable, Location,
    Outcome, TableView, strip_markup,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{info, warn};

use crate::screen::Screen;

pub(crate) type SharedTerminal = Rc<RefCell<Screen>>;

type TuiController<B> = DeviceController<TableView, B, TerminalPrompt, PendingNavigation>;

const SELECTED_MARK: &str = "●";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiOptions {
    pub base_url: String,
    pub status_column: String,
    pub export_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UiCommand {
    Quit,
    MoveRow(isize),
    JumpFirstRow,
    JumpLastRow,
    ToggleSelection,
    Checkout,
    CheckIn,
    Edit,
    Delete,
    Reload,
    Export,
    ToggleHelp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CheckinOverlay {
    device: DeviceId,
    form: CheckinForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum OverlayStep {
    Editing,
    Submit(DeviceId, CheckinForm),
    Close,
}

impl CheckinOverlay {
    fn new(device: DeviceId) -> Self {
        Self {
            device,
            form: CheckinForm::default(),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> OverlayStep {
        match key.code {
            KeyCode::Esc => OverlayStep::Close,
            KeyCode::Enter => OverlayStep::Submit(self.device, self.form.clone()),
            KeyCode::Tab | KeyCode::Right => {
                self.form.condition = self.form.condition.cycle(1);
                OverlayStep::Editing
            }
            KeyCode::BackTab | KeyCode::Left => {
                self.form.condition = self.form.condition.cycle(-1);
                OverlayStep::Editing
            }
            KeyCode::Backspace => {
                self.form.comment.pop();
                OverlayStep::Editing
            }
            KeyCode::Char(ch) => {
                self.form.comment.push(ch);
                OverlayStep::Editing
            }
            _ => OverlayStep::Editing,
        }
    }

    fn text(&self) -> String {
        format!(
            "device {}\n\ncondition: < {} >  (marks device {})\ncomment:   {}_\n\n[tab] condition  [enter] check in  [esc] cancel",
            self.device,
            self.form.condition.as_str(),
            self.form.condition.resulting_status().as_str(),
            self.form.comment,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    cursor: usize,
    status_line: Option<String>,
    checkin: Option<CheckinOverlay>,
    help_visible: bool,
}

impl ViewData {
    fn move_cursor(&mut self, delta: isize, rows: usize) {
        if rows == 0 {
            self.cursor = 0;
            return;
        }
        let next = (self.cursor as isize + delta).clamp(0, rows as isize - 1);
        self.cursor = next as usize;
    }

    fn clamp_cursor(&mut self, rows: usize) {
        self.cursor = self.cursor.min(rows.saturating_sub(1));
    }
}

pub fn run_app<B: DeviceBackend>(backend: B, options: &UiOptions) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend_term = CrosstermBackend::new(stdout);
    let terminal: SharedTerminal = Rc::new(RefCell::new(Screen::new(
        Terminal::new(backend_term).context("create terminal")?,
    )));

    let mut controller = DeviceController::new(
        TableView::default(),
        backend,
        TerminalPrompt::new(Rc::clone(&terminal)),
        PendingNavigation::default(),
    )
    .with_status_column(options.status_column.clone());

    let mut view_data = ViewData::default();
    if let Ok(rows) = controller.reload() {
        view_data.status_line = Some(format!("{rows} devices"));
    }

    let result = event_loop(&terminal, &mut controller, &mut view_data, options);

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn event_loop<B: DeviceBackend>(
    terminal: &SharedTerminal,
    controller: &mut TuiController<B>,
    view_data: &mut ViewData,
    options: &UiOptions,
) -> Result<()> {
    loop {
        let view: &ViewData = view_data;
        terminal
            .borrow_mut()
            .draw(|frame| render(frame, controller.table(), view, options))
            .context("draw frame")?;

        if !event::poll(Duration::from_millis(200)).context("poll event")? {
            continue;
        }
        let Event::Key(key) = event::read().context("read event")? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if let Some(overlay) = view_data.checkin.as_mut() {
            match overlay.handle_key(key) {
                OverlayStep::Editing => {}
                OverlayStep::Close => view_data.checkin = None,
                OverlayStep::Submit(device, form) => {
                    view_data.checkin = None;
                    let result = controller.submit_checkin(device, &form);
                    finish_action(controller, view_data, options, "check-in", result);
                }
            }
            continue;
        }

        let Some(command) = command_for_key(key) else {
            continue;
        };
        if view_data.help_visible && command != UiCommand::ToggleHelp {
            view_data.help_visible = false;
            continue;
        }
        if handle_command(controller, view_data, options, command) {
            return Ok(());
        }
    }
}

fn command_for_key(key: KeyEvent) -> Option<UiCommand> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(UiCommand::Quit),
            KeyCode::Char('d') => Some(UiCommand::MoveRow(10)),
            KeyCode::Char('u') => Some(UiCommand::MoveRow(-10)),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(UiCommand::Quit),
        KeyCode::Char('j') | KeyCode::Down => Some(UiCommand::MoveRow(1)),
        KeyCode::Char('k') | KeyCode::Up => Some(UiCommand::MoveRow(-1)),
        KeyCode::Char('g') | KeyCode::Home => Some(UiCommand::JumpFirstRow),
        KeyCode::Char('G') | KeyCode::End => Some(UiCommand::JumpLastRow),
        KeyCode::Char(' ') | KeyCode::Enter => Some(UiCommand::ToggleSelection),
        KeyCode::Char('o') => Some(UiCommand::Checkout),
        KeyCode::Char('i') => Some(UiCommand::CheckIn),
        KeyCode::Char('e') => Some(UiCommand::Edit),
        KeyCode::Char('d') | KeyCode::Delete => Some(UiCommand::Delete),
        KeyCode::Char('r') => Some(UiCommand::Reload),
        KeyCode::Char('x') => Some(UiCommand::Export),
        KeyCode::Char('?') => Some(UiCommand::ToggleHelp),
        _ => None,
    }
}

fn handle_command<B: DeviceBackend>(
    controller: &mut TuiController<B>,
    view_data: &mut ViewData,
    options: &UiOptions,
    command: UiCommand,
) -> bool {
    let rows = controller.table().row_count();
    match command {
        UiCommand::Quit => return true,
        UiCommand::MoveRow(delta) => view_data.move_cursor(delta, rows),
        UiCommand::JumpFirstRow => view_data.cursor = 0,
        UiCommand::JumpLastRow => view_data.cursor = rows.saturating_sub(1),
        UiCommand::ToggleSelection => {
            let selected = controller.toggle_row(view_data.cursor);
            view_data.status_line = Some(if selected { "selected" } else { "deselected" }.to_owned());
        }
        UiCommand::Checkout => {
            let result = controller.checkout();
            finish_action(controller, view_data, options, "checkout", result);
        }
        UiCommand::CheckIn => {
            let result = controller.check_in();
            finish_action(controller, view_data, options, "check-in", result);
        }
        UiCommand::Edit => {
            let result = controller.edit();
            finish_action(controller, view_data, options, "edit", result);
        }
        UiCommand::Delete => {
            let result = controller.delete();
            finish_action(controller, view_data, options, "delete", result);
        }
        UiCommand::Reload => follow_location(controller, view_data, options, Location::DeviceList),
        UiCommand::Export => {
            let csv = controller.export_csv();
            view_data.status_line = Some(
                match write_export(&options.export_dir, &csv, OffsetDateTime::now_utc()) {
                    Ok(path) => {
                        info!(path = %path.display(), "devices exported");
                        format!("exported to {}", path.display())
                    }
                    Err(error) => {
                        warn!(error = %format!("{error:#}"), "export failed");
                        format!("export failed: {error:#}")
                    }
                },
            );
        }
        UiCommand::ToggleHelp => view_data.help_visible = !view_data.help_visible,
    }
    false
}

fn finish_action<B: DeviceBackend>(
    controller: &mut TuiController<B>,
    view_data: &mut ViewData,
    options: &UiOptions,
    action: &str,
    result: Result<Outcome, ActionError>,
) {
    view_data.status_line = Some(outcome_status(action, &result));
    if let Some(location) = controller.navigator_mut().take() {
        follow_location(controller, view_data, options, location);
    }
}

fn outcome_status(action: &str, result: &Result<Outcome, ActionError>) -> String {
    match result {
        Ok(Outcome::Navigated(_)) => format!("{action} done"),
        Ok(Outcome::Abandoned) => format!("{action} abandoned"),
        Ok(Outcome::Cancelled) => format!("{action} cancelled"),
        Err(error) => format!("{action}: {error}"),
    }
}

fn follow_location<B: DeviceBackend>(
    controller: &mut TuiController<B>,
    view_data: &mut ViewData,
    options: &UiOptions,
    location: Location,
) {
    match location {
        Location::DeviceList => {
            if let Ok(rows) = controller.reload() {
                view_data.clamp_cursor(rows);
                view_data.status_line = Some(format!("{rows} devices"));
            }
        }
        Location::CheckIn(device) => view_data.checkin = Some(CheckinOverlay::new(device)),
        Location::Edit(device) => {
            view_data.status_line = Some(format!(
                "edit device {device} at {}",
                page_url(&options.base_url, location)
            ));
        }
    }
}

fn page_url(base_url: &str, location: Location) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), location.path())
}

fn write_export(dir: &Path, csv: &str, now: OffsetDateTime) -> Result<PathBuf> {
    let stamp = now
        .format(format_description!(
            "[year][month][day]-[hour][minute][second]"
        ))
        .context("format export timestamp")?;
    let path = dir.join(format!("devices-{stamp}.csv"));
    fs::write(&path, csv).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

fn render(frame: &mut ratatui::Frame<'_>, table: &TableView, view_data: &ViewData, options: &UiOptions) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(frame.area());

    render_table(frame, layout[0], table, view_data, options);

    let status = Paragraph::new(status_text(table, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[1]);

    if let Some(overlay) = &view_data.checkin {
        let area = centered_rect(60, 40, frame.area());
        frame.render_widget(Clear, area);
        let form = Paragraph::new(overlay.text()).block(
            Block::default()
                .title("check in")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(form, area);
    }

    if view_data.help_visible {
        let area = centered_rect(60, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    table: &TableView,
    view_data: &ViewData,
    options: &UiOptions,
) {
    let headers = table.headers();
    let mut widths = vec![Constraint::Length(1)];
    widths.extend(std::iter::repeat_n(Constraint::Min(8), headers.len().max(1)));

    let header = Row::new(
        std::iter::once(Cell::from(""))
            .chain(headers.iter().map(|header| Cell::from(strip_markup(header)))),
    )
    .style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let rows = (0..table.row_count()).map(|row| {
        let selected = table.is_selected(row);
        let mut style = Style::default();
        if selected {
            style = style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
        }
        if row == view_data.cursor {
            style = style.bg(Color::DarkGray);
        }
        let mark = if selected { SELECTED_MARK } else { "" };
        Row::new(
            std::iter::once(Cell::from(mark)).chain(
                (0..headers.len())
                    .map(|column| Cell::from(table.cell_text(row, column).unwrap_or_default())),
            ),
        )
        .style(style)
    });

    let widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(format!("loaner  {}", options.base_url))
                .borders(Borders::ALL),
        );
    frame.render_widget(widget, area);
}

fn status_text(table: &TableView, view_data: &ViewData) -> String {
    let selected = table.selected_rows().len();
    let prefix = format!("{} devices, {selected} selected", table.row_count());
    match &view_data.status_line {
        Some(status) => format!("{prefix} | {status}"),
        None => format!("{prefix} | [?] help"),
    }
}

fn help_overlay_text() -> String {
    [
        "j/k, arrows   move",
        "g/G           first/last row",
        "space/enter   select row",
        "o             check out",
        "i             check in",
        "e             edit",
        "d             delete",
        "r             reload",
        "x             export csv",
        "q/esc         quit",
    ]
    .join("\n")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        CheckinOverlay, OverlayStep, UiCommand, ViewData, command_for_key, outcome_status,
        page_url, status_text, write_export,
    };
    use anyhow::Result;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use loaner_app::{
        ActionError, CheckinCondition, CheckinForm, DeviceId, Location, Outcome,
    };
    use loaner_testkit::table_selecting;
    use time::macros::datetime;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn action_keys_map_to_commands() {
        assert_eq!(
            command_for_key(key(KeyCode::Char('o'))),
            Some(UiCommand::Checkout)
        );
        assert_eq!(
            command_for_key(key(KeyCode::Char('i'))),
            Some(UiCommand::CheckIn)
        );
        assert_eq!(command_for_key(key(KeyCode::Char('e'))), Some(UiCommand::Edit));
        assert_eq!(
            command_for_key(key(KeyCode::Char('d'))),
            Some(UiCommand::Delete)
        );
        assert_eq!(
            command_for_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL)),
            Some(UiCommand::MoveRow(10))
        );
        assert_eq!(
            command_for_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(UiCommand::Quit)
        );
        assert_eq!(command_for_key(key(KeyCode::Char('z'))), None);
    }

    #[test]
    fn cursor_stays_inside_the_table() {
        let mut view = ViewData::default();
        view.move_cursor(-3, 4);
        assert_eq!(view.cursor, 0);
        view.move_cursor(10, 4);
        assert_eq!(view.cursor, 3);
        view.clamp_cursor(2);
        assert_eq!(view.cursor, 1);
        view.move_cursor(1, 0);
        assert_eq!(view.cursor, 0);
    }

    #[test]
    fn checkin_overlay_edits_condition_and_comment() {
        let mut overlay = CheckinOverlay::new(DeviceId::new(9));
        assert_eq!(overlay.handle_key(key(KeyCode::Tab)), OverlayStep::Editing);
        assert_eq!(overlay.handle_key(key(KeyCode::Tab)), OverlayStep::Editing);
        for ch in "ok".chars() {
            overlay.handle_key(key(KeyCode::Char(ch)));
        }
        assert!(overlay.text().contains("marks device Broken"));
        assert_eq!(
            overlay.handle_key(key(KeyCode::Enter)),
            OverlayStep::Submit(
                DeviceId::new(9),
                CheckinForm {
                    condition: CheckinCondition::Broken,
                    comment: "ok".to_owned(),
                }
            )
        );
        assert_eq!(overlay.handle_key(key(KeyCode::Esc)), OverlayStep::Close);
    }

    #[test]
    fn outcome_status_reads_naturally() {
        assert_eq!(
            outcome_status("checkout", &Ok(Outcome::Navigated(Location::DeviceList))),
            "checkout done"
        );
        assert_eq!(
            outcome_status("checkout", &Ok(Outcome::Abandoned)),
            "checkout abandoned"
        );
        assert_eq!(
            outcome_status("delete", &Err(ActionError::NoSelection)),
            "delete: Please select a device"
        );
    }

    #[test]
    fn page_url_joins_base_and_route() {
        assert_eq!(
            page_url("http://inventory.local:8000/", Location::Edit(DeviceId::new(5))),
            "http://inventory.local:8000/devices/5/edit/"
        );
    }

    #[test]
    fn status_line_counts_rows_and_selection() {
        let table = table_selecting(3);
        let mut view = ViewData::default();
        assert_eq!(status_text(&table, &view), "4 devices, 1 selected | [?] help");
        view.status_line = Some("checkout done".to_owned());
        assert_eq!(
            status_text(&table, &view),
            "4 devices, 1 selected | checkout done"
        );
    }

    #[test]
    fn export_writes_timestamped_file() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = write_export(temp.path(), "Name\r\n", datetime!(2026-03-04 05:06:07 UTC))?;
        assert!(path.ends_with("devices-20260304-050607.csv"));
        assert_eq!(std::fs::read_to_string(path)?, "Name\r\n");
        Ok(())
    }
}
