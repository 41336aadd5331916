// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use loaner_app::{Location, Navigator, UserPrompt};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing::warn;

use crate::{SharedTerminal, centered_rect};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Dialog {
    Alert { message: String },
    Text { message: String, input: String },
    Confirm { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DialogAnswer {
    Acknowledged,
    Text(Option<String>),
    Confirmed(bool),
}

impl Dialog {
    fn title(&self) -> &'static str {
        match self {
            Self::Alert { .. } => "notice",
            Self::Text { .. } => "input",
            Self::Confirm { .. } => "confirm",
        }
    }

    fn cancelled(&self) -> DialogAnswer {
        match self {
            Self::Alert { .. } => DialogAnswer::Acknowledged,
            Self::Text { .. } => DialogAnswer::Text(None),
            Self::Confirm { .. } => DialogAnswer::Confirmed(false),
        }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> Option<DialogAnswer> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(self.cancelled());
        }

        match self {
            Self::Alert { .. } => match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
                    Some(DialogAnswer::Acknowledged)
                }
                _ => None,
            },
            Self::Text { input, .. } => match key.code {
                KeyCode::Enter => Some(DialogAnswer::Text(Some(std::mem::take(input)))),
                KeyCode::Esc => Some(DialogAnswer::Text(None)),
                KeyCode::Backspace => {
                    input.pop();
                    None
                }
                KeyCode::Char(ch) => {
                    input.push(ch);
                    None
                }
                _ => None,
            },
            Self::Confirm { .. } => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    Some(DialogAnswer::Confirmed(true))
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    Some(DialogAnswer::Confirmed(false))
                }
                _ => None,
            },
        }
    }

    pub(crate) fn body_text(&self) -> String {
        match self {
            Self::Alert { message } => format!("{message}\n\n[enter] ok"),
            Self::Text { message, input } => {
                format!("{message}\n\n> {input}_\n\n[enter] submit  [esc] cancel")
            }
            Self::Confirm { message } => format!("{message}\n\n[y] yes  [n] no"),
        }
    }
}

pub struct TerminalPrompt {
    terminal: SharedTerminal,
}

impl TerminalPrompt {
    pub(crate) fn new(terminal: SharedTerminal) -> Self {
        Self { terminal }
    }

    fn run(&mut self, mut dialog: Dialog) -> DialogAnswer {
        loop {
            if let Err(error) = self.draw(&dialog) {
                warn!(%error, "dialog draw failed");
                return dialog.cancelled();
            }
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if let Some(answer) = dialog.handle_key(key) {
                        return answer;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    warn!(%error, "dialog input failed");
                    return dialog.cancelled();
                }
            }
        }
    }

    fn draw(&self, dialog: &Dialog) -> std::io::Result<()> {
        let mut screen = self.terminal.borrow_mut();
        screen.draw_over(|frame| {
            let area = centered_rect(60, 30, frame.area());
            frame.render_widget(Clear, area);
            let body = Paragraph::new(dialog.body_text())
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .title(dialog.title())
                        .borders(Borders::ALL)
                        .style(Style::default().fg(Color::Cyan)),
                );
            frame.render_widget(body, area);
        })?;
        Ok(())
    }
}

impl UserPrompt for TerminalPrompt {
    fn alert(&mut self, message: &str) {
        self.run(Dialog::Alert {
            message: message.to_owned(),
        });
    }

    fn prompt(&mut self, message: &str, default: &str) -> Option<String> {
        match self.run(Dialog::Text {
            message: message.to_owned(),
            input: default.to_owned(),
        }) {
            DialogAnswer::Text(input) => input,
            _ => None,
        }
    }

    fn confirm(&mut self, message: &str) -> bool {
        matches!(
            self.run(Dialog::Confirm {
                message: message.to_owned(),
            }),
            DialogAnswer::Confirmed(true)
        )
    }
}

#[derive(Debug, Default)]
pub struct PendingNavigation {
    next: Option<Location>,
}

impl PendingNavigation {
    pub fn take(&mut self) -> Option<Location> {
        self.next.take()
    }
}

impl Navigator for PendingNavigation {
    fn navigate(&mut self, location: Location) -> anyhow::Result<()> {
        self.next = Some(location);
        Ok(())
    }
}
