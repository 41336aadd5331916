// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::{Frame, Terminal};
use std::io::{self, Stdout};

pub(crate) struct Screen<B: Backend = CrosstermBackend<Stdout>> {
    terminal: Terminal<B>,
    backdrop: Buffer,
}

impl<B: Backend> Screen<B> {
    pub(crate) fn new(terminal: Terminal<B>) -> Self {
        Self {
            terminal,
            backdrop: Buffer::empty(Rect::default()),
        }
    }

    pub(crate) fn draw(&mut self, render: impl FnOnce(&mut Frame<'_>)) -> io::Result<()> {
        let completed = self.terminal.draw(render)?;
        self.backdrop = completed.buffer.clone();
        Ok(())
    }

    pub(crate) fn draw_over(&mut self, render: impl FnOnce(&mut Frame<'_>)) -> io::Result<()> {
        let backdrop = &self.backdrop;
        self.terminal.draw(|frame| {
            if backdrop.area == frame.area() {
                frame.buffer_mut().clone_from(backdrop);
            }
            render(frame);
        })?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        self.terminal.backend()
    }
}
