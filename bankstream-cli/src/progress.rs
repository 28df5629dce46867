use std::io::{IsTerminal, Write};

pub fn percent(page: usize, total: usize) -> usize {
    if total == 0 {
        return 100;
    }
    page * 100 / total
}

pub fn message(page: usize, total: usize) -> String {
    format!("Reading page {page} of {total} ({}%)", percent(page, total))
}

/// Single-line page counter on stderr. Silent when stderr is not a terminal.
pub struct Progress {
    enabled: bool,
    drawn: bool,
}

impl Progress {
    pub fn new(quiet: bool) -> Self {
        Self {
            enabled: !quiet && std::io::stderr().is_terminal(),
            drawn: false,
        }
    }

    pub fn page(&mut self, page: usize, total: usize) {
        if !self.enabled {
            return;
        }
        let mut err = std::io::stderr().lock();
        write!(err, "\r{}", message(page, total)).ok();
        err.flush().ok();
        self.drawn = true;
    }

    pub fn finish(&mut self) {
        if self.drawn {
            eprintln!();
            self.drawn = false;
        }
    }
}
