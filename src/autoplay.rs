//! Text-to-score auto-play.
//!
//! A text buffer becomes a timed grid: every line is a row, every character a
//! cell, and the flattened cells tick at the configured interval. Spaces are
//! dropped from their row (no rest, the column just disappears) while a blank
//! line keeps exactly one empty cell, which is one silent tick. Characters map
//! to key codes through a layout table and resolve against the live binding
//! index when playback starts; characters that resolve to nothing tick
//! silently.
//!
//! Scheduling is a pending queue polled against the dispatcher's sample
//! clock. Cancelling drops the queue; voices already handed to the dispatcher
//! keep sounding.

use std::collections::VecDeque;

use crate::config::records::KeyBinding;

/// One grid cell: a playable character or a rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell(pub Option<char>);

/// Immutable scan result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    rows: Vec<Vec<Cell>>,
}

impl Score {
    pub fn scan(text: &str) -> Self {
        let normalized = text.replace("\r\n", "\n");
        let rows = normalized
            .split('\n')
            .map(|line| {
                if line.is_empty() {
                    vec![Cell(None)]
                } else {
                    line.chars()
                        .filter(|c| *c != ' ')
                        .map(|c| Cell(Some(c)))
                        .collect()
                }
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Cells in playback order: row-major, column-major.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.rows.iter().flatten().copied()
    }
}

/// Map a character to `(key_code, shift)` for the selected keyboard layout.
pub fn char_to_key(c: char, japanese: bool) -> Option<(i32, bool)> {
    match c {
        'a'..='z' => return Some((c as i32 - 'a' as i32 + 65, false)),
        'A'..='Z' => return Some((c as i32 - 'A' as i32 + 65, true)),
        '0'..='9' => return Some((c as i32, false)),
        _ => {}
    }
    if japanese {
        japanese_symbol(c)
    } else {
        us_symbol(c)
    }
}

fn us_symbol(c: char) -> Option<(i32, bool)> {
    Some(match c {
        ')' => (48, true),
        '!' => (49, true),
        '@' => (50, true),
        '#' => (51, true),
        '$' => (52, true),
        '%' => (53, true),
        '^' => (54, true),
        '&' => (55, true),
        '*' => (56, true),
        '(' => (57, true),
        '`' => (192, false),
        '~' => (192, true),
        '-' => (189, false),
        '=' => (187, false),
        '[' => (219, false),
        ']' => (221, false),
        ';' => (186, false),
        '\'' => (222, false),
        '\\' => (220, false),
        ',' => (188, false),
        '.' => (190, false),
        '/' => (191, false),
        '_' => (189, true),
        '+' => (187, true),
        '{' => (219, true),
        '}' => (221, true),
        ':' => (186, true),
        '"' => (222, true),
        '|' => (220, true),
        '<' => (188, true),
        '>' => (190, true),
        '?' => (191, true),
        _ => return None,
    })
}

fn japanese_symbol(c: char) -> Option<(i32, bool)> {
    Some(match c {
        '!' => (49, true),
        '"' => (50, true),
        '#' => (51, true),
        '$' => (52, true),
        '%' => (53, true),
        '&' => (54, true),
        '\'' => (55, true),
        '(' => (56, true),
        ')' => (57, true),
        ':' => (186, false),
        ';' => (187, false),
        ',' => (188, false),
        '-' => (189, false),
        '.' => (190, false),
        '/' => (191, false),
        '@' => (192, false),
        '[' => (219, false),
        '\\' => (220, false),
        ']' => (221, false),
        '^' => (222, false),
        '*' => (186, true),
        '+' => (187, true),
        '<' => (188, true),
        '=' => (189, true),
        '>' => (190, true),
        '?' => (191, true),
        '`' => (192, true),
        '{' => (219, true),
        '|' => (220, true),
        '}' => (221, true),
        '~' => (222, true),
        '_' => (226, true),
        _ => return None,
    })
}

/// What `start` tells the host about the playback it just scheduled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoPlaySummary {
    /// Cells that resolved to at least one binding.
    pub playable: usize,
    /// Total playback length in seconds (every cell ticks, playable or not).
    pub total_seconds: f64,
}

struct PendingChord {
    due: f64,
    bindings: Vec<KeyBinding>,
}

#[derive(Default)]
pub struct AutoPlayer {
    pending: VecDeque<PendingChord>,
}

impl AutoPlayer {
    /// Schedule a score. Cell k is due at `now + k * interval`; `resolve`
    /// turns a `(key_code, shift)` pair into the binding that would sound, or
    /// `None` for a silent tick. Replaces whatever was pending.
    pub fn start(
        &mut self,
        score: &Score,
        interval: f64,
        now: f64,
        japanese: bool,
        mut resolve: impl FnMut(i32, bool) -> Option<KeyBinding>,
    ) -> AutoPlaySummary {
        self.pending.clear();

        let mut ticks = 0usize;
        let mut playable = 0usize;
        for cell in score.cells() {
            let bindings: Vec<KeyBinding> = cell
                .0
                .and_then(|c| char_to_key(c, japanese))
                .and_then(|(code, shift)| resolve(code, shift))
                .into_iter()
                .collect();
            if !bindings.is_empty() {
                playable += 1;
                self.pending.push_back(PendingChord {
                    due: now + ticks as f64 * interval,
                    bindings,
                });
            }
            ticks += 1;
        }

        AutoPlaySummary {
            playable,
            total_seconds: ticks as f64 * interval,
        }
    }

    /// Drain every chord due at or before `now`, in scheduled order.
    pub fn poll(&mut self, now: f64) -> Vec<Vec<KeyBinding>> {
        let mut due = Vec::new();
        while self.pending.front().is_some_and(|p| p.due <= now) {
            if let Some(chord) = self.pending.pop_front() {
                due.push(chord.bindings);
            }
        }
        due
    }

    /// Revoke everything still pending. Sounding voices are unaffected.
    pub fn cancel(&mut self) {
        self.pending.clear();
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}
