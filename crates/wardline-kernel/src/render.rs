use wardline_contracts::{CommitResult, Language};

use crate::text::{text, Text};

pub const ELLIPSIS: char = '…';

/// Characters taken by `CON ` / `END `.
pub const PREFIX_CHARS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// `CON`: the gateway keeps the session open for another answer.
    Continue,
    /// `END`: the gateway closes the session.
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub kind: ReplyKind,
    pub text: String,
}

impl Reply {
    pub fn con(text: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Continue,
            text: text.into(),
        }
    }

    pub fn end(text: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::End,
            text: text.into(),
        }
    }

    pub fn is_end(&self) -> bool {
        self.kind == ReplyKind::End
    }

    /// Cuts the text so the whole body (prefix included) stays within `page_budget` characters.
    pub fn fit(mut self, page_budget: usize) -> Self {
        let room = page_budget.saturating_sub(PREFIX_CHARS);
        self.text = truncate(&self.text, room);
        self
    }

    pub fn body(&self) -> String {
        match self.kind {
            ReplyKind::Continue => format!("CON {}", self.text),
            ReplyKind::End => format!("END {}", self.text),
        }
    }
}

/// Shortens `value` to at most `max_chars` characters, ending in an ellipsis when cut.
pub fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = value.chars().take(max_chars - 1).collect();
    out = out.trim_end().to_string();
    out.push(ELLIPSIS);
    out
}

/// A terminal message with no further data.
pub fn terminal(language: Language, key: Text) -> Reply {
    Reply::end(text(language, key))
}

pub fn committed(language: Language, result: &CommitResult) -> Reply {
    let message = match result {
        CommitResult::Registration(record) => {
            let first_name = record.full_name.split(' ').next().unwrap_or_default();
            text(language, Text::RegistrationReceived).replace("{name}", first_name)
        }
        CommitResult::Issue(record) => {
            text(language, Text::IssueReceived).replace("{code}", &record.ticket)
        }
        CommitResult::BursaryApplication(record) => text(language, Text::ApplicationReceived)
            .replace("{code}", &record.application_number),
    };
    Reply::end(message)
}
