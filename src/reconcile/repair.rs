//! Single-pass textual repair of almost-JSON.
//!
//! The scanner tracks whether it is inside a double-quoted string, a
//! single-quoted string, or neither, and applies each enabled rule only where
//! it is safe: quote conversion never touches text that is already inside a
//! double-quoted string, comma removal never touches string contents.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairRule {
    /// `'text'` becomes `"text"`; embedded `"` is escaped and `\'` unescaped.
    SingleQuotes,
    /// `,` directly before `}` or `]` is dropped.
    TrailingCommas,
    /// Raw control characters inside strings become escape sequences.
    ControlCharacters,
    /// A backslash that does not open a valid JSON escape is doubled, so
    /// LaTeX like `\sqrt` survives as text. `\b` and `\f` followed by a letter
    /// (`\beta`, `\frac`) are treated the same way.
    StrayBackslashes,
}

impl RepairRule {
    pub const ALL: [RepairRule; 4] = [
        RepairRule::SingleQuotes,
        RepairRule::TrailingCommas,
        RepairRule::ControlCharacters,
        RepairRule::StrayBackslashes,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repaired {
    pub text: String,
    /// Rules that actually changed something, in first-hit order.
    pub applied: Vec<RepairRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Span {
    Outside,
    Double,
    Single,
}

pub fn repair(input: &str) -> Repaired {
    repair_with(input, &RepairRule::ALL)
}

pub fn repair_with(input: &str, rules: &[RepairRule]) -> Repaired {
    let chars: Vec<char> = input.chars().collect();
    let mut scanner = Scanner {
        out: String::with_capacity(input.len() + 16),
        applied: Vec::new(),
        rules,
    };
    let mut span = Span::Outside;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match span {
            Span::Outside => match c {
                '"' => {
                    span = Span::Double;
                    scanner.out.push(c);
                }
                '\'' if scanner.enabled(RepairRule::SingleQuotes) => {
                    span = Span::Single;
                    scanner.out.push('"');
                    scanner.note(RepairRule::SingleQuotes);
                }
                ',' if scanner.enabled(RepairRule::TrailingCommas)
                    && closes_after_whitespace(&chars, i + 1) =>
                {
                    scanner.note(RepairRule::TrailingCommas);
                }
                _ => scanner.out.push(c),
            },
            Span::Double | Span::Single => {
                let closing = if span == Span::Double { '"' } else { '\'' };
                if c == '\\' {
                    i += scanner.escape(&chars, i);
                    continue;
                } else if c == closing {
                    span = Span::Outside;
                    scanner.out.push('"');
                } else if c == '"' {
                    // Only reachable inside a single-quoted span.
                    scanner.out.push_str("\\\"");
                } else if (c as u32) < 0x20 && scanner.enabled(RepairRule::ControlCharacters) {
                    scanner.push_control(c);
                } else {
                    scanner.out.push(c);
                }
            }
        }
        i += 1;
    }

    Repaired {
        text: scanner.out,
        applied: scanner.applied,
    }
}

struct Scanner<'a> {
    out: String,
    applied: Vec<RepairRule>,
    rules: &'a [RepairRule],
}

impl Scanner<'_> {
    fn enabled(&self, rule: RepairRule) -> bool {
        self.rules.contains(&rule)
    }

    fn note(&mut self, rule: RepairRule) {
        if !self.applied.contains(&rule) {
            self.applied.push(rule);
        }
    }

    /// Handles the backslash at `chars[at]`; returns how many chars it used.
    fn escape(&mut self, chars: &[char], at: usize) -> usize {
        let next = chars.get(at + 1).copied();
        match next {
            Some('\'') if self.enabled(RepairRule::SingleQuotes) => {
                self.out.push('\'');
                self.note(RepairRule::SingleQuotes);
                2
            }
            Some(e @ ('b' | 'f'))
                if self.enabled(RepairRule::StrayBackslashes)
                    && chars.get(at + 2).is_some_and(|c| c.is_ascii_alphabetic()) =>
            {
                self.out.push_str("\\\\");
                self.out.push(e);
                self.note(RepairRule::StrayBackslashes);
                2
            }
            Some(e @ ('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't')) => {
                self.out.push('\\');
                self.out.push(e);
                2
            }
            Some('u') if is_unicode_escape(chars, at + 2) => {
                self.out.push_str("\\u");
                2
            }
            _ if self.enabled(RepairRule::StrayBackslashes) => {
                self.out.push_str("\\\\");
                self.note(RepairRule::StrayBackslashes);
                1
            }
            _ => {
                self.out.push('\\');
                1
            }
        }
    }

    fn push_control(&mut self, c: char) {
        match c {
            '\n' => self.out.push_str("\\n"),
            '\r' => self.out.push_str("\\r"),
            '\t' => self.out.push_str("\\t"),
            other => self.out.push_str(&format!("\\u{:04x}", other as u32)),
        }
        self.note(RepairRule::ControlCharacters);
    }
}

fn closes_after_whitespace(chars: &[char], from: usize) -> bool {
    chars[from..]
        .iter()
        .find(|c| !c.is_whitespace())
        .is_some_and(|c| *c == '}' || *c == ']')
}

fn is_unicode_escape(chars: &[char], from: usize) -> bool {
    chars.len() >= from + 4 && chars[from..from + 4].iter().all(|c| c.is_ascii_hexdigit())
}
