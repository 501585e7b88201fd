//! Rich text to plain text conversion.
//!
//! A small RTF reader in the style of `striprtf`: control words that carry
//! layout become whitespace, ignorable destinations (font tables, styles,
//! pictures and anything marked `\*`) are skipped, and escapes are decoded.
//! Paragraph and row ends become newlines; cell ends and tabs become tabs so
//! table columns stay separable.

use crate::models::RecoveredText;

/// Destinations whose content is never document text
const IGNORED_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "object",
    "header",
    "headerl",
    "headerr",
    "headerf",
    "footer",
    "footerl",
    "footerr",
    "footerf",
    "footnote",
    "listtable",
    "listoverridetable",
    "rsidtbl",
    "generator",
    "themedata",
    "colorschememapping",
    "latentstyles",
    "datastore",
    "xmlnstbl",
    "filetbl",
    "revtbl",
    "pgdsctbl",
];

#[derive(Debug, Clone, Copy)]
struct GroupState {
    ignorable: bool,
    unicode_skip: usize,
}

/// Recover plain text lines from RTF bytes
pub fn recover(bytes: &[u8]) -> RecoveredText {
    // RTF is 7-bit; anything above is decoded as Latin-1 rather than rejected.
    let source: String = bytes.iter().map(|&b| b as char).collect();
    RecoveredText::from_text(&rtf_to_text(&source))
}

/// Convert an RTF document to plain text
pub fn rtf_to_text(rtf: &str) -> String {
    let chars: Vec<char> = rtf.chars().collect();
    let mut out = String::with_capacity(chars.len() / 2);
    let mut stack: Vec<GroupState> = Vec::new();
    let mut state = GroupState {
        ignorable: false,
        unicode_skip: 1,
    };
    let mut pending_skip = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '{' => {
                stack.push(state);
                pending_skip = 0;
                i += 1;
            }
            '}' => {
                if let Some(previous) = stack.pop() {
                    state = previous;
                }
                pending_skip = 0;
                i += 1;
            }
            '\\' => {
                let (token, next) = read_control(&chars, i + 1);
                i = next;

                if pending_skip > 0 && !matches!(token, Control::Word { .. }) {
                    pending_skip -= 1;
                    continue;
                }

                match token {
                    Control::Symbol(symbol) => match symbol {
                        '\\' | '{' | '}' => emit(&mut out, state, symbol),
                        '~' => emit(&mut out, state, ' '),
                        '_' => emit(&mut out, state, '-'),
                        '*' => state.ignorable = true,
                        '\n' | '\r' => emit(&mut out, state, '\n'),
                        _ => {}
                    },
                    Control::Hex(byte) => emit(&mut out, state, byte as char),
                    Control::Word { name, param } => {
                        if IGNORED_DESTINATIONS.contains(&name.as_str()) {
                            state.ignorable = true;
                            continue;
                        }
                        match name.as_str() {
                            "par" | "line" | "row" | "sect" | "page" => {
                                emit(&mut out, state, '\n')
                            }
                            "cell" | "tab" => emit(&mut out, state, '\t'),
                            "emdash" | "endash" => emit(&mut out, state, '-'),
                            "bullet" => emit(&mut out, state, '*'),
                            "lquote" | "rquote" => emit(&mut out, state, '\''),
                            "ldblquote" | "rdblquote" => emit(&mut out, state, '"'),
                            "uc" => state.unicode_skip = param.unwrap_or(1).max(0) as usize,
                            "u" => {
                                if let Some(code) = param {
                                    let code = if code < 0 { code + 65_536 } else { code };
                                    if let Some(ch) = char::from_u32(code as u32) {
                                        emit(&mut out, state, ch);
                                    }
                                }
                                pending_skip = state.unicode_skip;
                            }
                            _ => {}
                        }
                    }
                }
            }
            '\r' | '\n' => i += 1,
            _ => {
                if pending_skip > 0 {
                    pending_skip -= 1;
                } else {
                    emit(&mut out, state, c);
                }
                i += 1;
            }
        }
    }

    out
}

#[derive(Debug, PartialEq)]
enum Control {
    Word { name: String, param: Option<i32> },
    Hex(u8),
    Symbol(char),
}

// Reads the control sequence following a backslash; returns the token and
// the index just past it (including the optional delimiting space).
fn read_control(chars: &[char], start: usize) -> (Control, usize) {
    let Some(&first) = chars.get(start) else {
        return (Control::Symbol('\\'), start);
    };

    if first == '\'' {
        let hex: String = chars.iter().skip(start + 1).take(2).collect();
        return match u8::from_str_radix(&hex, 16) {
            Ok(byte) => (Control::Hex(byte), start + 3),
            Err(_) => (Control::Symbol('\''), start + 1),
        };
    }

    if !first.is_ascii_alphabetic() {
        return (Control::Symbol(first), start + 1);
    }

    let mut end = start;
    while end < chars.len() && chars[end].is_ascii_alphabetic() {
        end += 1;
    }
    let name: String = chars[start..end].iter().collect();

    let param_start = end;
    if end < chars.len() && chars[end] == '-' {
        end += 1;
    }
    while end < chars.len() && chars[end].is_ascii_digit() {
        end += 1;
    }
    let param_text: String = chars[param_start..end].iter().collect();
    let param = param_text.parse::<i32>().ok();
    if param.is_none() {
        end = param_start;
    }

    if end < chars.len() && chars[end] == ' ' {
        end += 1;
    }

    (Control::Word { name, param }, end)
}

fn emit(out: &mut String, state: GroupState, c: char) {
    if !state.ignorable {
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_become_lines() {
        let rtf = r"{\rtf1\ansi{\fonttbl{\f0 Arial;}}\f0 Report Date: 31/03/2023\par Prison Name\par}";
        assert_eq!(rtf_to_text(rtf), "Report Date: 31/03/2023\nPrison Name\n");
    }

    #[test]
    fn test_cells_become_tabs_and_rows_newlines() {
        let rtf = r"{\rtf1 \trowd Altcourse\cell 794\cell 1164\cell\row Ashfield\cell 400\cell\row}";
        assert_eq!(rtf_to_text(rtf), "Altcourse\t794\t1164\t\nAshfield\t400\t\n");
    }

    #[test]
    fn test_ignorable_destinations_skipped() {
        let rtf = r"{\rtf1{\*\generator Writer 1.0;}{\colortbl;\red0\green0\blue0;}{\info{\title Secret}}Body\par}";
        assert_eq!(rtf_to_text(rtf), "Body\n");
    }

    #[test]
    fn test_escapes_decoded() {
        let rtf = r"{\rtf1 50\'25 \{x\} a\\b \u8364?\par}";
        assert_eq!(rtf_to_text(rtf), "50% {x} a\\b \u{20ac}\n");
    }

    #[test]
    fn test_recover_splits_lines() {
        let text = recover(br"{\rtf1 one\par two\par}");
        assert_eq!(text.line_count(), 2);
        assert_eq!(text.plain_text(), "one\ntwo");
    }
}
