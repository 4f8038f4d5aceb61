//! Terminal rendering for table output. JSON output bypasses this module.

const RESET: &str = "\u{001b}[0m";

#[derive(Debug, Clone, Copy)]
pub struct Styler {
    color: bool,
}

impl Styler {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.color {
            format!("\u{001b}[{}m{}{}", code, s, RESET)
        } else {
            s.to_string()
        }
    }

    pub fn green(&self, s: &str) -> String {
        self.paint("32", s)
    }

    pub fn yellow(&self, s: &str) -> String {
        self.paint("33", s)
    }

    pub fn gray(&self, s: &str) -> String {
        self.paint("90", s)
    }

    pub fn bold(&self, s: &str) -> String {
        self.paint("1", s)
    }

    pub fn check(&self, done: bool) -> String {
        if done {
            self.green("[x]")
        } else {
            self.gray("[ ]")
        }
    }
}

fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFF00..=0xFF60
        | 0x1F300..=0x1F64F
        | 0x1F680..=0x1F6FF
        | 0x1F900..=0x1F9FF)
}

/// Columns taken by `s`, skipping ANSI escape sequences.
pub fn display_width(s: &str) -> usize {
    let mut width = 0;
    let mut in_escape = false;
    for c in s.chars() {
        if in_escape {
            if c == 'm' {
                in_escape = false;
            }
            continue;
        }
        if c == '\u{001b}' {
            in_escape = true;
            continue;
        }
        width += if is_wide(c) { 2 } else { 1 };
    }
    width
}

fn pad_right(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(display_width(s));
    format!("{}{}", s, " ".repeat(pad))
}

pub fn render_simple_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).chain([headers.len()]).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for (i, h) in headers.iter().enumerate() {
        widths[i] = display_width(h);
    }
    for row in rows.iter() {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| pad_right(c, widths[i]))
            .collect::<Vec<String>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(headers.iter().map(|h| h.to_string()).collect())];
    out.extend(rows.iter().map(|r| line(r.clone())));
    out.join("\n")
}

/// Two-column `key  value` block for single-record views.
pub fn render_key_values(pairs: &[(&str, String)]) -> String {
    let width = pairs.iter().map(|(k, _)| display_width(k)).max().unwrap_or(0);
    pairs
        .iter()
        .map(|(k, v)| format!("{}  {}", pad_right(k, width), v))
        .collect::<Vec<String>>()
        .join("\n")
}

/// ASCII bar for `current / target`, full once the target is reached.
pub fn render_progress_bar(current: u32, target: u32, width: usize) -> String {
    if target == 0 {
        return "-".repeat(width);
    }
    let ratio = (f64::from(current) / f64::from(target)).min(1.0);
    let filled = ((ratio * width as f64).round() as usize).min(width);
    format!("{}{}", "#".repeat(filled), ".".repeat(width - filled))
}

pub fn opt<T: std::fmt::Display>(v: Option<T>) -> String {
    match v {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_ignores_color_codes() {
        let s = Styler::new(true).green("done");
        assert_eq!(display_width(&s), 4);
        assert_eq!(display_width("한글"), 4);
    }

    #[test]
    fn plain_styler_is_identity() {
        let s = Styler::new(false);
        assert_eq!(s.bold("x"), "x");
        assert_eq!(s.check(true), "[x]");
    }

    #[test]
    fn table_columns_align() {
        let rows = vec![
            vec!["1".to_string(), "alice".to_string(), "1200".to_string()],
            vec!["2".to_string(), "bo".to_string(), "90".to_string()],
        ];
        let t = render_simple_table(&["rank", "user", "score"], &rows);
        assert_eq!(t, "rank  user   score\n1     alice  1200\n2     bo     90");
    }

    #[test]
    fn table_without_rows_is_header_only() {
        assert_eq!(render_simple_table(&["a", "b"], &[]), "a  b");
    }

    #[test]
    fn progress_bar_caps_at_target() {
        assert_eq!(render_progress_bar(5, 10, 10), "#####.....");
        assert_eq!(render_progress_bar(40, 30, 4), "####");
        assert_eq!(render_progress_bar(0, 0, 3), "---");
    }
}
