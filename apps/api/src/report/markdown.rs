//! GitHub-flavored pipe-table recognition.
//!
//! A table is a header row, a separator row of dashes (optionally with `:`
//! alignment markers), then data rows until the first line without a pipe.
//! Rows are fitted to the header width: short rows are padded with empty
//! cells, long rows are truncated.
//!
//! HTML `<table>` markup is accepted too; whichever table comes first wins.

use crate::report::{html, ReportError, ReportTable};

pub fn parse_first_table(text: &str) -> Result<ReportTable, ReportError> {
    let html_start = html::find_table_start(text);
    let before_html = &text[..html_start.unwrap_or(text.len())];

    parse_pipe_table(before_html)
        .or_else(|| html_start.and_then(|start| html::parse_table(&text[start..])))
        .or_else(|| parse_pipe_table(text))
        .ok_or(ReportError::NoTableRecognized)
}

fn parse_pipe_table(text: &str) -> Option<ReportTable> {
    let lines: Vec<&str> = text.lines().collect();

    for (i, pair) in lines.windows(2).enumerate() {
        let (header_line, separator_line) = (pair[0], pair[1]);
        if !is_row(header_line) || is_separator(header_line) || !is_separator(separator_line) {
            continue;
        }

        let headers = split_row(header_line);
        if headers.iter().all(|h| h.is_empty()) {
            continue;
        }
        let width = headers.len();

        let rows = lines[i + 2..]
            .iter()
            .take_while(|line| is_row(line))
            .map(|line| fit_to_width(split_row(line), width))
            .collect();

        return Some(ReportTable { headers, rows });
    }

    None
}

fn is_row(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && find_unescaped_pipe(line).is_some()
}

fn is_separator(line: &str) -> bool {
    if !is_row(line) {
        return false;
    }
    let cells = split_row(line);
    !cells.is_empty() && cells.iter().all(|c| is_separator_cell(c))
}

fn is_separator_cell(cell: &str) -> bool {
    let core = cell.strip_prefix(':').unwrap_or(cell);
    let core = core.strip_suffix(':').unwrap_or(core);
    !core.is_empty() && core.chars().all(|c| c == '-')
}

fn find_unescaped_pipe(line: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, c) in line.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '|' if !escaped => return Some(idx),
            _ => escaped = false,
        }
    }
    None
}

/// Splits a row on unescaped pipes. Outer pipes are optional; a backslash
/// escapes the next character, `\|` becomes a literal pipe, and `<br>`
/// variants become newlines.
fn split_row(line: &str) -> Vec<String> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('|') => current.push('|'),
                Some(next) => {
                    current.push('\\');
                    current.push(next);
                }
                None => current.push('\\'),
            },
            '|' => cells.push(finish_cell(std::mem::take(&mut current))),
            _ => current.push(c),
        }
    }
    // Empty only when the row ended on a closing pipe.
    if !current.is_empty() || cells.is_empty() {
        cells.push(finish_cell(current));
    }
    cells
}

fn finish_cell(raw: String) -> String {
    let mut cell = raw.trim().to_string();
    for tag in ["<br />", "<br/>", "<br>", "<BR>", "<BR/>", "<BR />"] {
        if cell.contains(tag) {
            cell = cell.replace(tag, "\n");
        }
    }
    cell
}

fn fit_to_width(mut cells: Vec<String>, width: usize) -> Vec<String> {
    cells.resize(width, String::new());
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_table() {
        let text = "\
| 名称 | 数量 |
|------|------|
| 苹果 | 3 |
| 香蕉 | 5 |";
        let table = parse_first_table(text).unwrap();
        assert_eq!(table.headers, vec!["名称", "数量"]);
        assert_eq!(table.rows, vec![vec!["苹果", "3"], vec!["香蕉", "5"]]);
    }

    #[test]
    fn test_table_surrounded_by_prose_and_fences() {
        let text = "\
以下是分析结果：

```markdown
| a | b |
| :--- | ---: |
| 1 | 2 |
```

以上。";
        let table = parse_first_table(text).unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec!["1", "2"]]);
    }

    #[test]
    fn test_only_first_table_is_used() {
        let text = "\
| first |
|---|
| x |

| second |
|---|
| y |";
        let table = parse_first_table(text).unwrap();
        assert_eq!(table.headers, vec!["first"]);
        assert_eq!(table.rows, vec![vec!["x"]]);
    }

    #[test]
    fn test_ragged_rows_are_padded_and_truncated() {
        let text = "\
| a | b | c |
|---|---|---|
| 1 |
| 1 | 2 | 3 | 4 | 5 |";
        let table = parse_first_table(text).unwrap();
        assert_eq!(table.rows[0], vec!["1", "", ""]);
        assert_eq!(table.rows[1], vec!["1", "2", "3"]);
        assert!(table.rows.iter().all(|r| r.len() == table.width()));
    }

    #[test]
    fn test_no_table_is_recognized_error() {
        for text in [
            "",
            "just some prose without any table",
            "a | b\nno separator here",
            "|---|---|\n| 1 | 2 |",
        ] {
            assert!(
                matches!(parse_first_table(text), Err(ReportError::NoTableRecognized)),
                "unexpected table in {text:?}"
            );
        }
    }

    #[test]
    fn test_outer_pipes_are_optional() {
        let text = "a | b\n--- | ---\n1 | 2";
        let table = parse_first_table(text).unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec!["1", "2"]]);
    }

    #[test]
    fn test_escaped_pipes_stay_in_cell() {
        let text = "| expr | note |\n|---|---|\n| a \\| b | ok |";
        let table = parse_first_table(text).unwrap();
        assert_eq!(table.rows[0], vec!["a | b", "ok"]);
    }

    #[test]
    fn test_escaped_backslash_before_pipe_still_splits() {
        let text = "| path | note |\n|---|---|\n| C:\\\\| x |";
        let table = parse_first_table(text).unwrap();
        assert_eq!(table.rows[0], vec!["C:\\\\", "x"]);
    }

    #[test]
    fn test_trailing_escaped_pipe_is_cell_content() {
        let table = parse_first_table("| a | b |\n|---|---|\n| 1 | 2 \\|").unwrap();
        assert_eq!(table.rows[0], vec!["1", "2 |"]);
    }

    #[test]
    fn test_br_tags_become_newlines() {
        let text = "| q | a |\n|---|---|\n| 问 | 第一点<br>第二点<br/>第三点 |";
        let table = parse_first_table(text).unwrap();
        assert_eq!(table.rows[0][1], "第一点\n第二点\n第三点");
    }

    #[test]
    fn test_rows_stop_at_first_non_row_line() {
        let text = "| h |\n|---|\n| 1 |\n\n| 2 |";
        let table = parse_first_table(text).unwrap();
        assert_eq!(table.rows, vec![vec!["1"]]);
    }

    #[test]
    fn test_html_table_is_recognized() {
        let text = "模型输出：\n<table><tr><th>名称</th><th>数量</th></tr><tr><td>苹果</td><td>3</td></tr></table>";
        let table = parse_first_table(text).unwrap();
        assert_eq!(table.headers, vec!["名称", "数量"]);
        assert_eq!(table.rows, vec![vec!["苹果", "3"]]);
    }

    #[test]
    fn test_earlier_table_wins_across_formats() {
        let pipe_then_html = "| p |\n|---|\n| 1 |\n\n<table><tr><th>h</th></tr></table>";
        assert_eq!(parse_first_table(pipe_then_html).unwrap().headers, vec!["p"]);

        let html_then_pipe = "<table><tr><th>h</th></tr></table>\n\n| p |\n|---|\n| 1 |";
        assert_eq!(parse_first_table(html_then_pipe).unwrap().headers, vec!["h"]);
    }

    #[test]
    fn test_header_only_table() {
        let table = parse_first_table("| a | b |\n|---|---|").unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_empty_cells_are_preserved() {
        let table = parse_first_table("| a | b | c |\n|---|---|---|\n| 1 |  | 3 |").unwrap();
        assert_eq!(table.rows[0], vec!["1", "", "3"]);
    }
}
