// Interview analysis prompt template and the column schema it mandates.
// The report converter does not enforce the schema; it only shapes the model output.

/// Column headers of the report table, in output order:
/// category, topic, summary, verbatim quote, coverage, follow-up suggestion.
pub const REPORT_COLUMNS: [&str; 6] = [
    "类型",
    "问题或主题",
    "内容摘要",
    "原始话术",
    "覆盖情况",
    "补问建议",
];

/// Allowed values of the coverage column: covered / not covered / partially covered.
pub const COVERAGE_VALUES: [&str; 3] = ["是", "否", "部分覆盖"];

/// Row categories: outline item / case supplement / story / data lead.
pub const ROW_CATEGORIES: [&str; 4] = ["大纲对应", "案例补充", "故事叙述", "数据线索"];

/// Analysis prompt. Placeholders: {report_header}, {report_separator},
/// {categories}, {coverage_values}, {goal}, {outline}, {transcript}.
pub const INTERVIEW_ANALYSIS_TEMPLATE: &str = r#"你是一名资深的访谈记录整理专家。请把受访者的观点、案例和细节尽可能完整地保留下来，并逐条对照访谈大纲归档。

一、对照大纲
- 逐一检查访谈大纲中的每个问题，判断访谈原文是否作出了回答。
- 已回答的问题：提取对应内容，保留受访者的典型说法、关键数字和具体细节。
- 未回答或只回答了一部分的问题：给出可以直接用于补充访谈的追问。

二、案例与线索
- 找出原文中包含时间、人物、事件和结果的完整案例或经验分享。
- 提炼其中的关键经过、成败原因、量化数据以及值得继续追问的线索。

三、故事与叙述
- 大纲之外，受访者主动讲述的故事同样需要整理，保留其来龙去脉，不要只写结论。

四、输出要求
只输出一张 Markdown 表格，不要输出其他表格。表头固定如下：

{report_header}
{report_separator}

- “类型”只能填写：{categories}
- “覆盖情况”只能填写：{coverage_values}
- “内容摘要”不少于50字，不要过度压缩
- “原始话术”摘录受访者的原话
- “覆盖情况”不是“是”时，“补问建议”必须填写具体、可操作的追问

【访谈目标】
{goal}

【访谈大纲】
{outline}

【访谈原文】
{transcript}
"#;

/// Builds the analysis prompt. Pure: identical inputs give identical output,
/// and each input appears verbatim as a contiguous substring.
pub fn build_analysis_prompt(transcript: &str, outline: &str, goal: &str) -> String {
    let header = markdown_row(REPORT_COLUMNS.iter().copied());
    let separator = markdown_row(REPORT_COLUMNS.iter().map(|_| "------"));
    let categories = ROW_CATEGORIES.join(" / ");
    let coverage_values = COVERAGE_VALUES.join(" / ");

    fill_template(
        INTERVIEW_ANALYSIS_TEMPLATE,
        &[
            ("report_header", &header),
            ("report_separator", &separator),
            ("categories", &categories),
            ("coverage_values", &coverage_values),
            ("goal", goal),
            ("outline", outline),
            ("transcript", transcript),
        ],
    )
}

fn markdown_row<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    let mut row = String::from("|");
    for cell in cells {
        row.push(' ');
        row.push_str(cell);
        row.push_str(" |");
    }
    row
}

/// Single-pass `{name}` substitution. Substituted values are never rescanned,
/// so user text containing `{goal}` or similar is passed through untouched.
/// Unknown placeholders are left as-is.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(
        template.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>(),
    );
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replacement = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (close, *value))
        });
        match replacement {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
