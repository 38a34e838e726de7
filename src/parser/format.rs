use std::sync::LazyLock;

use regex::Regex;

use super::sections::{Section, SectionKind};

static SENTENCE_START_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.\s+([A-Z])").unwrap());

const SQL_FENCE: &str = "```sql";
const FENCE: &str = "```";
const BREAKDOWN_INTRO: &str = "Here's a breakdown of the SQL query:";

/// Join the formatted fragments of every non-narrative section, in order,
/// separated by a blank line.
pub fn build_explanation(sections: &[Section]) -> String {
    sections
        .iter()
        .filter(|s| !s.is_narrative())
        .map(|s| format_section(s).trim_end().to_string())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim_end()
        .to_string()
}

pub fn format_section(section: &Section) -> String {
    match section.kind() {
        SectionKind::SqlQuery => format_sql(&section.body),
        SectionKind::Explanation => format_explanation(&content(section, SectionKind::Explanation)),
        SectionKind::Process => format!("**Process:**\n{}", content(section, SectionKind::Process)),
        SectionKind::Analysis => format_analysis(&content(section, SectionKind::Analysis)),
        SectionKind::Other => passthrough(section),
        SectionKind::Narrative => String::new(),
    }
}

/// Header text left after the matched token, followed by the body.
fn content(section: &Section, kind: SectionKind) -> String {
    let rest = section.name[kind.token().len()..].trim_start();
    let rest = rest.strip_prefix(':').unwrap_or(rest).trim();
    if rest.is_empty() {
        section.body.trim().to_string()
    } else {
        format!("{}\n{}", rest, section.body).trim().to_string()
    }
}

/// Collect every complete ```sql fence, de-indenting each line. Unclosed
/// fences contribute nothing.
fn format_sql(body: &str) -> String {
    let mut sql_lines: Vec<&str> = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    let mut in_block = false;

    for line in body.split('\n') {
        let t = line.trim();
        if !in_block && t.eq_ignore_ascii_case(SQL_FENCE) {
            in_block = true;
            block.clear();
        } else if in_block && t == FENCE {
            in_block = false;
            sql_lines.append(&mut block);
        } else if in_block {
            block.push(t);
        }
    }

    let sql = sql_lines.join("\n");
    let sql = sql.trim();
    if sql.is_empty() {
        return String::new();
    }
    format!("**SQL Query:**\n```sql\n{}\n```", sql)
}

fn format_explanation(content: &str) -> String {
    let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
    if let Some(first) = lines.first_mut() {
        if first.contains(BREAKDOWN_INTRO) {
            *first = format!("**{}**", first.trim_end());
        }
    }
    lines.join("\n")
}

fn format_analysis(content: &str) -> String {
    let spaced = SENTENCE_START_RE.replace_all(content, ".\n\n$1");
    format!("**Analysis:**\n\n{}", spaced)
}

fn passthrough(section: &Section) -> String {
    let header = format!("## {}", section.name);
    let header = header.trim_end();
    if section.body.is_empty() {
        header.to_string()
    } else {
        format!("{}\n{}", header, section.body)
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::sections::split_sections;
    use pretty_assertions::assert_eq;

    fn section(name: &str, body: &str) -> Section {
        Section::named(name, body)
    }

    #[test]
    fn analysis_splits_sentences() {
        let out = format_section(&section("Analysis", "Revenue grew. Costs fell."));
        assert_eq!(out, "**Analysis:**\n\nRevenue grew.\n\nCosts fell.");
    }

    #[test]
    fn analysis_leaves_decimals_and_lowercase() {
        let out = format_section(&section("Analysis", "Load is 0.75 overall. most hosts idle.  Two hot."));
        assert_eq!(out, "**Analysis:**\n\nLoad is 0.75 overall. most hosts idle.\n\nTwo hot.");
    }

    #[test]
    fn sql_fence_dedented() {
        let body = "Generated query:\n   ```sql   \n    SELECT name,\n        cpu\n    FROM lbs\n  ```  \nTrailing note";
        let out = format_section(&section("SQL Query", body));
        assert_eq!(out, "**SQL Query:**\n```sql\nSELECT name,\ncpu\nFROM lbs\n```");
    }

    #[test]
    fn sql_single_statement() {
        let out = format_section(&section("SQL Query", "```sql\nSELECT 1\n```"));
        assert_eq!(out, "**SQL Query:**\n```sql\nSELECT 1\n```");
    }

    #[test]
    fn sql_without_complete_fence_is_empty() {
        assert_eq!(format_section(&section("SQL Query", "SELECT 1")), "");
        assert_eq!(format_section(&section("SQL Query", "```sql\nSELECT 1\n")), "");
        assert_eq!(format_section(&section("SQL Query", "```\nSELECT 1\n```")), "");
    }

    #[test]
    fn explanation_bolds_breakdown_intro() {
        let body = "Here's a breakdown of the SQL query:\n- selects load balancers\n- filters by region";
        let out = format_section(&section("Explanation", body));
        assert_eq!(
            out,
            "**Here's a breakdown of the SQL query:**\n- selects load balancers\n- filters by region"
        );
    }

    #[test]
    fn explanation_without_intro_untouched() {
        let out = format_section(&section("Explanation", "\nIt counts rows.\n"));
        assert_eq!(out, "It counts rows.");
    }

    #[test]
    fn header_remainder_kept_with_body() {
        let out = format_section(&section("Explanation: Here's a breakdown of the SQL query:", "- a"));
        assert_eq!(out, "**Here's a breakdown of the SQL query:**\n- a");
    }

    #[test]
    fn process_label() {
        let out = format_section(&section("Process", "1. Planned\n2. Executed"));
        assert_eq!(out, "**Process:**\n1. Planned\n2. Executed");
    }

    #[test]
    fn unknown_section_passed_through() {
        assert_eq!(format_section(&section("Notes", "keep me")), "## Notes\nkeep me");
    }

    #[test]
    fn explanation_joins_in_order() {
        let sections = split_sections("Answer\n## Process\nStep one\n## Other\nx\n## SQL Query\nnone\n## Analysis\nOk.\n\n");
        assert_eq!(
            build_explanation(&sections),
            "**Process:**\nStep one\n\n## Other\nx\n\n**Analysis:**\n\nOk."
        );
    }

    #[test]
    fn empty_process_leaves_single_blank_line() {
        let sections = split_sections("Answer\n## Process\n\n## Analysis\nFine.");
        let explanation = build_explanation(&sections);
        assert_eq!(explanation, "**Process:**\n\n**Analysis:**\n\nFine.");
        assert!(!explanation.contains("\n\n\n"));
    }

    #[test]
    fn bare_header_body_kept() {
        let sections = split_sections("Answer\n## \nimportant follow-up text");
        assert_eq!(build_explanation(&sections), "##\nimportant follow-up text");
    }
}
