const DELIMITER: &str = "\n## ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Narrative,
    SqlQuery,
    Explanation,
    Process,
    Analysis,
    Other,
}

impl SectionKind {
    const RECOGNIZED: [SectionKind; 4] = [
        SectionKind::SqlQuery,
        SectionKind::Explanation,
        SectionKind::Process,
        SectionKind::Analysis,
    ];

    /// Header token that selects this kind.
    pub fn token(self) -> &'static str {
        match self {
            SectionKind::SqlQuery => "SQL Query",
            SectionKind::Explanation => "Explanation",
            SectionKind::Process => "Process",
            SectionKind::Analysis => "Analysis",
            SectionKind::Narrative | SectionKind::Other => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Header text; empty for the narrative, may also be empty for a bare `## `.
    pub name: String,
    pub body: String,
    /// Only the leading chunk before the first header.
    pub narrative: bool,
}

impl Section {
    /// A named section built from a header chunk.
    pub fn named(name: impl Into<String>, body: impl Into<String>) -> Self {
        Section {
            name: name.into(),
            body: body.into(),
            narrative: false,
        }
    }

    pub fn is_narrative(&self) -> bool {
        self.narrative
    }

    /// Prefix match on the header name.
    pub fn kind(&self) -> SectionKind {
        if self.is_narrative() {
            return SectionKind::Narrative;
        }
        SectionKind::RECOGNIZED
            .into_iter()
            .find(|k| self.name.starts_with(k.token()))
            .unwrap_or(SectionKind::Other)
    }
}

/// Split on `\n## `. The first section is always the narrative, even when
/// it is empty; a `## ` on the very first line stays part of it.
pub fn split_sections(text: &str) -> Vec<Section> {
    let (narrative, rest) = match text.find(DELIMITER) {
        Some(i) => (&text[..i], Some(&text[i + DELIMITER.len()..])),
        None => (text, None),
    };

    let mut sections = vec![Section {
        name: String::new(),
        body: narrative.trim().to_string(),
        narrative: true,
    }];

    if let Some(rest) = rest {
        for chunk in rest.split(DELIMITER) {
            let (name, body) = chunk.split_once('\n').unwrap_or((chunk, ""));
            sections.push(Section::named(name.trim(), trim_blank_lines(body)));
        }
    }

    sections
}

fn trim_blank_lines(body: &str) -> String {
    let lines: Vec<&str> = body.split('\n').collect();
    let first = lines.iter().position(|l| !l.trim().is_empty());
    let last = lines.iter().rposition(|l| !l.trim().is_empty());
    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last].join("\n").trim_end().to_string(),
        _ => String::new(),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn names(text: &str) -> Vec<String> {
        split_sections(text).into_iter().map(|s| s.name).collect()
    }

    #[test]
    fn no_headers_is_only_narrative() {
        let sections = split_sections("\n  Just an answer.\nSecond line.  \n");
        assert_eq!(sections.len(), 1);
        assert!(sections[0].is_narrative());
        assert_eq!(sections[0].body, "Just an answer.\nSecond line.");
    }

    #[test]
    fn narrative_then_sections() {
        let sections = split_sections("A\n## Process\nDo X\n## Analysis\nY. Z");
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].body, "A");
        assert_eq!(sections[1].name, "Process");
        assert_eq!(sections[1].body, "Do X");
        assert_eq!(sections[2].name, "Analysis");
        assert_eq!(sections[2].body, "Y. Z");
    }

    #[test]
    fn header_on_first_line_stays_in_narrative() {
        let sections = split_sections("## Analysis\nAll good.");
        assert_eq!(sections.len(), 1);
        assert!(sections[0].is_narrative());
        assert_eq!(sections[0].body, "## Analysis\nAll good.");
    }

    #[test]
    fn bare_header_is_not_narrative() {
        let sections = split_sections("Answer\n## \nimportant follow-up text");
        assert_eq!(sections.len(), 2);
        assert!(!sections[1].is_narrative());
        assert_eq!(sections[1].name, "");
        assert_eq!(sections[1].kind(), SectionKind::Other);
        assert_eq!(sections[1].body, "important follow-up text");
    }

    #[test]
    fn blank_lines_around_body_trimmed_indent_kept() {
        let sections = split_sections("x\n## SQL Query\n\n\n   SELECT 1\n\n\n## Process\n");
        assert_eq!(sections[1].body, "   SELECT 1");
        assert_eq!(sections[2].body, "");
    }

    #[test]
    fn level_three_headers_are_body_text() {
        let sections = split_sections("x\n## Analysis\n### Detail\nMore");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].body, "### Detail\nMore");
    }

    #[test]
    fn kinds_by_prefix() {
        let sections = split_sections(
            "n\n## SQL Query Used\n\n## Explanation:\n\n## Process\n\n## Analysis of results\n\n## Notes\n",
        );
        let kinds: Vec<SectionKind> = sections.iter().map(Section::kind).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Narrative,
                SectionKind::SqlQuery,
                SectionKind::Explanation,
                SectionKind::Process,
                SectionKind::Analysis,
                SectionKind::Other,
            ]
        );
    }

    #[test]
    fn load_balancers_sections() {
        let md = std::fs::read_to_string("tests/fixtures/load_balancers.md").unwrap();
        let found = names(&md);
        assert_eq!(found, vec!["", "SQL Query", "Explanation", "Process", "Analysis"]);
    }
}
