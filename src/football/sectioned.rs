use super::match_line::parse_match_line;
use super::types::{SectionKind, WorldCupMatch};

const KNOCKOUT_ROUNDS: [&str; 5] = [
    "Round of 16",
    "Quarter-finals",
    "Semi-finals",
    "Match for third place",
    "Final",
];

const GROUP_HEADER_PREFIX: &str = "Group ";

/// Returns the section label if `line` (already trimmed) is a header in `kind` mode.
fn section_header(line: &str, kind: SectionKind) -> Option<String> {
    match kind {
        SectionKind::Group if line.starts_with(GROUP_HEADER_PREFIX) => {
            Some(line.split_whitespace().take(2).collect::<Vec<_>>().join(" "))
        }
        SectionKind::Knockout if KNOCKOUT_ROUNDS.contains(&line) => Some(line.to_string()),
        _ => None,
    }
}

/// Scan a single-line format document, tagging each match with the most recent
/// section header.
///
/// Header lines are consumed; blank lines and lines that are not match lines
/// are skipped. Records are returned in line order.
pub fn parse_sectioned_lines<I, S>(lines: I, kind: SectionKind) -> Vec<WorldCupMatch>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut section: Option<String> = None;
    let mut out = Vec::new();

    for raw in lines {
        let line = raw.as_ref().trim();
        if line.is_empty() {
            continue;
        }

        if let Some(label) = section_header(line, kind) {
            section = Some(label);
            continue;
        }

        if let Some(mut m) = parse_match_line(line) {
            m.section = section.clone();
            m.stage = Some(kind);
            out.push(m);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::football::types::Score;

    const GROUP_DOC: &str = "\
= World Cup 2014

(0) Wed Jun/11 12:00   Warmup  1-1  Friendly  @ Somewhere

Group A  |  Brazil  Croatia  Mexico  Cameroon

(1) Thu Jun/12 17:00   Brazil  3-1 (1-1)  Croatia   @ Arena de São Paulo, São Paulo
(2) Fri Jun/13 13:00   Mexico  1-0 (0-0)  Cameroon  @ Arena das Dunas, Natal
   not a match line

Group B  |  Spain  Netherlands  Chile  Australia
(3) Fri Jun/13 16:00   Spain  1-5 (1-1)  Netherlands  @ Arena Fonte Nova, Salvador
";

    const KNOCKOUT_DOC: &str = "\
Round of 16

(49) Sat Jun/28 13:00   Brazil  1-1 a.e.t. (1-1, 1-0)  Chile  @ Estádio Mineirão, Belo Horizonte

Quarter-finals
(57) Fri Jul/4 17:00   France  0-1 (0-1)  Germany  @ Maracanã, Rio de Janeiro

Match for third place
(63) Sat Jul/12 17:00   Brazil  0-3 (0-2)  Netherlands  @ Estádio Nacional, Brasília

Final
(64) Sun Jul/13 16:00   Germany  1-0 a.e.t. (0-0, 0-0)  Argentina  @ Maracanã, Rio de Janeiro
";

    #[test]
    fn test_group_sections_follow_headers() {
        let matches = parse_sectioned_lines(GROUP_DOC.lines(), SectionKind::Group);
        let summary: Vec<(u32, Option<&str>)> = matches
            .iter()
            .map(|m| (m.match_no, m.section.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (0, None),
                (1, Some("Group A")),
                (2, Some("Group A")),
                (3, Some("Group B")),
            ]
        );
        assert!(matches.iter().all(|m| m.stage == Some(SectionKind::Group)));
    }

    #[test]
    fn test_knockout_sections_use_round_names() {
        let matches = parse_sectioned_lines(KNOCKOUT_DOC.lines(), SectionKind::Knockout);
        let sections: Vec<&str> = matches
            .iter()
            .filter_map(|m| m.section.as_deref())
            .collect();
        assert_eq!(
            sections,
            vec!["Round of 16", "Quarter-finals", "Match for third place", "Final"]
        );
        assert!(matches.iter().all(|m| m.stage == Some(SectionKind::Knockout)));

        let last = matches.last().expect("final");
        assert_eq!(last.home, "Germany");
        assert_eq!(last.score.extra_time, Some(Score::new(1, 0)));
        assert_eq!(last.score.regulation, Some(Score::new(1, 0)));
    }

    #[test]
    fn test_group_headers_ignored_in_knockout_mode() {
        let doc = ["Group A", "(1) Thu Jun/12 17:00   Brazil  3-1  Croatia  @ Arena"];
        let matches = parse_sectioned_lines(doc, SectionKind::Knockout);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].section, None);
    }

    #[test]
    fn test_round_names_ignored_in_group_mode() {
        let doc = [
            "Group C",
            "Final",
            "(9) Sat Jun/14 13:00   Colombia  3-0  Greece  @ Mineirão",
        ];
        let matches = parse_sectioned_lines(doc, SectionKind::Group);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].section.as_deref(), Some("Group C"));
    }

    #[test]
    fn test_indented_header_and_blank_lines() {
        let doc = [
            "   ",
            "  Group D   |  Uruguay  Costa Rica",
            "",
            "  (7) Sat Jun/14 16:00   Uruguay  1-3 (1-0)  Costa Rica  @ Castelão, Fortaleza  ",
        ];
        let matches = parse_sectioned_lines(doc, SectionKind::Group);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].section.as_deref(), Some("Group D"));
        assert_eq!(matches[0].city.as_deref(), Some("Fortaleza"));
    }

    #[test]
    fn test_empty_document() {
        let lines: [&str; 0] = [];
        assert!(parse_sectioned_lines(lines, SectionKind::Group).is_empty());
    }
}
