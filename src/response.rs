use serde::Serialize;

use crate::parser::table::ResultRow;
use crate::parser::ParsedReport;

/// Payload shape the chat frontend expects.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub explanation: String,
    pub results: Option<Vec<ResultRow>>,
    pub visualization_path: Option<String>,
}

impl From<ParsedReport> for ChatResponse {
    fn from(report: ParsedReport) -> Self {
        ChatResponse {
            response: report.narrative,
            explanation: report.explanation,
            results: report.results,
            visualization_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_report;

    #[test]
    fn chat_shape() {
        let report = parse_report("Two hosts\n\n| host | up |\n|---|---|\n| a | yes |\n| b | no |");
        let json = serde_json::to_value(ChatResponse::from(report)).unwrap();
        assert_eq!(json["response"], "Two hosts");
        assert_eq!(json["explanation"], "");
        assert_eq!(json["results"][1]["up"], "no");
        assert!(json["visualization_path"].is_null());
    }

    #[test]
    fn degraded_has_null_results() {
        let json = serde_json::to_value(ChatResponse::from(ParsedReport::pass_through("raw"))).unwrap();
        assert_eq!(json["response"], "raw");
        assert!(json["results"].is_null());
    }
}
