use serde::Serialize;

/// Parsed components of a `LAST,FIRST M` identity string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedName {
    pub last: Option<String>,
    pub first: Option<String>,
    pub middle_initial: Option<String>,
}

impl ParsedName {
    pub fn is_empty(&self) -> bool {
        self.last.is_none() && self.first.is_none() && self.middle_initial.is_none()
    }
}

/// Best-effort split of an agent identity field. Anything that is not exactly two
/// comma-separated segments yields an empty result; this never fails.
pub fn parse_agent_name(value: Option<&str>) -> ParsedName {
    let Some(raw) = value else {
        return ParsedName::default();
    };

    let segments: Vec<&str> = raw.trim().split(',').collect();
    let [last, rest] = segments.as_slice() else {
        return ParsedName::default();
    };

    let last = non_empty(last);
    let tokens: Vec<&str> = rest.split_whitespace().collect();

    match tokens.as_slice() {
        [] => ParsedName {
            last,
            ..ParsedName::default()
        },
        [first] => ParsedName {
            last,
            first: non_empty(first),
            middle_initial: None,
        },
        [first, .., final_token] => ParsedName {
            last,
            first: non_empty(first),
            middle_initial: final_token.chars().next().map(String::from),
        },
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
