//! Text -> request routing, independent of teloxide types.

use regex::Regex;

use gatherpad_core::handler::Intent;

/// What an incoming message asks the bot to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    Intent(Intent),
    /// Keyword form with an explicit action name, resolved by the handler.
    Action { action: String, arg: String },
    Help,
}

/// Recognizes activation keywords such as `集会码`.
///
/// `<keyword>` alone is a query; `<keyword> REG <code>`, `<keyword> DEL 1,3`
/// and `<keyword> QUE` carry an explicit action.
#[derive(Clone, Debug)]
pub struct KeywordMatcher {
    re: Option<Regex>,
}

impl KeywordMatcher {
    pub fn new(keywords: &[String]) -> Result<Self, regex::Error> {
        let alternatives = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect::<Vec<_>>();
        if alternatives.is_empty() {
            return Ok(Self { re: None });
        }

        let pattern = format!(
            r"^\s*(?:{})\s*(?:(?P<action>[A-Za-z]{{3}})\b\s*(?P<arg>.*?))?\s*$",
            alternatives.join("|")
        );
        Ok(Self {
            re: Some(Regex::new(&pattern)?),
        })
    }

    pub fn parse(&self, text: &str) -> Option<Request> {
        let caps = self.re.as_ref()?.captures(text)?;
        let Some(action) = caps.name("action") else {
            return Some(Request::Intent(Intent::Query));
        };
        let arg = caps
            .name("arg")
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        Some(Request::Action {
            action: action.as_str().to_string(),
            arg,
        })
    }
}

/// Split `/cmd@botname args...` into `("cmd", "args...")`.
pub fn parse_command(text: &str) -> (String, String) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// Route a message's text. `None` means the message is not for us.
pub fn route(text: &str, commands_enabled: bool, keywords: &KeywordMatcher) -> Option<Request> {
    if text.trim_start().starts_with('/') {
        let (cmd, arg) = parse_command(text);
        return match cmd.as_str() {
            "help" | "start" => Some(Request::Help),
            "a" if commands_enabled => Some(Request::Intent(Intent::Register(first_token(&arg)))),
            "p" if commands_enabled => Some(Request::Intent(Intent::Query)),
            "d" if commands_enabled => Some(Request::Intent(Intent::Delete(arg))),
            _ => None,
        };
    }

    keywords.parse(text)
}

/// Codes never contain whitespace; anything after the first token is chatter.
pub fn first_token(s: &str) -> String {
    s.split_whitespace().next().unwrap_or("").to_string()
}

pub fn help_text(commands_enabled: bool, keywords: &[String]) -> String {
    let kw = keywords.first().map(String::as_str).unwrap_or("集会码");
    let mut lines = vec![
        "Gathering code notepad".to_string(),
        String::new(),
        format!("{kw} - list this group's gathering codes"),
        format!("{kw} REG <code> - register a code"),
        format!("{kw} DEL <1,3|ALL> - delete by line number, or everything"),
    ];
    if commands_enabled {
        lines.push(String::new());
        lines.push("/a <code> - register a code".to_string());
        lines.push("/p - list codes".to_string());
        lines.push("/d <1,3|ALL> - delete codes".to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> KeywordMatcher {
        KeywordMatcher::new(&["集会码".to_string(), "集会".to_string()]).unwrap()
    }

    #[test]
    fn command_parsing_strips_bot_suffix() {
        assert_eq!(
            parse_command("/a@NotepadBot  =f7TXWY8PE2z"),
            ("a".to_string(), "=f7TXWY8PE2z".to_string())
        );
        assert_eq!(parse_command("/P"), ("p".to_string(), String::new()));
    }

    #[test]
    fn slash_commands_need_to_be_enabled() {
        let m = matcher();
        assert_eq!(route("/p", false, &m), None);
        assert_eq!(route("/p", true, &m), Some(Request::Intent(Intent::Query)));
        assert_eq!(route("/help", false, &m), Some(Request::Help));
        assert_eq!(route("/unrelated", true, &m), None);
    }

    #[test]
    fn register_command_takes_first_token() {
        let m = matcher();
        assert_eq!(
            route("/a X1 please", true, &m),
            Some(Request::Intent(Intent::Register("X1".to_string())))
        );
        assert_eq!(
            route("/a", true, &m),
            Some(Request::Intent(Intent::Register(String::new())))
        );
        assert_eq!(
            route("/d 1,3", true, &m),
            Some(Request::Intent(Intent::Delete("1,3".to_string())))
        );
    }

    #[test]
    fn bare_keyword_is_a_query() {
        let m = matcher();
        assert_eq!(route("集会码", false, &m), Some(Request::Intent(Intent::Query)));
        assert_eq!(route("  集会 ", false, &m), Some(Request::Intent(Intent::Query)));
        assert_eq!(route("今天集会码呢", false, &m), None);
        assert_eq!(route("hello", false, &m), None);
    }

    #[test]
    fn keyword_with_action() {
        let m = matcher();
        assert_eq!(
            route("集会码 REG =f7TXWY8PE2z", false, &m),
            Some(Request::Action {
                action: "REG".to_string(),
                arg: "=f7TXWY8PE2z".to_string(),
            })
        );
        assert_eq!(
            route("集会码del 1, 3", false, &m),
            Some(Request::Action {
                action: "del".to_string(),
                arg: "1, 3".to_string(),
            })
        );
        assert_eq!(route("集会码 hello world", false, &m), None);
    }

    #[test]
    fn no_keywords_matches_nothing() {
        let m = KeywordMatcher::new(&[]).unwrap();
        assert_eq!(m.parse("集会码"), None);
    }

    #[test]
    fn keywords_are_escaped() {
        let m = KeywordMatcher::new(&["c++".to_string()]).unwrap();
        assert_eq!(m.parse("c++"), Some(Request::Intent(Intent::Query)));
        assert_eq!(m.parse("cc"), None);
    }
}
