/// Status extractors: turn a snapshot of server page text into session facts.
///
/// Extractors never fail. A page that does not contain what an extractor looks
/// for is an ordinary outcome and clears the corresponding facts.
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::session::{SessionState, NOT_LOGGED_IN};

/// Occupancy of slot "2" as it appears in the embedded server JSON. The page
/// is only trusted in this exact compact shape: `current` before `max`, no
/// whitespace around the separators.
static SLOT_COUNTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""slots".*?"2":\{"current":(.*?),"max":(.*?)\}"#).expect("valid regex")
});

static GLOBAL_CONTEXT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Surface\.globalContext\s*=\s*").expect("valid regex"));

/// Pointer to the signed-in account name inside the global context.
pub const USERNAME_POINTER: &str = "/session/user/username";

/// A single page-text extractor run by the update pipeline.
///
/// Implementations must only depend on `page`, never on facts written by
/// another extractor during the same pass.
pub trait ContextUpdater: Send + Sync {
    fn name(&self) -> &'static str;

    fn update_context(&self, state: &mut SessionState, page: &str);
}

/// Reads current/max occupancy of the primary slot.
pub struct PlayerCountsUpdater;

impl ContextUpdater for PlayerCountsUpdater {
    fn name(&self) -> &'static str {
        "player-counts"
    }

    fn update_context(&self, state: &mut SessionState, page: &str) {
        state.set_player_counts(parse_player_counts(page));
    }
}

/// Reads the account currently signed in to the page.
pub struct LoggedInUserUpdater;

impl ContextUpdater for LoggedInUserUpdater {
    fn name(&self) -> &'static str {
        "logged-in-user"
    }

    fn update_context(&self, state: &mut SessionState, page: &str) {
        let user = parse_global_context(page)
            .as_ref()
            .and_then(|ctx| ctx.pointer(USERNAME_POINTER))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| NOT_LOGGED_IN.to_string());
        state.set_current_logged_in_user(user);
    }
}

/// Returns `(current, max)` for the primary slot, or `None` if the page has no
/// slot table for it. A captured value that is not a bare integer (quoted,
/// fractional, garbage) counts as `0`.
pub fn parse_player_counts(page: &str) -> Option<(i32, i32)> {
    let caps = SLOT_COUNTS.captures(page)?;
    let count = |i: usize| {
        caps.get(i)
            .and_then(|g| g.as_str().trim().parse::<i32>().ok())
            .unwrap_or(0)
    };
    Some((count(1), count(2)))
}

/// Extracts the object assigned to `Surface.globalContext` in `text`.
///
/// The payload may span many lines; it ends wherever the JSON object ends.
/// Returns `None` if the marker is missing or what follows is not an object.
pub fn parse_global_context(text: &str) -> Option<Value> {
    let m = GLOBAL_CONTEXT_MARKER.find(text)?;
    first_json_value(&text[m.end()..]).filter(Value::is_object)
}

/// Parses the first JSON value at the start of `text`, ignoring whatever follows it.
fn first_json_value(text: &str) -> Option<Value> {
    serde_json::Deserializer::from_str(text)
        .into_iter::<Value>()
        .next()?
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn session() -> SessionState {
        SessionState::from_config(&Config::default())
    }

    // ── parse_player_counts ───────────────────────────────────────────────────

    #[test]
    fn counts_from_slot_table() {
        let page = r#"{"slots":{"2":{"current":37,"max":50}}}"#;
        assert_eq!(parse_player_counts(page), Some((37, 50)));
    }

    #[test]
    fn counts_skip_earlier_slots() {
        let page = r#"<script>var s = {"name":"x","slots":{"1":{"current":0,"max":4},"2":{"current":12,"max":64}}};</script>"#;
        assert_eq!(parse_player_counts(page), Some((12, 64)));
    }

    #[test]
    fn reordered_keys_are_not_a_slot_table() {
        let page = r#"{"slots":{"2":{"max":64,"current":12}}}"#;
        assert_eq!(parse_player_counts(page), None);
    }

    #[test]
    fn spaced_separators_are_not_a_slot_table() {
        let page = r#"{"slots": {"2": {"current": 12, "max": 64}}}"#;
        assert_eq!(parse_player_counts(page), None);
    }

    #[test]
    fn no_slot_table_is_none() {
        assert_eq!(parse_player_counts("<html>maintenance</html>"), None);
        assert_eq!(parse_player_counts(""), None);
    }

    #[test]
    fn missing_primary_slot_is_none() {
        let page = r#"{"slots":{"1":{"current":3,"max":4}}}"#;
        assert_eq!(parse_player_counts(page), None);
    }

    #[test]
    fn unparsable_numbers_default_to_zero() {
        let page = r#"{"slots":{"2":{"current":"n/a","max":50}}}"#;
        assert_eq!(parse_player_counts(page), Some((0, 50)));
    }

    #[test]
    fn quoted_numbers_count_as_zero() {
        let page = r#"{"slots":{"2":{"current":"12","max":64}}}"#;
        assert_eq!(parse_player_counts(page), Some((0, 64)));
    }

    #[test]
    fn truncated_json_still_matches() {
        let page = r#"data-server='{"slots":{"2":{"current":9,"max":32},"4":{"curr"#;
        assert_eq!(parse_player_counts(page), Some((9, 32)));
    }

    #[test]
    fn garbage_values_default_to_zero() {
        let page = r#""slots" ... "2":{"current":abc,"max":def} ..."#;
        assert_eq!(parse_player_counts(page), Some((0, 0)));
    }

    // ── PlayerCountsUpdater ───────────────────────────────────────────────────

    #[test]
    fn updater_clears_both_counts_on_miss() {
        let mut s = session();
        PlayerCountsUpdater.update_context(&mut s, r#"{"slots":{"2":{"current":5,"max":10}}}"#);
        assert_eq!(s.current_players(), Some(5));

        PlayerCountsUpdater.update_context(&mut s, "nothing here");
        assert!(s.current_players().is_none());
        assert!(s.server_max_players().is_none());
    }

    // ── parse_global_context ──────────────────────────────────────────────────

    #[test]
    fn global_context_spanning_lines() {
        let page = "<script>\nSurface.globalContext = {\n  \"session\": {\n    \"user\": {\"username\": \"SeedBot\"}\n  }\n};\nother();\n</script>";
        let ctx = parse_global_context(page).unwrap();
        assert_eq!(ctx.pointer(USERNAME_POINTER).unwrap(), "SeedBot");
    }

    #[test]
    fn global_context_missing_marker() {
        assert!(parse_global_context(r#"{"session":{}}"#).is_none());
    }

    #[test]
    fn global_context_not_an_object() {
        assert!(parse_global_context("Surface.globalContext = [1, 2];").is_none());
        assert!(parse_global_context("Surface.globalContext = {broken").is_none());
    }

    // ── LoggedInUserUpdater ───────────────────────────────────────────────────

    #[test]
    fn logged_in_user_from_page() {
        let mut s = session();
        let page = r#"Surface.globalContext = {"session":{"user":{"username":"SeedBot"}}};"#;
        LoggedInUserUpdater.update_context(&mut s, page);
        assert_eq!(s.current_logged_in_user(), "SeedBot");
    }

    #[test]
    fn logged_in_user_resets_to_sentinel() {
        let mut s = session();
        s.set_current_logged_in_user("SeedBot".to_string());
        LoggedInUserUpdater
            .update_context(&mut s, r#"Surface.globalContext = {"session":{"user":null}};"#);
        assert_eq!(s.current_logged_in_user(), NOT_LOGGED_IN);
    }
}
