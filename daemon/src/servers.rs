use serde::{Deserialize, Serialize};

use crate::event::{ContextEvent, Notifier, ServerChange};

/// A server the seeder may join, with the population window it seeds within.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// Address of the server's page (e.g. a Battlelog server URL).
    pub address: String,
    /// Human-readable name shown in logs and the status file.
    pub name: String,
    /// Lower seeding threshold.
    #[serde(default)]
    pub min_players: i32,
    /// Upper seeding threshold.
    #[serde(default)]
    pub max_players: i32,
}

/// Ordered list of configured servers plus the user's selection.
///
/// Insertion order is meaningful: the selection is an index into it. Every
/// add, remove, edit or selection is published as a [`ContextEvent::ServerChanged`].
#[derive(Debug)]
pub struct ServerList {
    servers: Vec<Server>,
    /// Raw selection as last written; may be negative or stale after a removal.
    /// Always read through [`ServerList::current_index`].
    selected: i32,
    notifier: Notifier,
}

impl ServerList {
    pub fn new(servers: Vec<Server>, selected: i32, notifier: Notifier) -> Self {
        Self { servers, selected, notifier }
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Server> {
        self.servers.get(index)
    }

    /// Appends `server` and returns its index.
    pub fn push(&mut self, server: Server) -> usize {
        self.servers.push(server);
        let index = self.servers.len() - 1;
        self.notifier.emit(ContextEvent::ServerChanged(ServerChange::Added(index)));
        index
    }

    pub fn remove(&mut self, index: usize) -> Option<Server> {
        if index >= self.servers.len() {
            return None;
        }
        let removed = self.servers.remove(index);
        self.notifier.emit(ContextEvent::ServerChanged(ServerChange::Removed(index)));
        Some(removed)
    }

    /// Edits the server at `index` in place. Returns `false` if there is no such
    /// server. A notification is only published when the edit changed something.
    pub fn update(&mut self, index: usize, edit: impl FnOnce(&mut Server)) -> bool {
        let Some(server) = self.servers.get_mut(index) else {
            return false;
        };
        let before = server.clone();
        edit(server);
        if *server != before {
            self.notifier.emit(ContextEvent::ServerChanged(ServerChange::Updated(index)));
        }
        true
    }

    /// Stores a new selection. Out-of-range values are accepted and clamped on
    /// read. A notification is only published when the effective selection moved.
    pub fn select(&mut self, index: i32) {
        let before = self.current_index();
        self.selected = index;
        let after = self.current_index();
        if let Some(current) = after.filter(|_| after != before) {
            self.notifier.emit(ContextEvent::ServerChanged(ServerChange::Selected(current)));
        }
    }

    /// The effective selection: `None` for an empty list, otherwise the stored
    /// index clamped to `0` when negative and to the last entry when past the end.
    pub fn current_index(&self) -> Option<usize> {
        if self.servers.is_empty() {
            return None;
        }
        let last = self.servers.len() - 1;
        Some((self.selected.max(0) as usize).min(last))
    }

    pub fn current(&self) -> Option<&Server> {
        self.current_index().and_then(|i| self.servers.get(i))
    }

    /// Brings the list in line with `desired` position by position, editing,
    /// appending and removing entries individually so that subscribers see each
    /// membership change.
    pub fn sync(&mut self, desired: Vec<Server>) {
        let keep = desired.len();
        for (index, wanted) in desired.into_iter().enumerate() {
            if index < self.servers.len() {
                self.update(index, |s| *s = wanted);
            } else {
                self.push(wanted);
            }
        }
        while self.servers.len() > keep {
            let last = self.servers.len() - 1;
            self.remove(last);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::Receiver;

    fn server(name: &str) -> Server {
        Server {
            address: format!("https://example.test/servers/{name}"),
            name: name.to_string(),
            min_players: 0,
            max_players: 32,
        }
    }

    fn list(names: &[&str], selected: i32) -> (ServerList, Receiver<ContextEvent>) {
        let notifier = Notifier::new();
        let rx = notifier.subscribe();
        let servers = names.iter().map(|n| server(n)).collect();
        (ServerList::new(servers, selected, notifier), rx)
    }

    fn drain(rx: &mut Receiver<ContextEvent>) -> Vec<ContextEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    // ── selection ─────────────────────────────────────────────────────────────

    #[test]
    fn empty_list_has_no_current_server() {
        let (l, _) = list(&[], 0);
        assert_eq!(l.current_index(), None);
        assert!(l.current().is_none());
    }

    #[test]
    fn negative_selection_clamps_to_first() {
        let (mut l, _) = list(&["a", "b"], 1);
        l.select(-1);
        assert_eq!(l.current_index(), Some(0));
        assert_eq!(l.current().unwrap().name, "a");
    }

    #[test]
    fn selection_past_end_clamps_to_last() {
        let (l, _) = list(&["a", "b"], 7);
        assert_eq!(l.current_index(), Some(1));
    }

    #[test]
    fn removing_selected_tail_keeps_selection_valid() {
        let (mut l, _) = list(&["a", "b", "c"], 2);
        l.remove(2);
        assert_eq!(l.current().unwrap().name, "b");
    }

    #[test]
    fn select_publishes_clamped_index() {
        let (mut l, mut rx) = list(&["a", "b"], 1);
        l.select(-5);
        assert_eq!(
            drain(&mut rx),
            vec![ContextEvent::ServerChanged(ServerChange::Selected(0))]
        );
    }

    #[test]
    fn reselecting_same_server_is_silent() {
        let (mut l, mut rx) = list(&["a", "b"], 1);
        l.select(1);
        // Past the end still lands on the last entry.
        l.select(9);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(l.current_index(), Some(1));

        l.select(0);
        assert_eq!(
            drain(&mut rx),
            vec![ContextEvent::ServerChanged(ServerChange::Selected(0))]
        );
    }

    // ── membership notifications ──────────────────────────────────────────────

    #[test]
    fn push_and_remove_publish_changes() {
        let (mut l, mut rx) = list(&["a"], 0);
        assert_eq!(l.push(server("b")), 1);
        assert_eq!(l.remove(0).unwrap().name, "a");
        assert!(l.remove(5).is_none());
        assert_eq!(
            drain(&mut rx),
            vec![
                ContextEvent::ServerChanged(ServerChange::Added(1)),
                ContextEvent::ServerChanged(ServerChange::Removed(0)),
            ]
        );
    }

    #[test]
    fn update_publishes_only_real_edits() {
        let (mut l, mut rx) = list(&["a"], 0);
        assert!(l.update(0, |s| s.max_players = 64));
        assert!(l.update(0, |s| s.max_players = 64));
        assert!(!l.update(3, |s| s.max_players = 1));
        assert_eq!(l.get(0).unwrap().max_players, 64);
        assert_eq!(
            drain(&mut rx),
            vec![ContextEvent::ServerChanged(ServerChange::Updated(0))]
        );
    }

    // ── sync ──────────────────────────────────────────────────────────────────

    #[test]
    fn sync_edits_appends_and_trims_in_place() {
        let (mut l, mut rx) = list(&["a", "b", "c"], 0);
        let mut edited = server("a");
        edited.min_players = 4;

        l.sync(vec![edited.clone(), server("b")]);
        assert_eq!(l.len(), 2);
        assert_eq!(l.get(0), Some(&edited));
        assert_eq!(
            drain(&mut rx),
            vec![
                ContextEvent::ServerChanged(ServerChange::Updated(0)),
                ContextEvent::ServerChanged(ServerChange::Removed(2)),
            ]
        );

        l.sync(vec![edited, server("b"), server("d")]);
        assert_eq!(l.get(2).unwrap().name, "d");
        assert_eq!(
            drain(&mut rx),
            vec![ContextEvent::ServerChanged(ServerChange::Added(2))]
        );
    }

    #[test]
    fn server_thresholds_default_when_missing() {
        let s: Server = toml::from_str("address = \"x\"\nname = \"Alpha\"\n").unwrap();
        assert_eq!(s.min_players, 0);
        assert_eq!(s.max_players, 0);
    }
}
