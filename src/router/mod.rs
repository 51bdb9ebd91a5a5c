pub mod predicate;
pub mod rules;

use tracing::{debug, info, warn};

use crate::config::types::VhostEntry;
use crate::config::Config;
use predicate::WorldPattern;
use rules::VhostRule;

/// 按插入顺序保存的虚拟主机规则表
#[derive(Debug, Default)]
pub struct RuleTable {
    rules: Vec<VhostRule>,
}

impl RuleTable {
    pub fn new(entries: &[VhostEntry]) -> Self {
        let mut table = Self::default();
        for entry in entries {
            table.insert(VhostRule::from_entry(entry));
        }
        info!(count = table.len(), "vhost rules loaded");
        table
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.vhosts)
    }

    pub fn from_rules(rules: impl IntoIterator<Item = VhostRule>) -> Self {
        let mut table = Self::default();
        for rule in rules {
            table.insert(rule);
        }
        table
    }

    /// 插入规则。前缀重复时替换旧规则，位置保持不变。
    pub fn insert(&mut self, rule: VhostRule) {
        let invalid = [&rule.if_in_world, &rule.if_not_in_world]
            .into_iter()
            .flatten()
            .filter(|p| !p.is_valid())
            .map(WorldPattern::as_str)
            .collect::<Vec<_>>();
        if !invalid.is_empty() {
            warn!(
                vhost = rule.key,
                patterns = ?invalid,
                "vhost has invalid world pattern, it will never apply on join"
            );
        }

        if let Some(existing) = self
            .rules
            .iter_mut()
            .find(|r| r.hostname_prefix == rule.hostname_prefix)
        {
            debug!(
                prefix = rule.hostname_prefix,
                replaced = existing.key,
                by = rule.key,
                "duplicate vhost hostname, replacing"
            );
            *existing = rule;
        } else {
            debug!(vhost = rule.key, prefix = rule.hostname_prefix, "vhost rule added");
            self.rules.push(rule);
        }
    }

    /// 所有以规则前缀开头的匹配项，按表中顺序
    pub fn match_all(&self, hostname: &str) -> Vec<&VhostRule> {
        let normalized = hostname.to_lowercase();
        let matched: Vec<&VhostRule> = self
            .rules
            .iter()
            .filter(|rule| rule.matches_normalized(&normalized))
            .collect();
        debug!(hostname = hostname, matched = matched.len(), "vhost lookup");
        matched
    }

    pub fn get(&self, hostname_prefix: &str) -> Option<&VhostRule> {
        let prefix = hostname_prefix.to_lowercase();
        self.rules.iter().find(|r| r.hostname_prefix == prefix)
    }

    pub fn rules(&self) -> &[VhostRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(rules: &[&VhostRule]) -> Vec<String> {
        rules.iter().map(|r| r.key.clone()).collect()
    }

    #[test]
    fn match_all_keeps_every_match_in_order() {
        let table = RuleTable::from_rules([
            VhostRule::new("short", "hub."),
            VhostRule::new("other", "pvp."),
            VhostRule::new("long", "hub.example"),
        ]);
        let matched = table.match_all("hub.example.com:25565");
        assert_eq!(keys(&matched), vec!["short", "long"]);
    }

    #[test]
    fn match_all_is_case_insensitive() {
        let table = RuleTable::from_rules([VhostRule::new("hub", "Hub.Example.")]);
        assert_eq!(table.match_all("HUB.EXAMPLE.COM:25565").len(), 1);
        assert_eq!(table.match_all("hub.example.com").len(), 1);
    }

    #[test]
    fn no_match_or_empty_table_is_empty() {
        assert!(RuleTable::default().match_all("hub.example.com").is_empty());
        let table = RuleTable::from_rules([VhostRule::new("hub", "hub.")]);
        assert!(table.match_all("pvp.example.com:25565").is_empty());
        assert!(table.match_all("").is_empty());
    }

    #[test]
    fn duplicate_prefix_replaces_in_place() {
        let table = RuleTable::from_rules([
            VhostRule::new("first", "hub."),
            VhostRule::new("pvp", "pvp."),
            VhostRule::new("second", "HUB."),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rules()[0].key, "second");
        assert_eq!(table.rules()[1].key, "pvp");
        assert_eq!(table.get("hub.").map(|r| r.key.as_str()), Some("second"));
    }

    #[test]
    fn from_config_keeps_rules_with_invalid_patterns() {
        let config = Config::from_yaml_str("nothing: here").unwrap();
        assert!(RuleTable::from_config(&config).is_empty());

        let config = Config::from_yaml_str(
            "vhosts:\n  a:\n    hostname: A.\n  b:\n    hostname: b.\n    ifInWorld: \"(\"\n",
        )
        .unwrap();
        let table = RuleTable::from_config(&config);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rules()[0].hostname_prefix, "a.");
        assert!(!table.rules()[1].if_in_world.as_ref().unwrap().is_valid());
    }

    #[test]
    fn empty_prefix_matches_everything() {
        let table = RuleTable::from_rules([VhostRule::new("any", "")]);
        assert_eq!(table.match_all("whatever:1").len(), 1);
    }
}
