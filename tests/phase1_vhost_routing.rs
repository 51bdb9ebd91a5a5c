//! Phase 1: 虚拟主机匹配 + 命令分发端到端测试

use std::path::Path;
use std::sync::{Arc, Mutex};

use vhostcmd::config::Config;
use vhostcmd::{
    CommandSink, ConnectionEvents, DispatchReport, IconLoader, JoinOutcome, RuleTable, VhostError,
    VhostService,
};

#[derive(Default)]
struct RecordingSink {
    commands: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.commands.lock().unwrap())
    }
}

impl CommandSink for RecordingSink {
    fn dispatch_command(&self, command: &str) -> anyhow::Result<()> {
        self.commands.lock().unwrap().push(command.to_string());
        if command.starts_with("fail") {
            anyhow::bail!("unknown command: {}", command);
        }
        Ok(())
    }
}

struct StubIcons;

impl IconLoader for StubIcons {
    fn load_icon(&self, path: &Path) -> Result<Vec<u8>, VhostError> {
        match path.to_str() {
            Some("hub.png") => Ok(b"hub-icon".to_vec()),
            _ => Err(VhostError::IconLoad {
                path: path.display().to_string(),
                reason: "not found".into(),
            }),
        }
    }
}

fn service_from_yaml(yaml: &str) -> (VhostService, Arc<RecordingSink>) {
    let config = Config::from_yaml_str(yaml).unwrap();
    let sink = Arc::new(RecordingSink::default());
    let service = VhostService::from_config(&config, sink.clone(), Arc::new(StubIcons));
    (service, sink)
}

const PVP_CONFIG: &str = r#"
vhosts:
  pvp:
    hostname: "pvp."
    commands:
      - "tp %player% arena"
    ifNotInWorld: "lobby"
"#;

#[test]
fn pvp_join_outside_lobby_teleports() {
    let (service, sink) = service_from_yaml(PVP_CONFIG);
    service.on_login("Bob", "pvp.example.com:25565");
    service.on_join("Bob", "world");
    assert_eq!(sink.take(), vec!["tp Bob arena"]);
}

#[test]
fn pvp_join_in_lobby_is_excluded() {
    let (service, sink) = service_from_yaml(PVP_CONFIG);
    service.on_login("Bob", "pvp.example.com:25565");
    let outcome = service.on_join("Bob", "lobby");
    assert_eq!(
        outcome,
        JoinOutcome::Evaluated {
            matched: 1,
            applied: 0,
            dispatch: DispatchReport::default(),
        }
    );
    assert!(sink.take().is_empty());
}

#[test]
fn overlapping_prefixes_dispatch_all_in_table_order() {
    let (service, sink) = service_from_yaml(
        r#"
vhosts:
  generic:
    hostname: "hub."
    commands: ["say generic %player%"]
  specific:
    hostname: "hub.example"
    commands: ["say specific %hostname% %port%"]
  unrelated:
    hostname: "pvp."
    commands: ["say pvp"]
"#,
    );
    service.on_login("Alice", "hub.example.com:25565");
    service.on_join("Alice", "world");
    assert_eq!(
        sink.take(),
        vec!["say generic Alice", "say specific hub.example.com 25565"]
    );
}

#[test]
fn hostname_matching_ignores_case() {
    let (service, sink) = service_from_yaml(
        "vhosts:\n  hub:\n    hostname: HUB.Example.\n    commands: [\"spawn %player%\"]\n",
    );
    service.on_login("Alice", "Hub.EXAMPLE.com:25565");
    service.on_join("Alice", "world");
    assert_eq!(sink.take(), vec!["spawn Alice"]);
}

#[test]
fn in_world_and_not_in_world_combine() {
    let (service, sink) = service_from_yaml(
        r#"
vhosts:
  arena:
    hostname: "arena."
    commands: ["kit pvp %player%"]
    ifInWorld: "arena.*"
    ifNotInWorld: "arena_closed"
"#,
    );
    for (player, world) in [("A", "arena_1"), ("B", "ARENA_2"), ("C", "arena_closed"), ("D", "hub")] {
        service.on_login(player, "arena.example.com:25565");
        service.on_join(player, world);
    }
    assert_eq!(sink.take(), vec!["kit pvp A", "kit pvp B"]);
}

#[test]
fn invalid_pattern_only_skips_its_rule() {
    let (service, sink) = service_from_yaml(
        r#"
vhosts:
  broken:
    hostname: "hub."
    commands: ["say broken"]
    ifInWorld: "world("
  fine:
    hostname: "hub.example"
    commands: ["say fine"]
"#,
    );
    service.on_login("Alice", "hub.example.com:25565");
    let outcome = service.on_join("Alice", "world(");
    assert_eq!(
        outcome,
        JoinOutcome::Evaluated {
            matched: 2,
            applied: 1,
            dispatch: DispatchReport { submitted: 1, failed: 0 },
        }
    );
    assert_eq!(sink.take(), vec!["say fine"]);
}

#[test]
fn failed_command_does_not_stop_other_commands_or_rules() {
    let (service, sink) = service_from_yaml(
        r#"
vhosts:
  first:
    hostname: "hub."
    commands: ["fail now", "say after %player%"]
  second:
    hostname: "hub.example"
    commands: ["say second"]
"#,
    );
    service.on_login("Alice", "hub.example.com:25565");
    let outcome = service.on_join("Alice", "world");
    assert_eq!(
        outcome,
        JoinOutcome::Evaluated {
            matched: 2,
            applied: 2,
            dispatch: DispatchReport { submitted: 2, failed: 1 },
        }
    );
    assert_eq!(sink.take(), vec!["fail now", "say after Alice", "say second"]);
}

#[test]
fn join_without_login_and_after_quit_is_harmless() {
    let (service, sink) = service_from_yaml(PVP_CONFIG);
    assert_eq!(service.on_join("Bob", "world"), JoinOutcome::NoSession);

    service.on_login("Bob", "pvp.example.com:25565");
    service.on_quit("Bob");
    assert!(service.sessions().get("Bob").is_none());
    assert_eq!(service.on_join("Bob", "world"), JoinOutcome::NoSession);
    assert!(sink.take().is_empty());
}

#[test]
fn no_match_runs_nothing() {
    let (service, sink) = service_from_yaml(PVP_CONFIG);
    service.on_login("Bob", "hub.example.com:25565");
    let outcome = service.on_join("Bob", "world");
    assert_eq!(
        outcome,
        JoinOutcome::Evaluated {
            matched: 0,
            applied: 0,
            dispatch: DispatchReport::default(),
        }
    );
    assert!(sink.take().is_empty());
}

#[test]
fn hostname_without_port_still_expands() {
    let (service, sink) = service_from_yaml(
        "vhosts:\n  hub:\n    hostname: hub.\n    commands: [\"say %hostname%|%port%\"]\n",
    );
    service.on_login("Alice", "hub.example.com");
    service.on_join("Alice", "world");
    assert_eq!(sink.take(), vec!["say hub.example.com|"]);
}

#[test]
fn status_query_uses_last_motd_and_loaded_icon() {
    let (service, _) = service_from_yaml(
        r#"
vhosts:
  hub:
    hostname: "hub."
    motd: "Hub"
    icon: "hub.png"
  hub-event:
    hostname: "hub.example"
    motd: "Event hub"
    icon: "missing.png"
"#,
    );
    let status = service.on_status_query(Some("hub.example.com"));
    assert_eq!(status.motd.as_deref(), Some("Event hub"));
    assert_eq!(status.icon.as_deref(), Some(&b"hub-icon"[..]));

    assert!(service.on_status_query(None).is_empty());
    assert!(service.on_status_query(Some("")).is_empty());
    assert!(service.on_status_query(Some("pvp.example.com")).is_empty());
}

#[test]
fn missing_vhosts_section_means_no_rules() {
    let (service, sink) = service_from_yaml("log:\n  level: debug\n");
    assert!(service.rules().is_empty());
    service.on_login("Bob", "pvp.example.com:25565");
    service.on_join("Bob", "world");
    assert!(sink.take().is_empty());

    let config = Config::from_yaml_str("vhosts: 7").unwrap();
    assert!(RuleTable::from_config(&config).is_empty());
}
