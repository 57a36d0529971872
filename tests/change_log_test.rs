//! End-to-end tests for the persistence hooks
//!
//! Drives `ChangeLogPlugin` the way a repository would: before/after each
//! mutation, then reads the history back through the registry.

use std::sync::Arc;
use std::thread;

use entity_changelog::config::{options, Config};
use entity_changelog::registry::factory_for;
use entity_changelog::{
    Action, ChangeLogPlugin, ChangeLogSource, DecodeStatus, JsonlStore, MemoryStore, Model,
    Trackable, TrackableExt, TrackingState, TypeRegistry,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Customer {
    id: String,
    name: String,
    email: Option<String>,
    updated_at: String,
    #[serde(skip)]
    tracking: TrackingState,
    #[serde(skip)]
    actor: String,
}

impl Customer {
    fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            updated_at: "2024-01-01T00:00:00Z".into(),
            tracking: TrackingState::new(),
            actor: String::new(),
        }
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct CustomerMeta {
    actor: String,
}

impl Trackable for Customer {
    fn tracking(&self) -> &TrackingState {
        &self.tracking
    }

    fn tracking_mut(&mut self) -> &mut TrackingState {
        &mut self.tracking
    }

    fn meta(&self) -> serde_json::Result<Value> {
        if self.actor.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::to_value(CustomerMeta {
            actor: self.actor.clone(),
        })
    }

    fn created_by(&self) -> String {
        self.actor.clone()
    }
}

impl Model for Customer {
    fn primary_key(&self) -> String {
        self.id.clone()
    }

    fn as_trackable(&self) -> Option<&dyn Trackable> {
        Some(self)
    }
}

/// Same shape as `Customer`, but never opts in
#[derive(Serialize)]
struct AuditFreeCustomer {
    id: String,
    name: String,
}

impl Model for AuditFreeCustomer {
    fn primary_key(&self) -> String {
        self.id.clone()
    }
}

fn memory_plugin(config: Config) -> ChangeLogPlugin<MemoryStore> {
    ChangeLogPlugin::new(Arc::new(config), MemoryStore::new())
}

#[test]
fn create_produces_snapshot_without_diff() {
    let plugin = memory_plugin(Config::builder().compute_diff().build());
    let alice = Customer::new("42", "Alice");

    assert!(plugin.before_create(&alice));
    let record = plugin.after_create(&alice).unwrap().unwrap();

    assert_eq!(record.action(), &Action::Create);
    assert_eq!(record.object_id(), "42");
    assert_eq!(record.object_type(), "Customer");
    assert_eq!(
        serde_json::from_str::<Value>(record.raw_object()).unwrap(),
        json!({
            "id": "42",
            "name": "Alice",
            "email": null,
            "updated_at": "2024-01-01T00:00:00Z"
        })
    );
    assert_eq!(record.raw_diff(), "");
    assert!(record.diff().unwrap().is_none());
    assert_eq!(plugin.store().len().unwrap(), 1);
}

#[test]
fn update_with_diff_records_old_and_new() {
    let plugin = memory_plugin(Config::builder().compute_diff().build());
    let mut customer = Customer::new("42", "Alice");
    plugin.after_create(&customer).unwrap();

    let prior = plugin.before_update(&customer).unwrap();
    assert!(prior.value().is_some());
    customer.name = "Bob".into();
    let record = plugin.after_update(prior, &customer).unwrap().unwrap();

    assert_eq!(record.action(), &Action::Update);
    assert_eq!(
        serde_json::from_str::<Value>(record.raw_diff()).unwrap(),
        json!({"name": {"old": "Alice", "new": "Bob"}})
    );

    let diff = record.diff().unwrap().unwrap();
    assert_eq!(diff.fields(), vec!["name"]);
}

#[test]
fn lazy_update_skips_ignored_field_changes() {
    let plugin = memory_plugin(
        Config::builder()
            .compute_diff()
            .lazy_update(["updated_at"])
            .build(),
    );
    let mut customer = Customer::new("42", "Alice");
    plugin.after_create(&customer).unwrap();

    let prior = plugin.before_update(&customer).unwrap();
    customer.updated_at = "2024-06-01T00:00:00Z".into();
    assert!(plugin.after_update(prior, &customer).unwrap().is_none());

    let prior = plugin.before_update(&customer).unwrap();
    customer.email = Some("alice@example.com".into());
    customer.updated_at = "2024-07-01T00:00:00Z".into();
    let record = plugin.after_update(prior, &customer).unwrap().unwrap();

    let diff = record.diff().unwrap().unwrap();
    assert_eq!(diff.fields(), vec!["email", "updated_at"]);
    assert_eq!(plugin.records("42", false).unwrap().len(), 2);
}

#[test]
fn update_without_options_skips_prior_snapshot() {
    let plugin = memory_plugin(Config::default());
    let mut customer = Customer::new("42", "Alice");

    let prior = plugin.before_update(&customer).unwrap();
    assert!(prior.value().is_none());

    customer.name = "Bob".into();
    let record = plugin.after_update(prior, &customer).unwrap().unwrap();
    assert_eq!(record.raw_diff(), "");
}

#[test]
fn delete_keeps_last_snapshot() {
    let plugin = memory_plugin(Config::default());
    let customer = Customer::new("42", "Alice");

    assert!(plugin.before_delete(&customer));
    let record = plugin.after_delete(&customer).unwrap().unwrap();

    assert_eq!(record.action(), &Action::Delete);
    assert_eq!(
        serde_json::from_str::<Value>(record.raw_object()).unwrap()["name"],
        "Alice"
    );
    assert_eq!(record.raw_meta(), "null");
}

#[test]
fn untracked_entities_are_never_logged() {
    let plugin = memory_plugin(Config::builder().compute_diff().build());

    let plain = AuditFreeCustomer {
        id: "1".into(),
        name: "Plain".into(),
    };
    assert!(!plugin.before_create(&plain));
    assert!(plugin.after_create(&plain).unwrap().is_none());
    let prior = plugin.before_update(&plain).unwrap();
    assert!(plugin.after_update(prior, &plain).unwrap().is_none());
    assert!(plugin.after_delete(&plain).unwrap().is_none());

    let mut muted = Customer::new("2", "Muted");
    muted.set_tracked(false);
    assert!(plugin.after_create(&muted).unwrap().is_none());
    let prior = plugin.before_update(&muted).unwrap();
    muted.name = "Still muted".into();
    assert!(plugin.after_update(prior, &muted).unwrap().is_none());
    assert!(plugin.after_delete(&muted).unwrap().is_none());

    assert!(plugin.store().is_empty().unwrap());
}

#[test]
fn prepared_records_decode_through_registry() {
    let config = Config::builder()
        .register_object_type::<Customer>("Customer")
        .register_meta_type::<CustomerMeta>("Customer")
        .build();
    let plugin = memory_plugin(config);

    let mut customer = Customer::new("42", "Alice");
    customer.email = Some("alice@example.com".into());
    customer.actor = "support".into();
    plugin.after_create(&customer).unwrap();

    let record = plugin.last_record("42", true).unwrap().unwrap();
    let decoded = record.object_as::<Customer>().unwrap();
    assert_eq!(decoded.id, customer.id);
    assert_eq!(decoded.name, customer.name);
    assert_eq!(decoded.email, customer.email);
    assert_eq!(decoded.updated_at, customer.updated_at);
    assert_eq!(
        record.meta_as::<CustomerMeta>(),
        Some(&CustomerMeta {
            actor: "support".into()
        })
    );
    assert_eq!(record.created_by(), "support");

    let unprepared = plugin.last_record("42", false).unwrap().unwrap();
    assert!(unprepared.object().is_none());
}

#[test]
fn unregistered_type_keeps_raw_object() {
    let plugin = memory_plugin(Config::default());
    plugin.after_create(&Customer::new("42", "Alice")).unwrap();

    let mut record = plugin.last_record("42", true).unwrap().unwrap();
    assert!(record.object().is_none());
    assert!(record.raw_object().contains("Alice"));

    let status = record.decode_object(&TypeRegistry::new()).unwrap();
    assert_eq!(status, DecodeStatus::NotRegistered);
}

#[test]
fn decode_failure_leaves_object_unset() {
    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Strict {
        id: u64,
    }

    let config = Config::with_options([options::register_object_types([(
        "Customer",
        factory_for::<Strict>(),
    )])]);
    let plugin = memory_plugin(config);
    plugin.after_create(&Customer::new("42", "Alice")).unwrap();

    let records = plugin.records("42", true).unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].object().is_none());
    assert!(records[0].raw_object().contains("\"42\""));
}

#[test]
fn secondary_index_and_author_are_queryable() {
    let plugin = memory_plugin(Config::default());

    let mut first = Customer::new("1", "First");
    first.tracking = TrackingState::with_secondary_index("tenant-a");
    first.actor = "alice".into();
    let mut second = Customer::new("2", "Second");
    second.tracking = TrackingState::with_secondary_index("tenant-a");
    second.actor = "bob".into();

    plugin.after_create(&first).unwrap();
    plugin.after_create(&second).unwrap();

    let by_tenant = plugin.store().by_object_id2("tenant-a").unwrap();
    assert_eq!(by_tenant.len(), 2);
    let by_bob = plugin.store().by_created_by("bob").unwrap();
    assert_eq!(by_bob.len(), 1);
    assert_eq!(by_bob[0].object_id(), "2");
}

#[test]
fn jsonl_history_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("changes.jsonl");
    let config = Arc::new(
        Config::builder()
            .compute_diff()
            .register_object_type::<Customer>("Customer")
            .build(),
    );

    let plugin = ChangeLogPlugin::new(Arc::clone(&config), JsonlStore::new(path.clone()));
    let mut customer = Customer::new("42", "Alice");
    plugin.after_create(&customer).unwrap();
    let prior = plugin.before_update(&customer).unwrap();
    customer.name = "Bob".into();
    plugin.after_update(prior, &customer).unwrap();
    plugin.after_delete(&customer).unwrap();

    let reopened = ChangeLogPlugin::new(config, JsonlStore::new(path));
    let history = reopened.records("42", true).unwrap();
    let actions: Vec<_> = history.iter().map(|r| r.action().clone()).collect();
    assert_eq!(actions, vec![Action::Create, Action::Update, Action::Delete]);

    let update = &history[1];
    let diff = update.diff().unwrap().unwrap();
    assert_eq!(diff.get("name").unwrap().new, json!("Bob"));
    assert_eq!(update.object_as::<Customer>().unwrap().name, "Bob");
}

#[test]
fn concurrent_mutations_share_one_plugin() {
    let plugin = Arc::new(memory_plugin(
        Config::builder()
            .compute_diff()
            .lazy_update(["updated_at"])
            .build(),
    ));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let plugin = Arc::clone(&plugin);
            thread::spawn(move || {
                for i in 0..10 {
                    let mut customer = Customer::new(&format!("{}-{}", t, i), "Start");
                    plugin.after_create(&customer).unwrap();
                    let prior = plugin.before_update(&customer).unwrap();
                    customer.name = "End".into();
                    plugin.after_update(prior, &customer).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(plugin.store().len().unwrap(), 80);
    assert_eq!(plugin.records("2-9", false).unwrap().len(), 2);
}

#[test]
fn concurrent_mutations_keep_jsonl_history_readable() {
    let temp_dir = TempDir::new().unwrap();
    let plugin = Arc::new(ChangeLogPlugin::new(
        Arc::new(Config::default()),
        JsonlStore::new(temp_dir.path().join("changes.jsonl")),
    ));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let plugin = Arc::clone(&plugin);
            thread::spawn(move || {
                for i in 0..100 {
                    let customer = Customer::new(&format!("{}-{}", t, i), "Concurrent");
                    plugin.after_create(&customer).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(plugin.store().all().unwrap().len(), 800);
    assert!(plugin.last_record("5-99", false).unwrap().is_some());
}

#[test]
fn stores_agree_on_unset_secondary_keys() {
    let temp_dir = TempDir::new().unwrap();
    let memory = memory_plugin(Config::default());
    let jsonl = ChangeLogPlugin::new(
        Arc::new(Config::default()),
        JsonlStore::new(temp_dir.path().join("changes.jsonl")),
    );

    let anonymous = Customer::new("1", "Anonymous");
    let mut tagged = Customer::new("2", "Tagged");
    tagged.tracking = TrackingState::with_secondary_index("tenant-a");
    tagged.actor = "alice".into();

    for customer in [&anonymous, &tagged] {
        memory.after_create(customer).unwrap();
        jsonl.after_create(customer).unwrap();
    }

    assert!(memory.store().by_object_id2("").unwrap().is_empty());
    assert!(jsonl.store().by_object_id2("").unwrap().is_empty());
    assert!(memory.store().by_created_by("").unwrap().is_empty());
    assert!(jsonl.store().by_created_by("").unwrap().is_empty());
    assert_eq!(
        memory.store().by_created_by("alice").unwrap().len(),
        jsonl.store().by_created_by("alice").unwrap().len()
    );
}
