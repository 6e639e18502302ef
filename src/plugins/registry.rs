//! Plugin registry - owns all live plugin instances
//!
//! The registry is the single owner of every registered plugin. All
//! mutations go through `&mut self` on one control thread; there is no
//! internal locking (management runs sequentially in response to config or
//! admin commands).

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::application::errors::RegistryError;
use super::factory::FactoryTable;
use super::trait_def::{CommandSink, HookEvent, HookFn, Plugin, Watch};

/// A registered plugin and the context it was constructed with
pub struct PluginEntry {
    instance: Arc<dyn Plugin>,
    config: serde_json::Value,
    module: String,
    package: String,
}

struct WatchEntry {
    owner: String,
    callback: HookFn,
}

/// Registry for managing plugin lifecycle
pub struct PluginRegistry {
    entries: HashMap<String, PluginEntry>,
    packages: HashMap<String, FactoryTable>,
    default_package: String,
    on_register: HashMap<String, Vec<WatchEntry>>,
    on_unregister: HashMap<String, Vec<WatchEntry>>,
    sink: Option<Arc<dyn CommandSink>>,
}

impl PluginRegistry {
    /// Create a registry whose default package is `default_package`
    pub fn new(default_package: impl Into<String>, table: FactoryTable) -> Self {
        let default_package = default_package.into();
        let mut packages = HashMap::new();
        packages.insert(default_package.clone(), table);
        Self {
            entries: HashMap::new(),
            packages,
            default_package,
            on_register: HashMap::new(),
            on_unregister: HashMap::new(),
            sink: None,
        }
    }

    /// Add another factory package, replacing any table under the same name
    pub fn add_package(&mut self, name: impl Into<String>, table: FactoryTable) {
        let name = name.into();
        debug!("Added package {}", name);
        self.packages.insert(name, table);
    }

    /// Attach the host command table; bound for the registry's lifetime
    pub fn bind_sink(&mut self, sink: Arc<dyn CommandSink>) {
        self.sink = Some(sink);
    }

    /// Construct and register the plugin `name` from its factory
    ///
    /// Returns `Ok(false)` without touching anything when `name` is already
    /// registered. Construction and lookup failures come back as typed
    /// errors; the caller decides whether to log and move on.
    pub fn register(&mut self, name: &str, config: serde_json::Value) -> Result<bool, RegistryError> {
        self.register_with(name, config, None, None)
    }

    /// `register` with explicit factory resolution
    ///
    /// `module` defaults to `name`, `package` to the registry's default
    /// package.
    pub fn register_with(
        &mut self,
        name: &str,
        config: serde_json::Value,
        module: Option<&str>,
        package: Option<&str>,
    ) -> Result<bool, RegistryError> {
        if self.entries.contains_key(name) {
            return Ok(false);
        }

        let package = package.unwrap_or(&self.default_package).to_string();
        let module = module.unwrap_or(name).to_string();

        let table = self
            .packages
            .get(&package)
            .ok_or_else(|| RegistryError::UnknownPackage(package.clone()))?;
        let factory = table.get(&module).ok_or_else(|| RegistryError::UnknownPlugin {
            package: package.clone(),
            module: module.clone(),
        })?;

        let instance: Arc<dyn Plugin> = Arc::from(factory(&config)?);
        self.insert_entry(name, PluginEntry { instance, config, module, package })?;
        Ok(true)
    }

    /// Store an already-constructed instance under `name`
    ///
    /// The dictionary-assignment analog. The instance's own `name()` must
    /// match the key; a mismatch is a programmer error and is returned as
    /// `NameMismatch` with the registry unmodified.
    pub fn insert(&mut self, name: &str, instance: Arc<dyn Plugin>) -> Result<(), RegistryError> {
        let entry = PluginEntry {
            instance,
            config: serde_json::json!({}),
            module: name.to_string(),
            package: self.default_package.clone(),
        };
        self.insert_entry(name, entry)
    }

    fn insert_entry(&mut self, name: &str, entry: PluginEntry) -> Result<(), RegistryError> {
        if entry.instance.name() != name {
            return Err(RegistryError::NameMismatch {
                expected: name.to_string(),
                actual: entry.instance.name().to_string(),
            });
        }
        if self.entries.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }

        self.adopt_watches(name, entry.instance.as_ref());

        // Commands are bound before the plugin is visible, so it is never
        // registered without its commands.
        if let Some(sink) = &self.sink {
            let commands = entry.instance.commands();
            if !commands.is_empty() {
                sink.bind_commands(name, commands);
            }
        }

        entry.instance.on_register();

        if let Some(watchers) = self.on_register.get(name) {
            for watcher in watchers {
                (watcher.callback)(entry.instance.as_ref());
            }
        }

        self.entries.insert(name.to_string(), entry);
        debug!("{} registered", name);
        Ok(())
    }

    /// Record the watches declared by a plugin being inserted under `owner`
    fn adopt_watches(&mut self, owner: &str, instance: &dyn Plugin) {
        for watch in instance.watches() {
            let Watch { target, event, callback } = watch;
            match event {
                HookEvent::Register => {
                    // Already-registered target: fire now, and again on any
                    // future fresh registration.
                    if let Some(existing) = self.entries.get(&target) {
                        callback(existing.instance.as_ref());
                    }
                    self.on_register
                        .entry(target)
                        .or_default()
                        .push(WatchEntry { owner: owner.to_string(), callback });
                }
                HookEvent::Unregister => {
                    self.on_unregister
                        .entry(target)
                        .or_default()
                        .push(WatchEntry { owner: owner.to_string(), callback });
                }
            }
        }
    }

    /// Remove the plugin `name`, running the teardown path
    ///
    /// Absent names log a warning and return `false`; nothing else changes.
    pub fn unregister(&mut self, name: &str) -> bool {
        let Some(entry) = self.entries.remove(name) else {
            warn!("Plugin not registered: {}", name);
            return false;
        };

        // Commands go first: the plugin must not be reachable through the
        // command table once teardown has started.
        if let Some(sink) = &self.sink {
            sink.unbind_commands(name);
        }

        entry.instance.on_unregister();

        if let Some(watchers) = self.on_unregister.get(name) {
            for watcher in watchers {
                (watcher.callback)(entry.instance.as_ref());
            }
        }

        self.purge_watches(name);
        info!("{} unregistered", name);
        true
    }

    /// Drop all watches owned by a departing plugin from both tables
    fn purge_watches(&mut self, owner: &str) {
        for table in [&mut self.on_register, &mut self.on_unregister] {
            for watchers in table.values_mut() {
                watchers.retain(|w| w.owner != owner);
            }
            table.retain(|_, watchers| !watchers.is_empty());
        }
    }

    /// Register every name in `include` minus `exclude`
    ///
    /// Each plugin gets its entry from `configs`, or an empty config.
    /// Returns the per-name outcome so the caller can log or abort.
    pub fn register_many(
        &mut self,
        include: &[String],
        exclude: &[String],
        configs: &HashMap<String, serde_json::Value>,
    ) -> Vec<(String, Result<bool, RegistryError>)> {
        let mut results = Vec::new();
        for name in include {
            if exclude.contains(name) {
                continue;
            }
            let config = configs
                .get(name)
                .cloned()
                .unwrap_or_else(|| serde_json::json!({}));
            let outcome = self.register(name, config);
            results.push((name.clone(), outcome));
        }
        results
    }

    /// Tear down and re-construct the plugin `name`
    ///
    /// Keeps the config it was registered with unless `config` overrides it.
    /// Any plugin state outside the config is lost.
    pub fn reload(&mut self, name: &str, config: Option<serde_json::Value>) -> Result<(), RegistryError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))?;
        let config = config.unwrap_or_else(|| entry.config.clone());
        let module = entry.module.clone();
        let package = entry.package.clone();

        self.unregister(name);
        self.register_with(name, config, Some(&module), Some(&package))?;
        Ok(())
    }

    /// Reload every registered plugin, continuing past failures
    pub fn reload_all(&mut self) {
        // Snapshot: the entry set mutates while we reload.
        let names = self.names();
        for name in names {
            if let Err(e) = self.reload(&name, None) {
                error!("Error while reloading plugin {}: {}", name, e);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.entries.get(name).map(|e| e.instance.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Config the plugin was constructed with
    pub fn config_of(&self, name: &str) -> Option<&serde_json::Value> {
        self.entries.get(name).map(|e| &e.config)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Command;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Counts lifecycle transitions; shared with the test through Arcs
    struct Probe {
        name: String,
        registered: Arc<AtomicUsize>,
        unregistered: Arc<AtomicUsize>,
        watches: Vec<Watch>,
    }

    impl Plugin for Probe {
        fn name(&self) -> &str {
            &self.name
        }

        fn on_register(&self) {
            self.registered.fetch_add(1, Ordering::SeqCst);
        }

        fn on_unregister(&self) {
            self.unregistered.fetch_add(1, Ordering::SeqCst);
        }

        fn watches(&self) -> Vec<Watch> {
            self.watches.clone()
        }
    }

    struct ProbeHandle {
        registered: Arc<AtomicUsize>,
        unregistered: Arc<AtomicUsize>,
    }

    fn probe_table(name: &str) -> (FactoryTable, ProbeHandle) {
        let registered = Arc::new(AtomicUsize::new(0));
        let unregistered = Arc::new(AtomicUsize::new(0));
        let handle = ProbeHandle {
            registered: registered.clone(),
            unregistered: unregistered.clone(),
        };
        let name = name.to_string();
        let table = FactoryTable::new().with(name.clone(), move |_cfg| {
            Ok(Box::new(Probe {
                name: name.clone(),
                registered: registered.clone(),
                unregistered: unregistered.clone(),
                watches: Vec::new(),
            }) as Box<dyn Plugin>)
        });
        (table, handle)
    }

    #[test]
    fn test_register_constructs_and_fires_hook_once() {
        let (table, handle) = probe_table("Probe");
        let mut registry = PluginRegistry::new("builtin", table);

        assert!(registry.register("Probe", json!({"x": 1})).unwrap());
        assert!(registry.contains("Probe"));
        assert_eq!(registry.get("Probe").unwrap().name(), "Probe");
        assert_eq!(registry.config_of("Probe"), Some(&json!({"x": 1})));
        assert_eq!(handle.registered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_register_present_name_is_noop() {
        let (table, handle) = probe_table("Probe");
        let mut registry = PluginRegistry::new("builtin", table);

        assert!(registry.register("Probe", json!({"x": 1})).unwrap());
        assert!(!registry.register("Probe", json!({"x": 2})).unwrap());

        // Contents and hook counts unchanged
        assert_eq!(registry.config_of("Probe"), Some(&json!({"x": 1})));
        assert_eq!(handle.registered.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_unknown_module_fails() {
        let mut registry = PluginRegistry::new("builtin", FactoryTable::new());
        let err = registry.register("Ghost", json!({})).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownPlugin { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_unknown_package_fails() {
        let (table, _) = probe_table("Probe");
        let mut registry = PluginRegistry::new("builtin", table);
        let err = registry
            .register_with("Probe", json!({}), None, Some("extras"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownPackage(_)));
    }

    #[test]
    fn test_register_with_module_override() {
        let (table, _) = probe_table("Probe");
        let mut registry = PluginRegistry::new("builtin", FactoryTable::new());
        registry.add_package("extras", table);

        // Key mismatch with the instance name is rejected
        let err = registry
            .register_with("Renamed", json!({}), Some("Probe"), Some("extras"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::NameMismatch { .. }));
        assert!(registry.is_empty());

        assert!(registry
            .register_with("Probe", json!({}), Some("Probe"), Some("extras"))
            .unwrap());
    }

    #[test]
    fn test_construct_failure_is_typed_and_leaves_registry_empty() {
        let table = FactoryTable::new().with("Broken", |_cfg| {
            Err(RegistryError::Construct("Broken".to_string(), "boom".to_string()))
        });
        let mut registry = PluginRegistry::new("builtin", table);

        let err = registry.register("Broken", json!({})).unwrap_err();
        assert!(matches!(err, RegistryError::Construct(..)));
        assert!(!registry.contains("Broken"));
    }

    #[test]
    fn test_unregister_fires_hook_and_removes() {
        let (table, handle) = probe_table("Probe");
        let mut registry = PluginRegistry::new("builtin", table);
        registry.register("Probe", json!({})).unwrap();

        assert!(registry.unregister("Probe"));
        assert!(!registry.contains("Probe"));
        assert_eq!(handle.unregistered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let (table, handle) = probe_table("Probe");
        let mut registry = PluginRegistry::new("builtin", table);
        registry.register("Probe", json!({})).unwrap();

        assert!(!registry.unregister("Ghost"));
        assert_eq!(registry.names(), vec!["Probe".to_string()]);
        assert_eq!(handle.unregistered.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_insert_name_mismatch_rejected() {
        let mut registry = PluginRegistry::new("builtin", FactoryTable::new());
        let plugin = Arc::new(Probe {
            name: "Probe".to_string(),
            registered: Arc::new(AtomicUsize::new(0)),
            unregistered: Arc::new(AtomicUsize::new(0)),
            watches: Vec::new(),
        });

        let err = registry.insert("Other", plugin.clone()).unwrap_err();
        assert!(matches!(err, RegistryError::NameMismatch { .. }));
        assert!(registry.is_empty());

        registry.insert("Probe", plugin).unwrap();
        assert!(registry.contains("Probe"));
    }

    #[test]
    fn test_insert_duplicate_rejected() {
        let (table, _) = probe_table("Probe");
        let mut registry = PluginRegistry::new("builtin", table);
        registry.register("Probe", json!({})).unwrap();

        let dup = Arc::new(Probe {
            name: "Probe".to_string(),
            registered: Arc::new(AtomicUsize::new(0)),
            unregistered: Arc::new(AtomicUsize::new(0)),
            watches: Vec::new(),
        });
        let err = registry.insert("Probe", dup).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered(_)));
    }

    fn watcher_table(
        watch_target: &str,
    ) -> (FactoryTable, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let seen_register = Arc::new(AtomicUsize::new(0));
        let seen_unregister = Arc::new(AtomicUsize::new(0));
        let target = watch_target.to_string();
        let reg = seen_register.clone();
        let unreg = seen_unregister.clone();
        let table = FactoryTable::new().with("Watcher", move |_cfg| {
            let reg = reg.clone();
            let unreg = unreg.clone();
            Ok(Box::new(Probe {
                name: "Watcher".to_string(),
                registered: Arc::new(AtomicUsize::new(0)),
                unregistered: Arc::new(AtomicUsize::new(0)),
                watches: vec![
                    Watch::on_register(target.clone(), move |_p| {
                        reg.fetch_add(1, Ordering::SeqCst);
                    }),
                    Watch::on_unregister(target.clone(), move |_p| {
                        unreg.fetch_add(1, Ordering::SeqCst);
                    }),
                ],
            }) as Box<dyn Plugin>)
        });
        (table, seen_register, seen_unregister)
    }

    #[test]
    fn test_watch_fires_immediately_when_target_present() {
        let (probe, _) = probe_table("Probe");
        let (watcher, seen_register, _) = watcher_table("Probe");
        let mut registry = PluginRegistry::new("builtin", probe);
        registry.add_package("watchers", watcher);

        registry.register("Probe", json!({})).unwrap();
        registry
            .register_with("Watcher", json!({}), None, Some("watchers"))
            .unwrap();

        assert_eq!(seen_register.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_watch_fires_on_each_fresh_registration() {
        let (probe, _) = probe_table("Probe");
        let (watcher, seen_register, seen_unregister) = watcher_table("Probe");
        let mut registry = PluginRegistry::new("builtin", probe);
        registry.add_package("watchers", watcher);

        registry
            .register_with("Watcher", json!({}), None, Some("watchers"))
            .unwrap();
        // Target not yet registered: nothing fired at adoption
        assert_eq!(seen_register.load(Ordering::SeqCst), 0);

        registry.register("Probe", json!({})).unwrap();
        assert_eq!(seen_register.load(Ordering::SeqCst), 1);

        // No-op re-registration does not fire
        registry.register("Probe", json!({})).unwrap();
        assert_eq!(seen_register.load(Ordering::SeqCst), 1);

        registry.unregister("Probe");
        assert_eq!(seen_unregister.load(Ordering::SeqCst), 1);

        registry.register("Probe", json!({})).unwrap();
        assert_eq!(seen_register.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_watches_purged_when_subscriber_unregisters() {
        let (probe, _) = probe_table("Probe");
        let (watcher, seen_register, _) = watcher_table("Probe");
        let mut registry = PluginRegistry::new("builtin", probe);
        registry.add_package("watchers", watcher);

        registry
            .register_with("Watcher", json!({}), None, Some("watchers"))
            .unwrap();
        registry.unregister("Watcher");

        // Stale subscription must not fire
        registry.register("Probe", json!({})).unwrap();
        assert_eq!(seen_register.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reload_preserves_config_and_refreshes_instance() {
        let (table, handle) = probe_table("Probe");
        let mut registry = PluginRegistry::new("builtin", table);
        registry.register("Probe", json!({"x": 1})).unwrap();
        let before = registry.get("Probe").unwrap();

        registry.reload("Probe", None).unwrap();

        let after = registry.get("Probe").unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(registry.config_of("Probe"), Some(&json!({"x": 1})));
        assert_eq!(handle.registered.load(Ordering::SeqCst), 2);
        assert_eq!(handle.unregistered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reload_with_config_override() {
        let (table, _) = probe_table("Probe");
        let mut registry = PluginRegistry::new("builtin", table);
        registry.register("Probe", json!({"x": 1})).unwrap();

        registry.reload("Probe", Some(json!({"x": 2}))).unwrap();
        assert_eq!(registry.config_of("Probe"), Some(&json!({"x": 2})));
    }

    #[test]
    fn test_reload_unregistered_fails() {
        let mut registry = PluginRegistry::new("builtin", FactoryTable::new());
        let err = registry.reload("Ghost", None).unwrap_err();
        assert!(matches!(err, RegistryError::NotRegistered(_)));
    }

    #[test]
    fn test_reload_all_reloads_every_plugin() {
        let (a, handle_a) = probe_table("A");
        let (b, handle_b) = probe_table("B");
        let mut registry = PluginRegistry::new("builtin", a);
        registry.add_package("extra", b);
        registry.register("A", json!({})).unwrap();
        registry
            .register_with("B", json!({}), None, Some("extra"))
            .unwrap();

        registry.reload_all();

        assert_eq!(registry.len(), 2);
        assert_eq!(handle_a.registered.load(Ordering::SeqCst), 2);
        assert_eq!(handle_b.registered.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_register_many_skips_excluded_and_reports() {
        let (a, _) = probe_table("A");
        let mut registry = PluginRegistry::new("builtin", a);

        let mut configs = HashMap::new();
        configs.insert("A".to_string(), json!({"x": 9}));

        let results = registry.register_many(
            &["A".to_string(), "Skip".to_string(), "Ghost".to_string()],
            &["Skip".to_string()],
            &configs,
        );

        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|(n, r)| n == "A" && matches!(r, Ok(true))));
        assert!(results.iter().any(|(n, r)| n == "Ghost" && r.is_err()));
        assert_eq!(registry.config_of("A"), Some(&json!({"x": 9})));
        assert!(!registry.contains("Skip"));
    }

    #[test]
    fn test_register_many_defaults_to_empty_config() {
        let (a, _) = probe_table("A");
        let mut registry = PluginRegistry::new("builtin", a);

        registry.register_many(&["A".to_string()], &[], &HashMap::new());
        assert_eq!(registry.config_of("A"), Some(&json!({})));
    }

    /// Records bind/unbind calls from the registry
    #[derive(Default)]
    struct RecordingSink {
        log: Mutex<Vec<String>>,
    }

    impl CommandSink for RecordingSink {
        fn bind_commands(&self, owner: &str, commands: Vec<Command>) {
            self.log
                .lock()
                .unwrap()
                .push(format!("bind {} ({})", owner, commands.len()));
        }

        fn unbind_commands(&self, owner: &str) {
            self.log.lock().unwrap().push(format!("unbind {}", owner));
        }
    }

    struct Commanding;

    impl Plugin for Commanding {
        fn name(&self) -> &str {
            "Commanding"
        }

        fn commands(&self) -> Vec<Command> {
            vec![Command::new("do"), Command::new("undo")]
        }
    }

    #[test]
    fn test_commands_bound_on_register_unbound_on_unregister() {
        let table = FactoryTable::new()
            .with("Commanding", |_cfg| Ok(Box::new(Commanding) as Box<dyn Plugin>));
        let mut registry = PluginRegistry::new("builtin", table);
        let sink = Arc::new(RecordingSink::default());
        registry.bind_sink(sink.clone());

        registry.register("Commanding", json!({})).unwrap();
        registry.unregister("Commanding");

        let log = sink.log.lock().unwrap();
        assert_eq!(*log, vec!["bind Commanding (2)".to_string(), "unbind Commanding".to_string()]);
    }
}
