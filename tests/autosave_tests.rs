//! Autosaver tests

#![cfg(feature = "server")]

mod common;

#[cfg(test)]
mod tests {
    use crate::common::{handle, worlds};
    use parking_lot::Mutex;
    use pvp_knockback::{
        Area, Autosaver, KnockbackProfile, OverrideRegistry, RegistryConfig, Vec3,
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn save_now_writes_current_state() {
        let dir = TempDir::new().unwrap();
        let config = RegistryConfig::with_data_dir(dir.path());
        let worlds = worlds(&["arena"]);
        let arena = handle(&worlds, "arena");

        let registry = OverrideRegistry::load(config.clone(), worlds.clone()).unwrap();
        let registry = Arc::new(Mutex::new(registry));
        registry
            .lock()
            .get_or_create_world(&arena)
            .set_profile(KnockbackProfile::new(0.25, 0.5, 4));

        let saver = Autosaver::new(registry.clone(), Duration::from_secs(60));
        tokio_test::block_on(saver.save_now()).unwrap();

        let reloaded = OverrideRegistry::load(config, worlds).unwrap();
        assert_eq!(
            *reloaded.lookup_world("arena").unwrap().profile(),
            KnockbackProfile::new(0.25, 0.5, 4)
        );
    }

    #[test]
    fn shutdown_triggers_a_final_save() {
        let dir = TempDir::new().unwrap();
        let config = RegistryConfig::with_data_dir(dir.path());
        let worlds = worlds(&["arena"]);
        let arena = handle(&worlds, "arena");

        let registry = Arc::new(Mutex::new(
            OverrideRegistry::load(config.clone(), worlds.clone()).unwrap(),
        ));
        // Long period: only the final save can write anything.
        let saver = Autosaver::new(registry.clone(), Duration::from_secs(3600));

        let editor = registry.clone();
        let shutdown = async move {
            let mut reg = editor.lock();
            reg.get_or_create_world(&arena)
                .set_profile(KnockbackProfile::new(0.7, 0.2, 3));
            reg.add_area(Area::new(
                "pit",
                Some("arena".into()),
                Vec3::zero(),
                Vec3::new(5.0, 5.0, 5.0),
                KnockbackProfile::default(),
            ))
            .unwrap();
        };
        tokio_test::block_on(saver.run_until(shutdown)).unwrap();

        let reloaded = OverrideRegistry::load(config, worlds).unwrap();
        assert_eq!(
            *reloaded.lookup_world("arena").unwrap().profile(),
            KnockbackProfile::new(0.7, 0.2, 3)
        );
        assert!(reloaded.area("pit").is_some());
    }

    #[test]
    fn period_comes_from_config() {
        let config = RegistryConfig {
            autosave_interval_secs: 0,
            ..Default::default()
        };
        let registry = Arc::new(Mutex::new(OverrideRegistry::new(config, worlds(&[]))));
        assert_eq!(Autosaver::from_config(registry.clone()).period(), Duration::from_secs(1));

        let config = RegistryConfig {
            autosave_interval_secs: 30,
            ..Default::default()
        };
        let registry = Arc::new(Mutex::new(OverrideRegistry::new(config, worlds(&[]))));
        assert_eq!(Autosaver::from_config(registry).period(), Duration::from_secs(30));
    }

    #[test]
    fn save_now_reports_write_failures() {
        let dir = TempDir::new().unwrap();
        // A file where the data directory should be.
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"").unwrap();
        let config = RegistryConfig::with_data_dir(blocker.join("nested"));
        let registry = Arc::new(Mutex::new(OverrideRegistry::new(config, worlds(&[]))));

        let saver = Autosaver::new(registry, Duration::from_secs(60));
        assert!(tokio_test::block_on(saver.save_now()).is_err());
    }
}
