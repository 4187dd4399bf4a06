#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use staralt::geometry::MeeusGeometry;
use staralt::models::{Instant, Site};

/// Serializes every test that touches process environment variables.
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// The 7DT site at El Sauce, Chile.
pub fn seven_dt() -> Site {
    Site::new(-30.4704, -70.7804, 1580.0, "America/Santiago", "observer", "7DT").unwrap()
}

pub fn geometry() -> MeeusGeometry {
    MeeusGeometry::new()
}

pub fn at(text: &str) -> Instant {
    text.parse().unwrap()
}

/// Runs `f` with the given variables set (`Some`) or removed (`None`),
/// restoring the previous values afterwards, even on panic.
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _restore = EnvRestore::apply(changes);
    f()
}

struct EnvRestore {
    previous: HashMap<String, Option<String>>,
}

impl EnvRestore {
    fn apply(changes: &[(&str, Option<&str>)]) -> Self {
        let previous = changes
            .iter()
            .map(|(key, _)| (key.to_string(), std::env::var(key).ok()))
            .collect();
        for (key, value) in changes {
            set_or_remove(key, *value);
        }
        Self { previous }
    }
}

impl Drop for EnvRestore {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain() {
            set_or_remove(&key, value.as_deref());
        }
    }
}

fn set_or_remove(key: &str, value: Option<&str>) {
    match value {
        Some(v) => std::env::set_var(key, v),
        None => std::env::remove_var(key),
    }
}
