use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::info;

/// Yes/no authorization checks consumed by the command router. Injected as
/// a capability so the payout/repair core stays free of authentication
/// concerns.
pub trait AdminAuthority: Send + Sync {
    /// The sysadmin is matched by numeric operator id and is authorized
    /// unconditionally.
    fn is_sysadmin(&self, operator_id: i64) -> bool;

    /// Sub-admins are matched by username. Callers check `is_sysadmin`
    /// first; this looks at the sub-admin set only.
    fn is_admin(&self, username: Option<&str>) -> bool;
}

/// Process-lifetime roster: one fixed sysadmin id plus a mutable set of
/// sub-admin usernames. Sub-admins do not survive a restart.
///
/// Usernames are normalized before storage and lookup: trimmed, leading `@`
/// stripped, lowercased.
#[derive(Clone)]
pub struct InMemoryAdminRoster {
    sysadmin_id: i64,
    admins: Arc<Mutex<HashSet<String>>>,
}

impl InMemoryAdminRoster {
    pub fn new(sysadmin_id: i64) -> Self {
        Self {
            sysadmin_id,
            admins: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Adds a sub-admin. Returns false when the name is empty after
    /// normalization or already present.
    pub fn add_admin(&self, username: &str) -> bool {
        let Some(name) = normalize(username) else {
            return false;
        };
        let mut guard = self.admins.lock().expect("mutex poisoned");
        let added = guard.insert(name.clone());
        if added {
            info!(username = name.as_str(), "sub-admin added");
        }
        added
    }

    /// Removes a sub-admin. Returns false when the name was not present.
    pub fn remove_admin(&self, username: &str) -> bool {
        let Some(name) = normalize(username) else {
            return false;
        };
        let mut guard = self.admins.lock().expect("mutex poisoned");
        let removed = guard.remove(&name);
        if removed {
            info!(username = name.as_str(), "sub-admin removed");
        }
        removed
    }

    /// Sorted sub-admin usernames, sysadmin excluded.
    pub fn list_admins(&self) -> Vec<String> {
        let guard = self.admins.lock().expect("mutex poisoned");
        let mut names: Vec<String> = guard.iter().cloned().collect();
        names.sort();
        names
    }
}

impl AdminAuthority for InMemoryAdminRoster {
    fn is_sysadmin(&self, operator_id: i64) -> bool {
        operator_id == self.sysadmin_id
    }

    fn is_admin(&self, username: Option<&str>) -> bool {
        let Some(name) = username.and_then(normalize) else {
            return false;
        };
        self.admins
            .lock()
            .expect("mutex poisoned")
            .contains(&name)
    }
}

fn normalize(username: &str) -> Option<String> {
    let trimmed = username.trim().trim_start_matches('@').trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
