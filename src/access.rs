// 9.0 access.rs: who may run admin operations. the engine only asks a yes/no
// question, so any external permission system can sit behind the trait.

use crate::types::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Creates games and conditions, sets odds, resolves and cancels.
    Oracle,
    /// Pauses and unpauses conditions.
    Maintainer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Oracle => write!(f, "oracle"),
            Role::Maintainer => write!(f, "maintainer"),
        }
    }
}

pub trait Authorizer: fmt::Debug + Send + Sync {
    fn is_authorized(&self, account: AccountId, role: Role) -> bool;
}

/// Owner holds every role, everyone else only what was granted.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    owner: AccountId,
    grants: HashMap<AccountId, HashSet<Role>>,
}

impl RoleRegistry {
    pub fn new(owner: AccountId) -> Self {
        Self {
            owner,
            grants: HashMap::new(),
        }
    }

    pub fn owner(&self) -> AccountId {
        self.owner
    }

    pub fn grant(mut self, account: AccountId, role: Role) -> Self {
        self.grants.entry(account).or_default().insert(role);
        self
    }

    pub fn revoke(&mut self, account: AccountId, role: Role) {
        if let Some(roles) = self.grants.get_mut(&account) {
            roles.remove(&role);
        }
    }
}

impl Authorizer for RoleRegistry {
    fn is_authorized(&self, account: AccountId, role: Role) -> bool {
        account == self.owner
            || self
                .grants
                .get(&account)
                .is_some_and(|roles| roles.contains(&role))
    }
}
