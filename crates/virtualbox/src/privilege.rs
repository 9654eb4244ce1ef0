//! Detection of whether the current user may elevate privileges.
//!
//! Elevation is only ever offered on Linux, to members of a configured group
//! (`sudo` by default). Every other platform answers "not permitted".

use log::debug;

use crate::config::RunnerConfig;
use crate::error::VBoxResult;

/// Answers "can this identity elevate?".
pub trait ElevationPolicy {
    fn can_elevate(&self) -> VBoxResult<bool>;
}

/// Fixed answer, for platforms without a group model and for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticPolicy(pub bool);

impl ElevationPolicy for StaticPolicy {
    fn can_elevate(&self) -> VBoxResult<bool> {
        Ok(self.0)
    }
}

/// Membership of the current user in a named group.
#[cfg(target_os = "linux")]
#[derive(Debug, Clone)]
pub struct GroupMembership {
    group: String,
}

#[cfg(target_os = "linux")]
impl GroupMembership {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }
}

#[cfg(target_os = "linux")]
impl ElevationPolicy for GroupMembership {
    fn can_elevate(&self) -> VBoxResult<bool> {
        let groups = groups::current_group_names().map_err(crate::VBoxError::PermissionLookup)?;
        let member = groups.iter().any(|name| name == &self.group);
        debug!(
            "Current user groups {:?}; member of '{}': {}",
            groups, self.group, member
        );
        Ok(member)
    }
}

/// Pick the policy for the running platform.
#[cfg(target_os = "linux")]
pub fn detect_policy(config: &RunnerConfig) -> Box<dyn ElevationPolicy> {
    Box::new(GroupMembership::new(config.elevation_group.clone()))
}

/// Pick the policy for the running platform.
#[cfg(not(target_os = "linux"))]
pub fn detect_policy(config: &RunnerConfig) -> Box<dyn ElevationPolicy> {
    debug!(
        "Group '{}' is not checked on this platform, elevation disabled",
        config.elevation_group
    );
    Box::new(StaticPolicy(false))
}

#[cfg(target_os = "linux")]
mod groups {
    use std::ffi::CString;
    use std::io;

    use nix::unistd::{Group, User, getgrouplist, getuid};

    /// Names of all groups the current user belongs to.
    ///
    /// Group ids without a group database entry are skipped.
    pub(super) fn current_group_names() -> io::Result<Vec<String>> {
        let uid = getuid();
        let user = User::from_uid(uid)?.ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no passwd entry for uid {uid}"))
        })?;
        let name = CString::new(user.name.as_str())?;

        let mut names = Vec::new();
        for gid in getgrouplist(&name, user.gid)? {
            if let Some(group) = Group::from_gid(gid)? {
                names.push(group.name);
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    fn has_passwd_entry() -> bool {
        use nix::unistd::{User, getuid};
        matches!(User::from_uid(getuid()), Ok(Some(_)))
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_primary_group_is_member() {
        use nix::unistd::{Group, User, getuid};
        let Ok(Some(user)) = User::from_uid(getuid()) else {
            return;
        };
        let Ok(Some(primary)) = Group::from_gid(user.gid) else {
            return;
        };
        let policy = GroupMembership::new(primary.name);
        assert!(policy.can_elevate().unwrap());
    }

    #[test]
    fn test_static_policy() {
        assert!(StaticPolicy(true).can_elevate().unwrap());
        assert!(!StaticPolicy(false).can_elevate().unwrap());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_unknown_group_is_not_member() {
        // Only meaningful when the current uid has a passwd entry.
        if !has_passwd_entry() {
            return;
        }
        let policy = GroupMembership::new("vboxctl-no-such-group");
        assert_eq!(policy.group(), "vboxctl-no-such-group");
        assert!(!policy.can_elevate().unwrap());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_detect_policy_uses_configured_group() {
        let config = RunnerConfig {
            elevation_group: "vboxctl-no-such-group".to_string(),
            ..Default::default()
        };
        let policy = detect_policy(&config);
        if !has_passwd_entry() {
            assert!(policy.can_elevate().is_err());
        } else {
            assert!(!policy.can_elevate().unwrap());
        }
    }

    #[cfg(not(target_os = "linux"))]
    #[test]
    fn test_detect_policy_never_elevates() {
        let policy = detect_policy(&RunnerConfig::default());
        assert!(!policy.can_elevate().unwrap());
    }
}
