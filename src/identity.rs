//! Privilege dropping
//!
//! The cycle must never touch backup storage as root. Before anything else
//! runs, the process switches to the configured service account.
//!
//! The group is always switched before the user: once the user id is
//! dropped the process no longer has the privilege to change its group.

use tracing::{debug, info};

use crate::error::KeeperResult;

/// Numeric ids of the account the cycle runs as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub uid: u32,
    pub gid: u32,
}

/// Capability to look up and assume a system identity
pub trait IdentitySwitcher {
    /// Resolve `user` (and optionally `group`) to numeric ids
    ///
    /// Without an explicit group the user's primary group is used.
    fn resolve(&self, user: &str, group: Option<&str>) -> KeeperResult<Identity>;

    /// Irreversibly switch the process to `identity`, group first
    fn apply(&self, identity: &Identity) -> KeeperResult<()>;
}

/// Resolve the configured account and switch to it
pub fn drop_privileges<S: IdentitySwitcher + ?Sized>(
    switcher: &S,
    user: &str,
    group: Option<&str>,
) -> KeeperResult<Identity> {
    let identity = switcher.resolve(user, group)?;
    debug!("Resolved {} to uid {} gid {}", user, identity.uid, identity.gid);

    switcher.apply(&identity)?;
    info!(
        "Running as {} (uid {}, gid {})",
        user, identity.uid, identity.gid
    );

    Ok(identity)
}

/// Identity database and syscalls of the running system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentity;

#[cfg(unix)]
mod unix {
    use nix::unistd::{setgid, setuid, Gid, Group, Uid, User};

    use super::{Identity, IdentitySwitcher, SystemIdentity};
    use crate::error::{KeeperError, KeeperResult};

    impl IdentitySwitcher for SystemIdentity {
        fn resolve(&self, user: &str, group: Option<&str>) -> KeeperResult<Identity> {
            let account = User::from_name(user)
                .map_err(|e| {
                    KeeperError::Identity(format!("Failed to look up user '{}': {}", user, e))
                })?
                .ok_or_else(|| KeeperError::unknown_user(user))?;

            let gid = match group {
                Some(name) => {
                    Group::from_name(name)
                        .map_err(|e| {
                            KeeperError::Identity(format!(
                                "Failed to look up group '{}': {}",
                                name, e
                            ))
                        })?
                        .ok_or_else(|| KeeperError::unknown_group(name))?
                        .gid
                }
                None => account.gid,
            };

            Ok(Identity {
                uid: account.uid.as_raw(),
                gid: gid.as_raw(),
            })
        }

        fn apply(&self, identity: &Identity) -> KeeperResult<()> {
            let gid = Gid::from_raw(identity.gid);
            let uid = Uid::from_raw(identity.uid);

            reset_supplementary_groups(gid)?;

            setgid(gid).map_err(|e| KeeperError::Privilege {
                operation: "setgid",
                reason: e.to_string(),
            })?;

            setuid(uid).map_err(|e| KeeperError::Privilege {
                operation: "setuid",
                reason: e.to_string(),
            })?;

            Ok(())
        }
    }

    /// Root keeps its supplementary groups across setgid/setuid
    #[cfg(target_os = "linux")]
    fn reset_supplementary_groups(gid: Gid) -> KeeperResult<()> {
        if !Uid::effective().is_root() {
            return Ok(());
        }

        nix::unistd::setgroups(&[gid]).map_err(|e| KeeperError::Privilege {
            operation: "setgroups",
            reason: e.to_string(),
        })
    }

    #[cfg(not(target_os = "linux"))]
    fn reset_supplementary_groups(_gid: Gid) -> KeeperResult<()> {
        Ok(())
    }
}

/// Platforms without POSIX credentials keep the identity they were started
/// with. The configured user is accepted but never enforced.
#[cfg(not(unix))]
impl IdentitySwitcher for SystemIdentity {
    fn resolve(&self, _user: &str, _group: Option<&str>) -> KeeperResult<Identity> {
        Ok(Identity { uid: 0, gid: 0 })
    }

    fn apply(&self, _identity: &Identity) -> KeeperResult<()> {
        tracing::warn!("Privilege dropping is not supported on this platform");
        Ok(())
    }
}
