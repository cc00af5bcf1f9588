//! Account reputation (ban status) lookup.
//!
//! A session asks once per successful logon whether the account has a
//! ban on record. A ban does not stop the session; it only decides the
//! final [`Outcome`](crate::Outcome).

use gcforge_protocol::SteamId;
use serde::{Deserialize, Serialize};

/// Ban status of one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanInfo {
    pub vac_banned: bool,
    pub game_ban_count: u32,
}

impl BanInfo {
    /// `true` if any kind of ban is on record.
    pub fn is_banned(&self) -> bool {
        self.vac_banned || self.game_ban_count > 0
    }
}

/// Looks up an account's ban status.
///
/// `None` means "no information": the lookup failed, or the service has
/// nothing on the account. The session treats it as not banned, and
/// treats a lookup that outlives its timeout the same way.
///
/// The returned future must be `Send` so a session can run on any worker
/// thread. Implementations can still be written as `async fn`.
pub trait ReputationLookup: Send + Sync + 'static {
    fn ban_info(&self, steam_id: SteamId) -> impl Future<Output = Option<BanInfo>> + Send;
}

/// A lookup that never knows anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReputation;

impl ReputationLookup for NoReputation {
    async fn ban_info(&self, _steam_id: SteamId) -> Option<BanInfo> {
        None
    }
}
