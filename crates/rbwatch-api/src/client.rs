// ── Command client boundary ──
//
// Everything above this crate talks to the router through `RouterClient`:
// issue a command path with flat parameters, get flat records back.

use std::future::Future;

use crate::error::Error;
use crate::record::{Params, Record};

/// A connection to a router's management API.
///
/// Commands are RouterOS menu paths such as `/ip/dhcp-server/lease/print`
/// or `/queue/simple/set`. Implementations are not required to support
/// concurrent command issuance; callers serialize access themselves.
pub trait RouterClient: Send + Sync + 'static {
    /// Run `path` with `params` and return the resulting records.
    fn issue(
        &self,
        path: &str,
        params: &Params,
    ) -> impl Future<Output = Result<Vec<Record>, Error>> + Send;

    /// Re-establish the session using the stored credentials.
    fn reconnect(&self) -> impl Future<Output = Result<(), Error>> + Send;
}
