// ── Host/lease registry ──
//
// Replaced wholesale from the lease table on every pass. An address that
// disappears from the table falls back to default name/MAC/activity.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use rbwatch_api::Record;
use tracing::debug;

use crate::model::{Lease, LocalNetwork, MacAddress};

#[derive(Debug, Clone, Default)]
pub struct HostRegistry {
    leases: BTreeMap<Ipv4Addr, Lease>,
}

impl HostRegistry {
    /// Build from lease rows, skipping rows without a usable IPv4 address.
    pub fn from_records(rows: &[Record]) -> Self {
        let leases = rows
            .iter()
            .filter_map(|row| match Lease::try_from(row) {
                Ok(lease) => Some((lease.address, lease)),
                Err(e) => {
                    debug!(error = %e, "skipping lease row");
                    None
                }
            })
            .collect();
        Self { leases }
    }

    pub fn get(&self, address: Ipv4Addr) -> Option<&Lease> {
        self.leases.get(&address)
    }

    pub fn exists(&self, address: Ipv4Addr) -> bool {
        self.leases.contains_key(&address)
    }

    /// Comment, host name, MAC, or the bare address.
    pub fn name(&self, address: Ipv4Addr) -> String {
        self.get(address)
            .map_or_else(|| address.to_string(), Lease::display_name)
    }

    pub fn mac(&self, address: Ipv4Addr) -> MacAddress {
        self.get(address).map_or_else(MacAddress::zero, Lease::mac)
    }

    pub fn is_active(&self, address: Ipv4Addr) -> bool {
        self.get(address).is_some_and(Lease::is_active)
    }

    /// Leased addresses inside `network`, in ascending order.
    pub fn hosts_in(&self, network: &LocalNetwork) -> Vec<Ipv4Addr> {
        self.leases
            .keys()
            .copied()
            .filter(|addr| network.contains(*addr))
            .collect()
    }

    pub fn active_hosts_in(&self, network: &LocalNetwork) -> Vec<Ipv4Addr> {
        self.hosts_in(network)
            .into_iter()
            .filter(|addr| self.is_active(*addr))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lease> {
        self.leases.values()
    }

    pub fn len(&self) -> usize {
        self.leases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
    }
}
