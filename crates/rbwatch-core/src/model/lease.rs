use std::net::Ipv4Addr;

use serde::Serialize;

use super::mac::MacAddress;

/// Lease status that marks a host as currently active.
pub const BOUND: &str = "bound";

/// A DHCP lease as seen in the router's lease table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lease {
    pub address: Ipv4Addr,
    pub comment: Option<String>,
    pub host_name: Option<String>,
    pub mac_address: Option<MacAddress>,
    pub status: Option<String>,
}

impl Lease {
    /// Best human label: comment, then host name, then MAC, then the address.
    pub fn display_name(&self) -> String {
        self.comment
            .clone()
            .or_else(|| self.host_name.clone())
            .or_else(|| self.mac_address.as_ref().map(ToString::to_string))
            .unwrap_or_else(|| self.address.to_string())
    }

    pub fn mac(&self) -> MacAddress {
        self.mac_address.clone().unwrap_or_else(MacAddress::zero)
    }

    pub fn is_active(&self) -> bool {
        self.status.as_deref() == Some(BOUND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lease() -> Lease {
        Lease {
            address: Ipv4Addr::new(10, 0, 0, 5),
            comment: None,
            host_name: None,
            mac_address: None,
            status: None,
        }
    }

    #[test]
    fn name_fallback_chain() {
        let mut l = lease();
        assert_eq!(l.display_name(), "10.0.0.5");
        l.mac_address = Some(MacAddress::new("aa:bb:cc:dd:ee:ff"));
        assert_eq!(l.display_name(), "AA:BB:CC:DD:EE:FF");
        l.host_name = Some("laptop".into());
        assert_eq!(l.display_name(), "laptop");
        l.comment = Some("Office laptop".into());
        assert_eq!(l.display_name(), "Office laptop");
    }

    #[test]
    fn mac_falls_back_to_zero() {
        assert!(lease().mac().is_zero());
    }

    #[test]
    fn only_bound_is_active() {
        let mut l = lease();
        assert!(!l.is_active());
        l.status = Some("waiting".into());
        assert!(!l.is_active());
        l.status = Some("bound".into());
        assert!(l.is_active());
    }
}
