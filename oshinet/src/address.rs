// OshiNet: Topology, addressing and VLAN provisioning for hybrid IP/SDN testbeds
// Copyright (C) 2023 The OshiNet Authors
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Address pools
//!
//! All address space of a testbed is handed out by the pools in this module:
//!
//! - [`LoopbackPool`]: loopback addresses of routers and controllers, drawn from an
//!   [`AddressPool`].
//! - [`SubnetPool`]: consecutive subnets of a range, used for broadcast networks and tunnel
//!   segments.
//! - [`HostCounter`]: host addresses inside a single subnet.
//!
//! Use the [`AddressPlanBuilder`] to create all three pools of a testbed.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use log::*;
use serde::{Deserialize, Serialize};

use crate::types::{TestbedError, VlanTag};

/// Positional counter over the four octets of an IPv4 address. Only the octets at positions
/// `first_free..4` advance. The last octet advances fastest and carries into the earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPool {
    name: String,
    octets: [u8; 4],
    first_free: usize,
}

impl AddressPool {
    /// Create a new pool starting after `start`. `first_free` is the first octet that may change.
    pub fn new(name: impl Into<String>, start: Ipv4Addr, first_free: usize) -> Self {
        Self {
            name: name.into(),
            octets: start.octets(),
            first_free: first_free.min(3),
        }
    }

    /// The last address that was handed out (or the start address).
    pub fn current(&self) -> Ipv4Addr {
        self.octets.into()
    }

    /// Returns `true` if all advancing octets reached 255.
    pub fn is_exhausted(&self) -> bool {
        self.octets[self.first_free..].iter().all(|x| *x == u8::MAX)
    }

    /// Advance the counter and return the next address. If all advancing octets reach 255, the
    /// pool is sold out and this, and every later call, returns
    /// [`TestbedError::AddressSpaceExhausted`].
    pub fn next_address(&mut self) -> Result<Ipv4Addr, TestbedError> {
        if self.is_exhausted() {
            return Err(TestbedError::AddressSpaceExhausted(self.name.clone()));
        }
        for pos in (self.first_free..4).rev() {
            let (x, overflow) = self.octets[pos].overflowing_add(1);
            self.octets[pos] = x;
            if !overflow {
                break;
            }
        }
        if self.is_exhausted() {
            warn!("{} address space sold out", self.name);
            return Err(TestbedError::AddressSpaceExhausted(self.name.clone()));
        }
        Ok(self.current())
    }
}

/// Pool of loopback addresses, `<base>.<n>.<x>` where `<n>` is the number of tunnel segments of
/// the testbed. The pool can only be used after [`LoopbackPool::prepare`] was called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopbackPool {
    base: Ipv4Addr,
    pool: Option<AddressPool>,
}

impl LoopbackPool {
    /// Create a new, unprepared pool.
    pub fn new(base: Ipv4Addr) -> Self {
        Self { base, pool: None }
    }

    /// Returns `true` once the pool was prepared.
    pub fn is_ready(&self) -> bool {
        self.pool.is_some()
    }

    /// Size the pool with the number of tunnel segments. The third octet of all loopback
    /// addresses is set to `n`, so loopbacks never collide with the tunnel subnets below.
    pub fn prepare(&mut self, n: usize) -> Result<(), TestbedError> {
        let n = u8::try_from(n)
            .map_err(|_| TestbedError::AddressSpaceExhausted(format!("{n} tunnel segments")))?;
        let mut octets = self.base.octets();
        octets[2] = n;
        octets[3] = 0;
        debug!("loopback pool starts at {}", Ipv4Addr::from(octets));
        self.pool = Some(AddressPool::new("loopback", octets.into(), 1));
        Ok(())
    }

    /// Get the next loopback address.
    pub fn next_address(&mut self) -> Result<Ipv4Addr, TestbedError> {
        self.pool
            .as_mut()
            .ok_or(TestbedError::LoopbackNotReady)?
            .next_address()
    }
}

/// Pool of consecutive subnets inside a range. The last subnet of the range is never handed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetPool {
    name: String,
    range: Ipv4Net,
    prefix_len: u8,
    next: u64,
    end: u64,
}

impl SubnetPool {
    /// Create a new pool splitting `range` into subnets of length `prefix_len`. The first subnet
    /// that is handed out is the one at position `first`.
    pub fn new(
        name: impl Into<String>,
        range: Ipv4Net,
        prefix_len: u8,
        first: u64,
    ) -> Result<Self, TestbedError> {
        // validates the prefix length
        range.subnets(prefix_len)?;
        let count = 1u64 << (prefix_len - range.prefix_len());
        Ok(Self {
            name: name.into(),
            range: range.trunc(),
            prefix_len,
            next: first,
            end: count - 1,
        })
    }

    /// The range of this pool.
    pub fn range(&self) -> Ipv4Net {
        self.range
    }

    /// Get the subnet at position `idx`, regardless whether it was already handed out.
    pub fn nth(&self, idx: u64) -> Option<Ipv4Net> {
        if idx > self.end {
            return None;
        }
        let step = 1u64 << (32 - self.prefix_len);
        let addr = u64::from(u32::from(self.range.network())) + idx * step;
        Ipv4Net::new(Ipv4Addr::from(addr as u32), self.prefix_len).ok()
    }

    /// Number of subnets that were handed out.
    pub fn position(&self) -> u64 {
        self.next
    }

    /// Get the next subnet, or [`TestbedError::AddressSpaceExhausted`] if the pool is sold out.
    pub fn next_subnet(&mut self) -> Result<Ipv4Net, TestbedError> {
        if self.next >= self.end {
            warn!("{} subnet pool {} sold out", self.name, self.range);
            return Err(TestbedError::AddressSpaceExhausted(format!(
                "{} subnets of {}",
                self.name, self.range
            )));
        }
        let net = self.nth(self.next).ok_or_else(|| {
            TestbedError::AddressSpaceExhausted(format!("{} subnets of {}", self.name, self.range))
        })?;
        self.next += 1;
        Ok(net)
    }
}

/// Counter of host addresses inside a subnet. Offset 0 is the network address and is never handed
/// out, neither is the broadcast address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCounter {
    subnet: Ipv4Net,
    last: u64,
    ceiling: u64,
}

impl HostCounter {
    /// Create a fresh counter for `subnet`.
    pub fn new(subnet: Ipv4Net) -> Self {
        let size = 1u64 << (32 - subnet.prefix_len());
        Self {
            subnet: subnet.trunc(),
            last: 0,
            ceiling: size.saturating_sub(1),
        }
    }

    /// The subnet of this counter.
    pub fn subnet(&self) -> Ipv4Net {
        self.subnet
    }

    /// Offset of the last allocated address (0 if nothing was allocated).
    pub fn last(&self) -> u64 {
        self.last
    }

    /// Number of addresses that can still be allocated.
    pub fn remaining(&self) -> u64 {
        self.ceiling.saturating_sub(self.last + 1)
    }

    /// Allocate the next host address. The counter does not advance on failure.
    pub fn allocate(&mut self) -> Result<Ipv4Addr, TestbedError> {
        let next = self.last + 1;
        if next >= self.ceiling {
            return Err(TestbedError::SubnetExhausted(self.subnet));
        }
        self.last = next;
        Ok(Ipv4Addr::from(
            (u64::from(u32::from(self.subnet.network())) + next) as u32,
        ))
    }
}

/// Builder for the address plan of a testbed. The following are the default arguments:
///
/// - `loopback_base`: "10.0.0.0"
/// - `core_range`: "192.168.0.0/16"
/// - `core_prefix_len`: 24
/// - `tunnel_range`: "10.0.0.0/16"
/// - `tunnel_prefix_len`: 24
/// - `vlan_floor`: 2
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressPlanBuilder {
    /// Base of all loopback addresses. The third octet is replaced by the number of tunnel
    /// segments, and the second and fourth octets advance.
    pub loopback_base: Ipv4Addr,
    /// Range of all broadcast and point-to-point networks. The first subnet is reserved for the
    /// controller network, the last one is never used.
    pub core_range: Ipv4Net,
    /// Prefix length of broadcast networks.
    pub core_prefix_len: u8,
    /// Range of the tunnel segments.
    pub tunnel_range: Ipv4Net,
    /// Prefix length of tunnel segments.
    pub tunnel_prefix_len: u8,
    /// The first VLAN tag that is handed out on every aggregation port.
    pub vlan_floor: VlanTag,
}

impl Default for AddressPlanBuilder {
    fn default() -> Self {
        Self {
            loopback_base: Ipv4Addr::new(10, 0, 0, 0),
            core_range: "192.168.0.0/16".parse().unwrap(),
            core_prefix_len: 24,
            tunnel_range: "10.0.0.0/16".parse().unwrap(),
            tunnel_prefix_len: 24,
            vlan_floor: VlanTag::FIRST_FREE,
        }
    }
}

impl AddressPlanBuilder {
    /// Create a new address plan builder
    pub fn new() -> Self {
        Default::default()
    }

    /// Base of all loopback addresses. The default value is `10.0.0.0`.
    pub fn loopback_base(&mut self, x: Ipv4Addr) -> &mut Self {
        self.loopback_base = x;
        self
    }

    /// Range of all broadcast networks. The default value is `192.168.0.0/16`.
    pub fn core_range(&mut self, x: Ipv4Net) -> &mut Self {
        self.core_range = x;
        self
    }

    /// Prefix length of broadcast networks. The default value is `24`.
    pub fn core_prefix_len(&mut self, x: u8) -> &mut Self {
        self.core_prefix_len = x;
        self
    }

    /// Range of the tunnel segments. The default value is `10.0.0.0/16`.
    pub fn tunnel_range(&mut self, x: Ipv4Net) -> &mut Self {
        self.tunnel_range = x;
        self
    }

    /// Prefix length of tunnel segments. The default value is `24`.
    pub fn tunnel_prefix_len(&mut self, x: u8) -> &mut Self {
        self.tunnel_prefix_len = x;
        self
    }

    /// The first VLAN tag handed out on aggregation ports. The default value is `2`.
    pub fn vlan_floor(&mut self, x: VlanTag) -> &mut Self {
        self.vlan_floor = x;
        self
    }

    /// Generate the address plan from the given parameters. The core and tunnel ranges must not
    /// overlap, and the VLAN floor must be a free tag (at least 2 and at most 4094).
    pub fn build(&self) -> Result<AddressPlan, TestbedError> {
        if self.core_range.contains(&self.tunnel_range.network())
            || self.tunnel_range.contains(&self.core_range.network())
        {
            return Err(TestbedError::InvalidAddressPlan(format!(
                "core range {} overlaps with tunnel range {}",
                self.core_range, self.tunnel_range
            )));
        }
        if self.vlan_floor.is_reserved() || self.vlan_floor > VlanTag::MAX {
            return Err(TestbedError::InvalidAddressPlan(format!(
                "VLAN floor {} is not in {}..={}",
                self.vlan_floor,
                VlanTag::FIRST_FREE,
                VlanTag::MAX
            )));
        }
        Ok(AddressPlan {
            loopbacks: LoopbackPool::new(self.loopback_base),
            core: SubnetPool::new("core", self.core_range, self.core_prefix_len, 1)?,
            tunnels: SubnetPool::new("tunnel", self.tunnel_range, self.tunnel_prefix_len, 0)?,
            vlan_floor: self.vlan_floor,
        })
    }
}

/// All address pools of one testbed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPlan {
    /// Loopback addresses
    pub loopbacks: LoopbackPool,
    /// Subnets of broadcast networks
    pub core: SubnetPool,
    /// Subnets of tunnel segments
    pub tunnels: SubnetPool,
    /// First tag handed out on aggregation ports
    pub vlan_floor: VlanTag,
}

impl AddressPlan {
    /// The subnet reserved for the controller network (the first subnet of the core range).
    pub fn controller_subnet(&self) -> Result<Ipv4Net, TestbedError> {
        self.core
            .nth(0)
            .ok_or_else(|| TestbedError::AddressSpaceExhausted("controller subnet".to_string()))
    }
}
