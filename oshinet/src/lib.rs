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

#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # OshiNet
//!
//! This is a library for modelling and provisioning hybrid IP/SDN testbeds. A testbed consists of
//! a core of OSHI nodes, and of layer 2 access networks that hang off aggregation nodes. End hosts
//! in the access networks are connected by virtual leased lines (tunnels) that cross the shared
//! access switches, isolated from each other by VLAN tags.
//!
//! ## Main Concepts
//!
//! The [`testbed::Testbed`] is the main datastructure to operate on. It owns the physical
//! [`topology::Topology`], all address pools of an [`address::AddressPlan`], the IP segments
//! ([`segment::BroadcastNetwork`] and [`segment::TunnelSegment`]), the access networks
//! ([`access::AccessTopology`]), and the [`vlan::VlanTable`]. The chain of operations of a single
//! run is:
//!
//! 1. Reserve the tunnels, which sizes the loopback address space.
//! 2. Build the topology, either manually or using the [`builder::TestbedBuilder`].
//! 3. Declare the tunnels as pairs of end hosts.
//! 4. Provision the access networks ([`provision`]). This first configures plain IP connectivity
//!    of every end host, and then traces every tunnel endpoint to its aggregation node, creating
//!    a new link from the end host to its switch, and selecting a VLAN tag for the tunnel.
//! 5. Assign addresses to every interface.
//!
//! All pools belong to one testbed. Any exhausted pool, unknown endpoint, or malformed access
//! network aborts the run with a [`types::TestbedError`].
//!
//! ## Example usage
//!
//! The following example creates a single access network with two end hosts, and connects them
//! with a tunnel. The tunnel never leaves the access network, so both ends use the same VLAN tag.
//!
//! ```
//! use oshinet::prelude::*;
//!
//! fn main() -> Result<(), TestbedError> {
//!     let mut testbed = Testbed::new(AddressPlanBuilder::new().build()?);
//!     testbed.reserve_tunnels(1)?;
//!
//!     let aos = testbed.add_aggregation("aos1")?;
//!     let sw = testbed.add_node("sw1", Role::AccessSwitch)?;
//!     let h1 = testbed.add_node("euh1", Role::EndHost)?;
//!     let h2 = testbed.add_node("euh2", Role::EndHost)?;
//!
//!     let idx = testbed.add_access_topology("L2AccessNetwork1", Classification::B);
//!     let uplink = testbed.add_access_link(idx, sw, aos)?;
//!     let l1 = testbed.add_access_link(idx, h1, sw)?;
//!     let l2 = testbed.add_access_link(idx, h2, sw)?;
//!     testbed.add_switched_network([uplink.b(), l1.a(), l2.a()])?;
//!
//!     testbed.add_tunnels([("euh1", "euh2")])?;
//!     let cross_connect = testbed.provision()?[0];
//!     assert_eq!(cross_connect.left.vlan, VlanTag(2));
//!     assert_eq!(cross_connect.right.vlan, VlanTag(2));
//!
//!     let addresses = testbed.assign_addresses()?;
//!     assert_eq!(addresses[&uplink.b()].address, "192.168.1.1/24".parse().unwrap());
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod address;
pub mod builder;
pub mod formatter;
pub mod prelude;
pub mod provision;
pub mod segment;
pub mod testbed;
pub mod topology;
pub mod types;
pub mod vlan;

#[cfg(test)]
mod test;
