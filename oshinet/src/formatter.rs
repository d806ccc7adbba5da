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

//! Module that introduces a formatter to display all types containing `NodeId`.

use std::collections::BTreeSet;

use itertools::Itertools;

use crate::{
    access::{AccessTopology, Hop},
    provision::{Anchor, CrossConnect},
    segment::{BroadcastNetwork, TunnelSegment},
    topology::Topology,
    types::{IfaceId, Link, NodeId, VlanTag},
    vlan::VlanTable,
};

/// Trait to format a type that contains NodeIds
pub trait NetworkFormatter<'a, 'n> {
    /// Type that is returned, which implements `std::fmt::Display`.
    type Formatter;

    /// Return a struct that can be formatted and displayed. Unknown nodes are shown as `?`.
    fn fmt(&'a self, topo: &'n Topology) -> Self::Formatter;
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for NodeId {
    type Formatter = &'n str;

    fn fmt(&'a self, topo: &'n Topology) -> Self::Formatter {
        topo.get_node_name(*self).unwrap_or("?")
    }
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for IfaceId {
    type Formatter = String;

    fn fmt(&'a self, topo: &'n Topology) -> Self::Formatter {
        format!("{}-eth{}", self.node.fmt(topo), self.index)
    }
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for &'a [NodeId] {
    type Formatter = String;

    fn fmt(&'a self, topo: &'n Topology) -> Self::Formatter {
        format!("[{}]", self.iter().map(|r| r.fmt(topo)).join(", "))
    }
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for Vec<NodeId> {
    type Formatter = String;

    fn fmt(&'a self, topo: &'n Topology) -> Self::Formatter {
        self.as_slice().fmt(topo)
    }
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for &'a [IfaceId] {
    type Formatter = String;

    fn fmt(&'a self, topo: &'n Topology) -> Self::Formatter {
        format!("[{}]", self.iter().map(|i| i.fmt(topo)).join(", "))
    }
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for Link {
    type Formatter = String;

    fn fmt(&'a self, topo: &'n Topology) -> Self::Formatter {
        format!("{} <-> {}", self.a().fmt(topo), self.b().fmt(topo))
    }
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for Hop {
    type Formatter = String;

    fn fmt(&'a self, topo: &'n Topology) -> Self::Formatter {
        format!("{} -> {}", self.local.fmt(topo), self.remote.fmt(topo))
    }
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for Anchor {
    type Formatter = String;

    fn fmt(&'a self, topo: &'n Topology) -> Self::Formatter {
        format!("{} (vlan {})", self.port.fmt(topo), self.vlan)
    }
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for CrossConnect {
    type Formatter = String;

    fn fmt(&'a self, topo: &'n Topology) -> Self::Formatter {
        format!("{} <=> {}", self.left.fmt(topo), self.right.fmt(topo))
    }
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for BroadcastNetwork {
    type Formatter = String;

    fn fmt(&'a self, topo: &'n Topology) -> Self::Formatter {
        format!(
            "OSPF Network: {}, {}, cost {}, hello interval {}, area {}",
            self.subnet(),
            self.interfaces().fmt(topo),
            self.cost(),
            self.hello_interval(),
            self.area()
        )
    }
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for TunnelSegment {
    type Formatter = String;

    fn fmt(&'a self, topo: &'n Topology) -> Self::Formatter {
        format!("Tunnel: {}, {}", self.subnet(), self.interfaces().fmt(topo))
    }
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for AccessTopology {
    type Formatter = String;

    fn fmt(&'a self, topo: &'n Topology) -> Self::Formatter {
        format!(
            "{} (class {}): {}, links [{}]",
            self.name(),
            self.classification(),
            self.nodes().fmt(topo),
            self.links().iter().map(|l| l.fmt(topo)).join(", ")
        )
    }
}

fn fmt_tags(tags: &BTreeSet<VlanTag>) -> String {
    format!("{{{}}}", tags.iter().join(", "))
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for VlanTable {
    type Formatter = String;

    fn fmt(&'a self, topo: &'n Topology) -> Self::Formatter {
        let access = self
            .access_ports()
            .iter()
            .map(|(p, t)| format!("    {}: {}", p.fmt(topo), t))
            .join("\n");
        let trunk = self
            .trunk_ports()
            .iter()
            .map(|(p, t)| format!("    {}: {}", p.fmt(topo), fmt_tags(t)))
            .join("\n");
        format!("Access ports:\n{access}\nTrunk ports:\n{trunk}")
    }
}
