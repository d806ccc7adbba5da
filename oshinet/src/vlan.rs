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

//! Module containing the VLAN tag tables of a testbed.

use std::collections::{BTreeMap, BTreeSet};

use log::*;

use crate::types::{IfaceId, TestbedError, VlanTag};

/// VLAN tag assignment of all switch and aggregation ports.
///
/// - Access ports carry exactly one tag.
/// - Trunk ports carry a set of tags.
/// - Every aggregation port hands out tags from its own counter, starting at the floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanTable {
    floor: VlanTag,
    access: BTreeMap<IfaceId, VlanTag>,
    trunk: BTreeMap<IfaceId, BTreeSet<VlanTag>>,
    counters: BTreeMap<IfaceId, VlanTag>,
}

impl Default for VlanTable {
    fn default() -> Self {
        Self::new(VlanTag::FIRST_FREE)
    }
}

impl VlanTable {
    /// Create empty tables. Port counters start at `floor`.
    pub fn new(floor: VlanTag) -> Self {
        Self {
            floor,
            access: BTreeMap::new(),
            trunk: BTreeMap::new(),
            counters: BTreeMap::new(),
        }
    }

    /// Configure `port` as access port with `tag`. Returns the previous tag of that port.
    pub fn set_access(&mut self, port: IfaceId, tag: VlanTag) -> Option<VlanTag> {
        let old = self.access.insert(port, tag);
        if let Some(old) = old.filter(|old| *old != tag) {
            warn!("access port {:?} changes its tag from {} to {}", port, old, tag);
        }
        old
    }

    /// Add `tag` to the trunk port `port`. Returns `false` if the tag was already present.
    pub fn add_trunk(&mut self, port: IfaceId, tag: VlanTag) -> bool {
        let new = self.trunk.entry(port).or_default().insert(tag);
        if !new {
            trace!("trunk port {:?} already carries tag {}", port, tag);
        }
        new
    }

    /// Draw the next tag from the counter of the aggregation port `port`.
    pub fn next_tag(&mut self, port: IfaceId) -> Result<VlanTag, TestbedError> {
        let tag = *self.counters.get(&port).unwrap_or(&self.floor);
        if tag > VlanTag::MAX {
            return Err(TestbedError::VlanSpaceExhausted(format!("{port:?}")));
        }
        self.counters.insert(port, VlanTag(tag.0 + 1));
        debug!("port {:?} hands out VLAN tag {}", port, tag);
        Ok(tag)
    }

    /// The next tag the counter of `port` would hand out.
    pub fn counter(&self, port: IfaceId) -> VlanTag {
        *self.counters.get(&port).unwrap_or(&self.floor)
    }

    /// Tag of an access port.
    pub fn access_tag(&self, port: IfaceId) -> Option<VlanTag> {
        self.access.get(&port).copied()
    }

    /// Tags of a trunk port.
    pub fn trunk_tags(&self, port: IfaceId) -> Option<&BTreeSet<VlanTag>> {
        self.trunk.get(&port)
    }

    /// All access ports with their tag.
    pub fn access_ports(&self) -> &BTreeMap<IfaceId, VlanTag> {
        &self.access
    }

    /// All trunk ports with their tags.
    pub fn trunk_ports(&self) -> &BTreeMap<IfaceId, BTreeSet<VlanTag>> {
        &self.trunk
    }
}
