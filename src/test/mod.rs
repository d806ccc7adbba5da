// OSHI Deployer: Provisioning plans for hybrid IP/SDN testbeds
// Copyright (C) 2023 The OSHI Deployer Authors
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

//! Test module

mod test_deploy;

use std::path::PathBuf;

/// Path of a temporary file, unique for this test process.
pub(crate) fn tmp_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("oshi-deployer-{}-{}", std::process::id(), name))
}

/// A testbed with two core nodes, one aggregation node below `osh1`, and two end hosts on a single
/// access switch.
pub(crate) const SMALL_TOPOLOGY: &str = r#"{
    "oshis": ["osh1", "osh2"],
    "aoshis": ["aos1"],
    "l2sws": ["sw1"],
    "euhs": ["euh1", "euh2"],
    "subnets": [
        { "type": "CORE", "links": [["osh1", "osh2"]] },
        { "type": "CORE", "links": [["aos1", "osh1"]] },
        { "type": "ACCESS", "links": [["aos1", "sw1"], ["euh1", "sw1"], ["euh2", "sw1"]] }
    ]
}"#;
