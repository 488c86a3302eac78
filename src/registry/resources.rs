// -----------------------------------------------------------------------------------------------
// Coaly - context aware logging and tracing system
//
// Copyright (c) 2022, Frank Sommer.
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are met:
//
// * Redistributions of source code must retain the above copyright notice, this
//   list of conditions and the following disclaimer.
//
// * Redistributions in binary form must reproduce the above copyright notice,
//   this list of conditions and the following disclaimer in the documentation
//   and/or other materials provided with the distribution.
//
// * Neither the name of the copyright holder nor the names of its
//   contributors may be used to endorse or promote products derived from
//   this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
// OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.
// -----------------------------------------------------------------------------------------------

//! Typed maps of frontends, LNBs, CAS and CiCam resources, plus the
//! exclusive-group index and the monotonic handle tag counter.

use std::collections::BTreeMap;
use crate::types::{CasResource, CiCamResource, ClientId, FrontendResource, LnbResource};

/// Four resource maps and the single tag sequence shared by every handle the
/// arbiter issues.
pub(crate) struct ResourceRegistry {
    pub(crate) frontends: BTreeMap<u8, FrontendResource>,
    pub(crate) lnbs: BTreeMap<u8, LnbResource>,
    pub(crate) cas: BTreeMap<u8, CasResource>,
    pub(crate) cicam: BTreeMap<u8, CiCamResource>,
    next_tag: u16,
    frontend_backup: Option<BTreeMap<u8, FrontendResource>>,
    lnb_backup: Option<BTreeMap<u8, LnbResource>>,
    cas_backup: Option<BTreeMap<u8, CasResource>>,
    cicam_backup: Option<BTreeMap<u8, CiCamResource>>
}
impl ResourceRegistry {
    pub(crate) fn new() -> ResourceRegistry {
        ResourceRegistry {
            frontends: BTreeMap::new(),
            lnbs: BTreeMap::new(),
            cas: BTreeMap::new(),
            cicam: BTreeMap::new(),
            next_tag: 0,
            frontend_backup: None,
            lnb_backup: None,
            cas_backup: None,
            cicam_backup: None
        }
    }

    /// Returns the next monotonic handle tag, wrapping silently on overflow.
    pub(crate) fn next_tag(&mut self) -> u16 {
        let tag = self.next_tag;
        self.next_tag = self.next_tag.wrapping_add(1);
        tag
    }

    /// Inserts a frontend, splicing it into its exclusive group's reciprocal
    /// member sets.
    pub(crate) fn insert_frontend(&mut self, mut fe: FrontendResource) {
        let group = fe.exclusive_group_id;
        let new_id = fe.id;
        for other in self.frontends.values_mut() {
            if other.exclusive_group_id == group && other.id != new_id {
                other.exclusive_group_members.insert(new_id);
                fe.exclusive_group_members.insert(other.id);
            }
        }
        self.frontends.insert(new_id, fe);
    }

    /// Removes a frontend, withdrawing reciprocal group membership entries.
    pub(crate) fn remove_frontend(&mut self, id: u8) -> Option<FrontendResource> {
        let removed = self.frontends.remove(&id);
        if let Some(fe) = &removed {
            for sibling in &fe.exclusive_group_members {
                if let Some(s) = self.frontends.get_mut(sibling) {
                    s.exclusive_group_members.remove(&id);
                }
            }
        }
        removed
    }

    /// Removes every reference to `client_id` from CAS/CiCam owner lists.
    pub(crate) fn strip_client_from_cas_cicam(&mut self, client_id: ClientId) {
        for c in self.cas.values_mut() { c.owner_client_ids.retain(|&o| o != client_id); }
        for c in self.cicam.values_mut() { c.owner_client_ids.retain(|&o| o != client_id); }
    }

    /// Moves the live frontend map into a backup slot, leaving the live map empty.
    pub(crate) fn store_frontends(&mut self) {
        self.frontend_backup = Some(std::mem::take(&mut self.frontends));
    }

    /// Clears the live frontend map without touching the backup.
    pub(crate) fn clear_frontends(&mut self) { self.frontends.clear(); }

    /// Replaces the live frontend map with the backup, emptying the backup.
    pub(crate) fn restore_frontends(&mut self) {
        if let Some(backup) = self.frontend_backup.take() { self.frontends = backup; }
    }

    pub(crate) fn store_lnbs(&mut self) { self.lnb_backup = Some(std::mem::take(&mut self.lnbs)); }
    pub(crate) fn clear_lnbs(&mut self) { self.lnbs.clear(); }
    pub(crate) fn restore_lnbs(&mut self) {
        if let Some(backup) = self.lnb_backup.take() { self.lnbs = backup; }
    }

    pub(crate) fn store_cas(&mut self) { self.cas_backup = Some(std::mem::take(&mut self.cas)); }
    pub(crate) fn clear_cas(&mut self) { self.cas.clear(); }
    pub(crate) fn restore_cas(&mut self) {
        if let Some(backup) = self.cas_backup.take() { self.cas = backup; }
    }

    pub(crate) fn store_cicam(&mut self) {
        self.cicam_backup = Some(std::mem::take(&mut self.cicam));
    }
    pub(crate) fn clear_cicam(&mut self) { self.cicam.clear(); }
    pub(crate) fn restore_cicam(&mut self) {
        if let Some(backup) = self.cicam_backup.take() { self.cicam = backup; }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fe(id: u8, group: u32) -> FrontendResource {
        FrontendResource {
            id, fe_type: 0, exclusive_group_id: group,
            exclusive_group_members: Default::default(), owner_client_id: None
        }
    }

    #[test]
    fn insert_splices_exclusive_group_reciprocally() {
        let mut reg = ResourceRegistry::new();
        reg.insert_frontend(fe(0, 7));
        reg.insert_frontend(fe(1, 7));
        assert!(reg.frontends[&0].exclusive_group_members.contains(&1));
        assert!(reg.frontends[&1].exclusive_group_members.contains(&0));
    }

    #[test]
    fn remove_withdraws_reciprocal_membership() {
        let mut reg = ResourceRegistry::new();
        reg.insert_frontend(fe(0, 7));
        reg.insert_frontend(fe(1, 7));
        reg.remove_frontend(0);
        assert!(! reg.frontends[&1].exclusive_group_members.contains(&0));
    }

    #[test]
    fn tag_wraps_at_u16_boundary() {
        let mut reg = ResourceRegistry::new();
        reg.next_tag = u16::MAX;
        assert_eq!(u16::MAX, reg.next_tag());
        assert_eq!(0, reg.next_tag());
    }

    #[test]
    fn store_clear_restore_round_trips() {
        let mut reg = ResourceRegistry::new();
        reg.insert_frontend(fe(0, 1));
        reg.store_frontends();
        assert!(reg.frontends.is_empty());
        reg.restore_frontends();
        assert!(reg.frontends.contains_key(&0));
    }
}
