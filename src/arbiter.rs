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

//! The behavioral core: per-resource-type grant/release/share logic, the
//! reclaim decision, and live reconfiguration. Everything here runs under
//! the single global mutex the boundary API takes; no method suspends.

use std::collections::BTreeSet;
use crate::config::ArbiterConfig;
use crate::engine::PriorityEngine;
use crate::errorhandling::ArbiterError;
use crate::handle::{HandleCodec, ResourceType, INVALID_HANDLE};
use crate::priority::PriorityTable;
use crate::registry::{ClientRegistry, ResourceRegistry};
use crate::types::{CasResource, CiCamResource, ClientId, ClientProfile, FrontendInfo,
                    FrontendResource, LnbResource, ReclaimCallback};
use crate::{arbdebug, arbinfo, arbwarn};

/// All arbiter state protected by the single global mutex.
pub(crate) struct ArbiterState {
    pub(crate) clients: ClientRegistry,
    pub(crate) resources: ResourceRegistry,
    priority_table: PriorityTable,
    foreground_oracle: Box<dyn crate::config::ForegroundOracle>,
    pub(crate) watched_clients: BTreeSet<ClientId>
}
impl ArbiterState {
    pub(crate) fn new(config: ArbiterConfig) -> ArbiterState {
        ArbiterState {
            clients: ClientRegistry::new(),
            resources: ResourceRegistry::new(),
            priority_table: PriorityTable::new(&config.priority_rows),
            foreground_oracle: config.foreground_oracle,
            watched_clients: BTreeSet::new()
        }
    }

    fn refresh(&mut self, client_id: ClientId) {
        PriorityEngine::refresh(client_id, &mut self.clients, &self.priority_table,
                                 self.foreground_oracle.as_ref());
    }

    fn highest_for_frontend(&mut self, owner_id: ClientId) -> i32 {
        PriorityEngine::highest_for_frontend(owner_id, &mut self.clients, &self.priority_table,
                                              self.foreground_oracle.as_ref())
    }

    // ------------------------------------------------------------------
    // Client registry operations
    // ------------------------------------------------------------------

    pub(crate) fn register(&mut self, session_tag: Option<String>, use_case: &str,
                            process_id: u32, reclaim_callback: Option<Box<dyn ReclaimCallback>>)
                            -> Result<ClientId, ArbiterError> {
        if ! self.priority_table.is_defined(use_case) {
            return Err(ArbiterError::UnknownUseCase { use_case: use_case.to_string() })
        }
        let id = self.clients.reserve_id();
        self.clients.insert(ClientProfile::new(id, session_tag, use_case, process_id,
                                                reclaim_callback));
        arbinfo!("client {} registered, use case {}", id, use_case);
        Ok(id)
    }

    /// Noop if `client_id` is not registered.
    pub(crate) fn unregister(&mut self, client_id: ClientId) {
        let Some(profile) = self.clients.get(client_id) else { return };
        let in_use_frontends: Vec<u8> = profile.in_use_frontends.iter().copied().collect();
        let share_fe_clients: Vec<ClientId> = profile.share_fe_clients.iter().copied().collect();
        let in_use_lnbs: Vec<u8> = profile.in_use_lnbs.iter().copied().collect();
        let in_use_cas = profile.in_use_cas_system_id;
        let in_use_cicam = profile.in_use_cicam_id;

        if let Some(&fe_id) = in_use_frontends.first() {
            let owner_id = self.resources.frontends.get(&fe_id).and_then(|fe| fe.owner_client_id);
            if owner_id == Some(client_id) {
                let group_ids = self.clear_frontend_ownership_group(fe_id);
                for sharee in &share_fe_clients {
                    if let Some(c) = self.clients.get_mut(*sharee) {
                        for id in &group_ids { c.in_use_frontends.remove(id); }
                    }
                }
            } else if let Some(owner_id) = owner_id {
                if let Some(owner) = self.clients.get_mut(owner_id) {
                    owner.share_fe_clients.remove(&client_id);
                }
            }
        }
        for lnb_id in &in_use_lnbs { self.clear_client_lnb(client_id, *lnb_id); }
        if let Some(sys) = in_use_cas { self.clear_client_cas(client_id, sys); }
        if let Some(cic) = in_use_cicam { self.clear_client_cicam(client_id, cic); }
        self.resources.strip_client_from_cas_cicam(client_id);
        self.clients.remove(client_id);
        arbinfo!("client {} unregistered", client_id);
    }

    pub(crate) fn update_priority(&mut self, client_id: ClientId, priority: i32,
                                  nice: i32) -> bool {
        let Some(c) = self.clients.get_mut(client_id) else { return false };
        c.priority = priority;
        c.priority_overwritten = true;
        c.nice_value = nice;
        true
    }

    // ------------------------------------------------------------------
    // Frontend (C7 4.7.1 - 4.7.3)
    // ------------------------------------------------------------------

    fn frontend_group_ids(&self, fe_id: u8) -> Vec<u8> {
        match self.resources.frontends.get(&fe_id) {
            Some(fe) => {
                let mut ids = vec![fe.id];
                ids.extend(fe.exclusive_group_members.iter().copied());
                ids
            },
            None => Vec::new()
        }
    }

    /// Clears `owner_client_id` on `fe_id` and every current exclusive-group
    /// sibling, returning the ids touched.
    fn clear_frontend_ownership_group(&mut self, fe_id: u8) -> Vec<u8> {
        let group_ids = self.frontend_group_ids(fe_id);
        for id in &group_ids {
            if let Some(fe) = self.resources.frontends.get_mut(id) { fe.owner_client_id = None; }
        }
        group_ids
    }

    fn grant_frontend(&mut self, client_id: ClientId, fe_id: u8) -> u32 {
        let group_ids = self.frontend_group_ids(fe_id);
        for id in &group_ids {
            if let Some(fe) = self.resources.frontends.get_mut(id) { fe.owner_client_id = Some(client_id); }
        }
        if let Some(c) = self.clients.get_mut(client_id) {
            for id in &group_ids { c.in_use_frontends.insert(*id); }
        }
        let tag = self.resources.next_tag();
        HandleCodec::encode(ResourceType::Frontend, fe_id, tag)
    }

    pub(crate) fn request_frontend(&mut self, client_id: ClientId, fe_type: u8)
                                    -> Result<u32, ArbiterError> {
        if ! self.clients.contains(client_id) { return Err(ArbiterError::Unregistered { client_id }) }
        if ! self.clients.get(client_id).unwrap().in_use_frontends.is_empty() {
            return Err(ArbiterError::Busy)
        }
        self.refresh(client_id);
        let challenger_priority = self.clients.get(client_id).unwrap().priority;

        let candidates: Vec<(u8, bool, Option<ClientId>)> = self.resources.frontends.values()
            .filter(|fe| fe.fe_type == fe_type)
            .map(|fe| (fe.id, fe.exclusive_group_members.is_empty(), fe.owner_client_id))
            .collect();

        let mut unused_empty_group: Option<u8> = None;
        let mut unused_any: Option<u8> = None;
        let mut victim: Option<(ClientId, u8, i32)> = None;
        for (id, empty_group, owner) in candidates {
            match owner {
                None => {
                    if unused_empty_group.is_none() && empty_group { unused_empty_group = Some(id); }
                    if unused_any.is_none() { unused_any = Some(id); }
                },
                Some(owner_id) => {
                    let prio = self.highest_for_frontend(owner_id);
                    if victim.map_or(true, |(_, _, v)| prio < v) { victim = Some((owner_id, id, prio)); }
                }
            }
        }

        if let Some(fe_id) = unused_empty_group.or(unused_any) {
            return Ok(self.grant_frontend(client_id, fe_id))
        }
        let (victim_id, victim_fe_id, victim_priority) = victim.ok_or(ArbiterError::Denied)?;
        if challenger_priority <= victim_priority { return Err(ArbiterError::Denied) }
        self.reclaim_group(victim_id)?;
        arbinfo!("frontend {} reclaimed from client {} for client {}", victim_fe_id, victim_id,
                 client_id);
        Ok(self.grant_frontend(client_id, victim_fe_id))
    }

    pub(crate) fn share_frontend(&mut self, self_id: ClientId, target_id: ClientId)
                                 -> Result<(), ArbiterError> {
        if ! self.clients.contains(self_id) { return Err(ArbiterError::Unregistered { client_id: self_id }) }
        if ! self.clients.contains(target_id) {
            return Err(ArbiterError::Unregistered { client_id: target_id })
        }
        let target_frontends: Vec<u8> =
            self.clients.get(target_id).unwrap().in_use_frontends.iter().copied().collect();
        if target_frontends.is_empty() {
            return Err(ArbiterError::TargetHasNoFrontend { owner_id: target_id })
        }
        if let Some(c) = self.clients.get_mut(self_id) {
            for fe_id in &target_frontends { c.in_use_frontends.insert(*fe_id); }
        }
        if let Some(c) = self.clients.get_mut(target_id) { c.share_fe_clients.insert(self_id); }
        Ok(())
    }

    pub(crate) fn release_frontend(&mut self, handle: u32, client_id: ClientId)
                                    -> Result<(), ArbiterError> {
        let fe_id = HandleCodec::decode(handle, ResourceType::Frontend)?;
        if ! self.clients.contains(client_id) { return Err(ArbiterError::Unregistered { client_id }) }
        let owner_id = self.resources.frontends.get(&fe_id).and_then(|fe| fe.owner_client_id)
            .ok_or(ArbiterError::UnknownResource { resource_id: fe_id as i32 })?;
        if owner_id == client_id {
            let sharees: Vec<ClientId> =
                self.clients.get(owner_id).unwrap().share_fe_clients.iter().copied().collect();
            let group_ids = self.clear_frontend_ownership_group(fe_id);
            for sharee in &sharees {
                if let Some(c) = self.clients.get_mut(*sharee) {
                    for id in &group_ids { c.in_use_frontends.remove(id); }
                }
            }
            if let Some(c) = self.clients.get_mut(owner_id) {
                for id in &group_ids { c.in_use_frontends.remove(id); }
                c.share_fe_clients.clear();
            }
            Ok(())
        } else if self.clients.get(owner_id).unwrap().share_fe_clients.contains(&client_id) {
            if let Some(c) = self.clients.get_mut(client_id) { c.in_use_frontends.clear(); }
            if let Some(c) = self.clients.get_mut(owner_id) { c.share_fe_clients.remove(&client_id); }
            Ok(())
        } else {
            Err(ArbiterError::NotOwner { client_id, handle })
        }
    }

    // ------------------------------------------------------------------
    // LNB (C7 4.7.4)
    // ------------------------------------------------------------------

    fn clear_client_lnb(&mut self, client_id: ClientId, lnb_id: u8) {
        if let Some(l) = self.resources.lnbs.get_mut(&lnb_id) { l.owner_client_id = None; }
        if let Some(c) = self.clients.get_mut(client_id) { c.in_use_lnbs.remove(&lnb_id); }
    }

    fn grant_lnb(&mut self, client_id: ClientId, lnb_id: u8) -> u32 {
        if let Some(l) = self.resources.lnbs.get_mut(&lnb_id) { l.owner_client_id = Some(client_id); }
        if let Some(c) = self.clients.get_mut(client_id) { c.in_use_lnbs.insert(lnb_id); }
        let tag = self.resources.next_tag();
        HandleCodec::encode(ResourceType::Lnb, lnb_id, tag)
    }

    pub(crate) fn request_lnb(&mut self, client_id: ClientId) -> Result<u32, ArbiterError> {
        if ! self.clients.contains(client_id) { return Err(ArbiterError::Unregistered { client_id }) }
        self.refresh(client_id);
        let challenger_priority = self.clients.get(client_id).unwrap().priority;

        let candidates: Vec<(u8, Option<ClientId>)> =
            self.resources.lnbs.values().map(|l| (l.id, l.owner_client_id)).collect();
        let mut unused: Option<u8> = None;
        let mut victim: Option<(ClientId, u8, i32)> = None;
        for (id, owner) in candidates {
            match owner {
                None => { if unused.is_none() { unused = Some(id); } },
                Some(owner_id) => {
                    self.refresh(owner_id);
                    let prio = self.clients.get(owner_id).unwrap().priority;
                    if victim.map_or(true, |(_, _, v)| prio < v) { victim = Some((owner_id, id, prio)); }
                }
            }
        }
        if let Some(id) = unused { return Ok(self.grant_lnb(client_id, id)) }
        let (victim_id, victim_lnb_id, victim_priority) = victim.ok_or(ArbiterError::Denied)?;
        if challenger_priority <= victim_priority { return Err(ArbiterError::Denied) }
        self.reclaim_group(victim_id)?;
        Ok(self.grant_lnb(client_id, victim_lnb_id))
    }

    pub(crate) fn release_lnb(&mut self, handle: u32, client_id: ClientId)
                               -> Result<(), ArbiterError> {
        let lnb_id = HandleCodec::decode(handle, ResourceType::Lnb)?;
        if ! self.clients.contains(client_id) { return Err(ArbiterError::Unregistered { client_id }) }
        let owner = self.resources.lnbs.get(&lnb_id).and_then(|l| l.owner_client_id)
            .ok_or(ArbiterError::UnknownResource { resource_id: lnb_id as i32 })?;
        if owner != client_id { return Err(ArbiterError::NotOwner { client_id, handle }) }
        self.clear_client_lnb(client_id, lnb_id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // CAS / CiCam (C7 4.7.5) - counted semaphores, no groups or sharing
    // ------------------------------------------------------------------

    fn clear_client_cas(&mut self, client_id: ClientId, system_id: u8) {
        if let Some(cas) = self.resources.cas.get_mut(&system_id) {
            cas.owner_client_ids.retain(|&id| id != client_id);
        }
        if let Some(c) = self.clients.get_mut(client_id) { c.in_use_cas_system_id = None; }
    }

    fn grant_cas(&mut self, client_id: ClientId, system_id: u8) -> u32 {
        if let Some(cas) = self.resources.cas.get_mut(&system_id) {
            cas.owner_client_ids.push(client_id);
        }
        if let Some(c) = self.clients.get_mut(client_id) { c.in_use_cas_system_id = Some(system_id); }
        let tag = self.resources.next_tag();
        HandleCodec::encode(ResourceType::Cas, system_id, tag)
    }

    pub(crate) fn request_cas(&mut self, client_id: ClientId, system_id: u8)
                               -> Result<u32, ArbiterError> {
        if ! self.clients.contains(client_id) { return Err(ArbiterError::Unregistered { client_id }) }
        self.refresh(client_id);
        let challenger_priority = self.clients.get(client_id).unwrap().priority;

        self.resources.cas.entry(system_id).or_insert_with(|| {
            CasResource { system_id, max_sessions: u32::MAX, owner_client_ids: Vec::new() }
        });
        let cas = self.resources.cas.get(&system_id).unwrap();
        if (cas.owner_client_ids.len() as u32) < cas.max_sessions {
            return Ok(self.grant_cas(client_id, system_id))
        }
        let owners = cas.owner_client_ids.clone();
        let mut victim: Option<(ClientId, i32)> = None;
        for owner_id in owners {
            self.refresh(owner_id);
            let prio = self.clients.get(owner_id).unwrap().priority;
            if victim.map_or(true, |(_, v)| prio < v) { victim = Some((owner_id, prio)); }
        }
        let (victim_id, victim_priority) = victim.ok_or(ArbiterError::Denied)?;
        if challenger_priority <= victim_priority { return Err(ArbiterError::Denied) }
        self.reclaim_group(victim_id)?;
        Ok(self.grant_cas(client_id, system_id))
    }

    pub(crate) fn release_cas(&mut self, handle: u32, client_id: ClientId)
                               -> Result<(), ArbiterError> {
        let system_id = HandleCodec::decode(handle, ResourceType::Cas)?;
        if ! self.clients.contains(client_id) { return Err(ArbiterError::Unregistered { client_id }) }
        let is_owner = self.resources.cas.get(&system_id)
            .map_or(false, |c| c.owner_client_ids.contains(&client_id));
        if ! is_owner { return Err(ArbiterError::NotOwner { client_id, handle }) }
        self.clear_client_cas(client_id, system_id);
        Ok(())
    }

    fn clear_client_cicam(&mut self, client_id: ClientId, cicam_id: u8) {
        if let Some(c) = self.resources.cicam.get_mut(&cicam_id) {
            c.owner_client_ids.retain(|&id| id != client_id);
        }
        if let Some(c) = self.clients.get_mut(client_id) { c.in_use_cicam_id = None; }
    }

    fn grant_cicam(&mut self, client_id: ClientId, cicam_id: u8) -> u32 {
        if let Some(c) = self.resources.cicam.get_mut(&cicam_id) { c.owner_client_ids.push(client_id); }
        if let Some(c) = self.clients.get_mut(client_id) { c.in_use_cicam_id = Some(cicam_id); }
        let tag = self.resources.next_tag();
        HandleCodec::encode(ResourceType::CiCam, cicam_id, tag)
    }

    pub(crate) fn request_cicam(&mut self, client_id: ClientId, cicam_id: u8)
                                 -> Result<u32, ArbiterError> {
        if ! self.clients.contains(client_id) { return Err(ArbiterError::Unregistered { client_id }) }
        self.refresh(client_id);
        let challenger_priority = self.clients.get(client_id).unwrap().priority;

        self.resources.cicam.entry(cicam_id).or_insert_with(|| {
            CiCamResource { cicam_id, max_sessions: u32::MAX, owner_client_ids: Vec::new() }
        });
        let cicam = self.resources.cicam.get(&cicam_id).unwrap();
        if (cicam.owner_client_ids.len() as u32) < cicam.max_sessions {
            return Ok(self.grant_cicam(client_id, cicam_id))
        }
        let owners = cicam.owner_client_ids.clone();
        let mut victim: Option<(ClientId, i32)> = None;
        for owner_id in owners {
            self.refresh(owner_id);
            let prio = self.clients.get(owner_id).unwrap().priority;
            if victim.map_or(true, |(_, v)| prio < v) { victim = Some((owner_id, prio)); }
        }
        let (victim_id, victim_priority) = victim.ok_or(ArbiterError::Denied)?;
        if challenger_priority <= victim_priority { return Err(ArbiterError::Denied) }
        self.reclaim_group(victim_id)?;
        Ok(self.grant_cicam(client_id, cicam_id))
    }

    pub(crate) fn release_cicam(&mut self, handle: u32, client_id: ClientId)
                                 -> Result<(), ArbiterError> {
        let cicam_id = HandleCodec::decode(handle, ResourceType::CiCam)?;
        if ! self.clients.contains(client_id) { return Err(ArbiterError::Unregistered { client_id }) }
        let is_owner = self.resources.cicam.get(&cicam_id)
            .map_or(false, |c| c.owner_client_ids.contains(&client_id));
        if ! is_owner { return Err(ArbiterError::NotOwner { client_id, handle }) }
        self.clear_client_cicam(client_id, cicam_id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Demux / Descrambler (C7 4.7.6) - abundant, never tracked
    // ------------------------------------------------------------------

    pub(crate) fn request_demux(&mut self) -> u32 {
        let tag = self.resources.next_tag();
        HandleCodec::encode(ResourceType::Demux, 0, tag)
    }

    pub(crate) fn request_descrambler(&mut self) -> u32 {
        let tag = self.resources.next_tag();
        HandleCodec::encode(ResourceType::Descrambler, 0, tag)
    }

    // ------------------------------------------------------------------
    // Reclaim protocol (C7 4.7.7)
    // ------------------------------------------------------------------

    /// Reclaims `primary_id` and, for frontends, every client sharing its
    /// frontends. Invokes every group member's callback before mutating any
    /// state; a single failed callback aborts the whole reclaim untouched.
    fn reclaim_group(&mut self, primary_id: ClientId) -> Result<(), ArbiterError> {
        let mut group = vec![primary_id];
        if let Some(c) = self.clients.get(primary_id) {
            group.extend(c.share_fe_clients.iter().copied());
        }
        for &id in &group {
            if let Some(c) = self.clients.get(id) {
                if let Some(cb) = &c.reclaim_callback {
                    if ! cb.on_reclaim() {
                        arbwarn!("reclaim callback for client {} failed, aborting reclaim", id);
                        return Err(ArbiterError::ReclaimFailed { client_id: id })
                    }
                }
            }
        }
        for &id in &group { self.clear_all_client_resources(id); }
        Ok(())
    }

    fn clear_all_client_resources(&mut self, client_id: ClientId) {
        let (fe_ids, lnb_ids, cas_id, cicam_id) = match self.clients.get(client_id) {
            Some(c) => (c.in_use_frontends.iter().copied().collect::<Vec<_>>(),
                        c.in_use_lnbs.iter().copied().collect::<Vec<_>>(),
                        c.in_use_cas_system_id, c.in_use_cicam_id),
            None => return
        };
        for fe_id in &fe_ids {
            let is_owner = self.resources.frontends.get(fe_id)
                .map_or(false, |fe| fe.owner_client_id == Some(client_id));
            if is_owner { self.clear_frontend_ownership_group(*fe_id); }
        }
        for lnb_id in &lnb_ids { self.clear_client_lnb(client_id, *lnb_id); }
        if let Some(sys) = cas_id { self.clear_client_cas(client_id, sys); }
        if let Some(cic) = cicam_id { self.clear_client_cicam(client_id, cic); }
        if let Some(c) = self.clients.get_mut(client_id) {
            c.in_use_frontends.clear();
            c.share_fe_clients.clear();
        }
    }

    // ------------------------------------------------------------------
    // Live reconfiguration (C7 4.7.8)
    // ------------------------------------------------------------------

    /// Withdraws ownership of `fe_id` alone, leaving any exclusive-group
    /// sibling's ownership untouched. Unlike `clear_frontend_ownership_group`
    /// (used for explicit release and reclaim), this never touches the rest
    /// of the group, since the HAL is reporting one frontend gone, not the
    /// client relinquishing its whole group.
    fn force_remove_frontend(&mut self, fe_id: u8) {
        if let Some(owner_id) = self.resources.frontends.get(&fe_id).and_then(|fe| fe.owner_client_id) {
            let sharees: Vec<ClientId> = self.clients.get(owner_id)
                .map(|c| c.share_fe_clients.iter().copied().collect()).unwrap_or_default();
            for sharee in &sharees {
                if let Some(c) = self.clients.get_mut(*sharee) { c.in_use_frontends.remove(&fe_id); }
            }
            if let Some(c) = self.clients.get_mut(owner_id) {
                c.in_use_frontends.remove(&fe_id);
                if c.in_use_frontends.is_empty() { c.share_fe_clients.clear(); }
            }
        }
        self.resources.remove_frontend(fe_id);
    }

    pub(crate) fn set_frontend_info_list(&mut self, infos: Vec<FrontendInfo>) {
        let new_ids: BTreeSet<u8> = infos.iter().map(|i| i.id).collect();
        let current_ids: Vec<u8> = self.resources.frontends.keys().copied().collect();
        for id in current_ids {
            if ! new_ids.contains(&id) {
                arbdebug!("frontend {} removed by live reconfiguration", id);
                self.force_remove_frontend(id);
            }
        }
        let existing_ids: BTreeSet<u8> = self.resources.frontends.keys().copied().collect();
        for info in infos {
            if ! existing_ids.contains(&info.id) {
                self.resources.insert_frontend(FrontendResource {
                    id: info.id, fe_type: info.fe_type,
                    exclusive_group_id: info.exclusive_group_id,
                    exclusive_group_members: BTreeSet::new(), owner_client_id: None
                });
            }
        }
    }

    fn force_remove_lnb(&mut self, lnb_id: u8) {
        if let Some(owner_id) = self.resources.lnbs.get(&lnb_id).and_then(|l| l.owner_client_id) {
            self.clear_client_lnb(owner_id, lnb_id);
        }
        self.resources.lnbs.remove(&lnb_id);
    }

    pub(crate) fn set_lnb_info_list(&mut self, ids: Vec<u8>) {
        let new_ids: BTreeSet<u8> = ids.iter().copied().collect();
        let current_ids: Vec<u8> = self.resources.lnbs.keys().copied().collect();
        for id in current_ids {
            if ! new_ids.contains(&id) { self.force_remove_lnb(id); }
        }
        let existing_ids: BTreeSet<u8> = self.resources.lnbs.keys().copied().collect();
        for id in ids {
            if ! existing_ids.contains(&id) {
                self.resources.lnbs.insert(id, LnbResource { id, owner_client_id: None });
            }
        }
    }

    /// Sheds the lowest-priority owners, no callback, until `used_sessions`
    /// is at or below `max_sessions` (decided open question: shrink sheds
    /// rather than rejects, consistent with the no-callback treatment HAL
    /// driven removal already gets for frontends and LNBs).
    pub(crate) fn update_cas_info(&mut self, system_id: u8, max_sessions: u32) {
        if max_sessions == 0 {
            if let Some(cas) = self.resources.cas.remove(&system_id) {
                for owner in cas.owner_client_ids {
                    if let Some(c) = self.clients.get_mut(owner) { c.in_use_cas_system_id = None; }
                }
            }
            return
        }
        self.resources.cas.entry(system_id).or_insert_with(|| {
            CasResource { system_id, max_sessions, owner_client_ids: Vec::new() }
        }).max_sessions = max_sessions;
        loop {
            let cas = self.resources.cas.get(&system_id).unwrap();
            if (cas.owner_client_ids.len() as u32) <= cas.max_sessions { break }
            let owners = cas.owner_client_ids.clone();
            let mut victim: Option<(ClientId, i32)> = None;
            for owner_id in owners {
                self.refresh(owner_id);
                let prio = self.clients.get(owner_id).map(|c| c.priority).unwrap_or(i32::MIN);
                if victim.map_or(true, |(_, v)| prio < v) { victim = Some((owner_id, prio)); }
            }
            let Some((victim_id, _)) = victim else { break };
            arbwarn!("cas {} shrunk below used sessions, shedding client {}", system_id, victim_id);
            self.clear_client_cas(victim_id, system_id);
        }
    }

    /// Symmetric counterpart to `update_cas_info`, not part of the original
    /// operation table but following from the same CiCam/CAS symmetry the
    /// data model already has.
    pub(crate) fn update_cicam_info(&mut self, cicam_id: u8, max_sessions: u32) {
        if max_sessions == 0 {
            if let Some(cicam) = self.resources.cicam.remove(&cicam_id) {
                for owner in cicam.owner_client_ids {
                    if let Some(c) = self.clients.get_mut(owner) { c.in_use_cicam_id = None; }
                }
            }
            return
        }
        self.resources.cicam.entry(cicam_id).or_insert_with(|| {
            CiCamResource { cicam_id, max_sessions, owner_client_ids: Vec::new() }
        }).max_sessions = max_sessions;
        loop {
            let cicam = self.resources.cicam.get(&cicam_id).unwrap();
            if (cicam.owner_client_ids.len() as u32) <= cicam.max_sessions { break }
            let owners = cicam.owner_client_ids.clone();
            let mut victim: Option<(ClientId, i32)> = None;
            for owner_id in owners {
                self.refresh(owner_id);
                let prio = self.clients.get(owner_id).map(|c| c.priority).unwrap_or(i32::MIN);
                if victim.map_or(true, |(_, v)| prio < v) { victim = Some((owner_id, prio)); }
            }
            let Some((victim_id, _)) = victim else { break };
            self.clear_client_cicam(victim_id, cicam_id);
        }
    }

    // ------------------------------------------------------------------
    // Snapshot store (C8 4.7.9)
    // ------------------------------------------------------------------

    pub(crate) fn store_map(&mut self, res_type: ResourceType) {
        match res_type {
            ResourceType::Frontend => self.resources.store_frontends(),
            ResourceType::Lnb => self.resources.store_lnbs(),
            ResourceType::Cas => self.resources.store_cas(),
            ResourceType::CiCam => self.resources.store_cicam(),
            _ => ()
        }
    }

    pub(crate) fn clear_map(&mut self, res_type: ResourceType) {
        match res_type {
            ResourceType::Frontend => self.resources.clear_frontends(),
            ResourceType::Lnb => self.resources.clear_lnbs(),
            ResourceType::Cas => self.resources.clear_cas(),
            ResourceType::CiCam => self.resources.clear_cicam(),
            _ => ()
        }
    }

    pub(crate) fn restore_map(&mut self, res_type: ResourceType) {
        match res_type {
            ResourceType::Frontend => self.resources.restore_frontends(),
            ResourceType::Lnb => self.resources.restore_lnbs(),
            ResourceType::Cas => self.resources.restore_cas(),
            ResourceType::CiCam => self.resources.restore_cicam(),
            _ => ()
        }
    }

    // ------------------------------------------------------------------
    // Read-only probes (supplemented, see SPEC_FULL)
    // ------------------------------------------------------------------

    pub(crate) fn has_unused_frontend(&self, fe_type: u8) -> bool {
        self.resources.frontends.values().any(|fe| fe.fe_type == fe_type && fe.owner_client_id.is_none())
    }

    pub(crate) fn is_lowest_priority(&mut self, client_id: ClientId, fe_type: u8)
                                      -> Result<bool, ArbiterError> {
        if ! self.clients.contains(client_id) { return Err(ArbiterError::Unregistered { client_id }) }
        self.refresh(client_id);
        let own_priority = self.clients.get(client_id).unwrap().priority;
        let owners: Vec<ClientId> = self.resources.frontends.values()
            .filter(|fe| fe.fe_type == fe_type)
            .filter_map(|fe| fe.owner_client_id)
            .collect();
        if owners.is_empty() { return Ok(false) }
        let mut min_holder_priority = i32::MAX;
        for owner_id in owners {
            let p = self.highest_for_frontend(owner_id);
            min_holder_priority = min_holder_priority.min(p);
        }
        Ok(own_priority <= min_holder_priority)
    }

    pub(crate) fn is_higher_priority(&mut self, challenger_id: ClientId, holder_id: ClientId) -> bool {
        if ! self.clients.contains(challenger_id) || ! self.clients.contains(holder_id) {
            return false
        }
        self.refresh(challenger_id);
        self.refresh(holder_id);
        let cp = self.clients.get(challenger_id).unwrap().priority;
        let hp = self.clients.get(holder_id).unwrap().priority;
        cp > hp
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct AlwaysSucceed;
    impl ReclaimCallback for AlwaysSucceed { fn on_reclaim(&self) -> bool { true } }

    struct AlwaysFail;
    impl ReclaimCallback for AlwaysFail { fn on_reclaim(&self) -> bool { false } }

    fn state_with(rows: &[(&str, i32, i32)]) -> ArbiterState {
        let rows: Vec<(String, i32, i32)> =
            rows.iter().map(|(u, f, b)| (u.to_string(), *f, *b)).collect();
        ArbiterState::new(ArbiterConfig::new(rows, Box::new(crate::config::AlwaysBackground)))
    }

    fn add_frontend(state: &mut ArbiterState, id: u8, fe_type: u8, group: u32) {
        state.resources.insert_frontend(FrontendResource {
            id, fe_type, exclusive_group_id: group,
            exclusive_group_members: Default::default(), owner_client_id: None
        });
    }

    #[test]
    fn register_rejects_unknown_use_case() {
        let mut state = state_with(&[]);
        assert_eq!(Err(ArbiterError::UnknownUseCase { use_case: "voip".to_string() }),
                   state.register(None, "voip", 1, None));
    }

    #[test]
    fn sibling_frontends_are_granted_together() {
        let mut state = state_with(&[("playback", 500, 500)]);
        add_frontend(&mut state, 0, 1, 7);
        add_frontend(&mut state, 1, 1, 7);
        let client = state.register(None, "playback", 1, None).unwrap();
        let handle = state.request_frontend(client, 1).unwrap();
        let fe_id = HandleCodec::decode(handle, ResourceType::Frontend).unwrap();
        let group_ids = state.frontend_group_ids(fe_id);
        let owned = &state.clients.get(client).unwrap().in_use_frontends;
        for id in &group_ids { assert!(owned.contains(id)); }
    }

    #[test]
    fn second_client_denied_when_group_already_owned_by_equal_priority() {
        let mut state = state_with(&[("playback", 500, 500)]);
        add_frontend(&mut state, 0, 1, 7);
        add_frontend(&mut state, 1, 1, 7);
        let a = state.register(None, "playback", 1, None).unwrap();
        state.request_frontend(a, 1).unwrap();
        let b = state.register(None, "playback", 2, None).unwrap();
        assert_eq!(Err(ArbiterError::Denied), state.request_frontend(b, 1));
    }

    #[test]
    fn higher_priority_reclaims_sibling_group() {
        let mut state = state_with(&[("low", 100, 100), ("high", 900, 900)]);
        add_frontend(&mut state, 0, 1, 7);
        add_frontend(&mut state, 1, 1, 7);
        let low = state.register(None, "low", 1, Some(Box::new(AlwaysSucceed))).unwrap();
        state.request_frontend(low, 1).unwrap();
        let high = state.register(None, "high", 2, None).unwrap();
        let handle = state.request_frontend(high, 1).unwrap();
        assert_ne!(INVALID_HANDLE, handle);
        assert!(state.clients.get(low).unwrap().in_use_frontends.is_empty());
    }

    #[test]
    fn reclaim_fails_and_leaves_state_untouched_on_callback_failure() {
        let mut state = state_with(&[("low", 100, 100), ("high", 900, 900)]);
        add_frontend(&mut state, 0, 1, 7);
        let low = state.register(None, "low", 1, Some(Box::new(AlwaysFail))).unwrap();
        state.request_frontend(low, 1).unwrap();
        let high = state.register(None, "high", 2, None).unwrap();
        assert_eq!(Err(ArbiterError::ReclaimFailed { client_id: low }),
                   state.request_frontend(high, 1));
        assert!(state.clients.get(low).unwrap().in_use_frontends.contains(&0));
    }

    #[test]
    fn share_then_reclaim_evicts_both_sharer_and_owner() {
        let mut state = state_with(&[("low", 100, 100), ("high", 900, 900)]);
        add_frontend(&mut state, 0, 1, 0);
        let owner = state.register(None, "low", 1, Some(Box::new(AlwaysSucceed))).unwrap();
        state.request_frontend(owner, 1).unwrap();
        let sharer = state.register(None, "low", 2, Some(Box::new(AlwaysSucceed))).unwrap();
        state.share_frontend(sharer, owner).unwrap();
        assert!(state.clients.get(sharer).unwrap().in_use_frontends.contains(&0));

        let high = state.register(None, "high", 3, None).unwrap();
        state.request_frontend(high, 1).unwrap();
        assert!(state.clients.get(owner).unwrap().in_use_frontends.is_empty());
        assert!(state.clients.get(sharer).unwrap().in_use_frontends.is_empty());
    }

    #[test]
    fn share_rejects_target_with_no_frontend() {
        let mut state = state_with(&[("playback", 500, 500)]);
        let a = state.register(None, "playback", 1, None).unwrap();
        let b = state.register(None, "playback", 2, None).unwrap();
        assert_eq!(Err(ArbiterError::TargetHasNoFrontend { owner_id: b }),
                   state.share_frontend(a, b));
    }

    #[test]
    fn cas_grants_up_to_capacity_then_reclaims_lowest_priority() {
        let mut state = state_with(&[("low", 100, 100), ("mid", 400, 400), ("high", 900, 900)]);
        state.resources.cas.insert(3, CasResource { system_id: 3, max_sessions: 2,
                                                     owner_client_ids: Vec::new() });
        let low = state.register(None, "low", 1, Some(Box::new(AlwaysSucceed))).unwrap();
        let mid = state.register(None, "mid", 2, None).unwrap();
        state.request_cas(low, 3).unwrap();
        state.request_cas(mid, 3).unwrap();
        assert_eq!(2, state.resources.cas.get(&3).unwrap().owner_client_ids.len());

        let high = state.register(None, "high", 3, None).unwrap();
        state.request_cas(high, 3).unwrap();
        assert!(! state.resources.cas.get(&3).unwrap().owner_client_ids.contains(&low));
        assert_eq!(2, state.resources.cas.get(&3).unwrap().owner_client_ids.len());
    }

    #[test]
    fn live_removal_of_one_frontend_preserves_surviving_sibling_ownership() {
        let mut state = state_with(&[("playback", 500, 500)]);
        add_frontend(&mut state, 0, 1, 0);
        add_frontend(&mut state, 1, 1, 0);
        let client = state.register(None, "playback", 1, None).unwrap();
        state.request_frontend(client, 1).unwrap();
        assert!(state.clients.get(client).unwrap().in_use_frontends.contains(&0));
        assert!(state.clients.get(client).unwrap().in_use_frontends.contains(&1));

        state.set_frontend_info_list(vec![FrontendInfo { id: 1, fe_type: 1, exclusive_group_id: 0 }]);
        assert!(! state.resources.frontends.contains_key(&0));
        assert!(state.resources.frontends.contains_key(&1));
        let owned = &state.clients.get(client).unwrap().in_use_frontends;
        assert!(! owned.contains(&0));
        assert!(owned.contains(&1));
        assert_eq!(Some(client), state.resources.frontends.get(&1).unwrap().owner_client_id);
    }

    #[test]
    fn unregister_releases_every_resource_kind() {
        let mut state = state_with(&[("playback", 500, 500)]);
        add_frontend(&mut state, 0, 1, 0);
        state.resources.lnbs.insert(0, LnbResource { id: 0, owner_client_id: None });
        let client = state.register(None, "playback", 1, None).unwrap();
        state.request_frontend(client, 1).unwrap();
        state.request_lnb(client).unwrap();
        state.unregister(client);
        assert!(state.resources.frontends.get(&0).unwrap().owner_client_id.is_none());
        assert!(state.resources.lnbs.get(&0).unwrap().owner_client_id.is_none());
        assert!(! state.clients.contains(client));
    }

    #[test]
    fn update_priority_overrides_table_lookup() {
        let mut state = state_with(&[("playback", 500, 500)]);
        let client = state.register(None, "playback", 1, None).unwrap();
        assert!(state.update_priority(client, 999, 0));
        state.refresh(client);
        assert_eq!(999, state.clients.get(client).unwrap().priority);
    }

    #[test]
    fn is_higher_priority_is_false_for_unregistered_client() {
        let mut state = state_with(&[("playback", 500, 500)]);
        let a = state.register(None, "playback", 1, None).unwrap();
        assert!(! state.is_higher_priority(a, 999));
    }

    #[test]
    fn cas_shrink_below_occupancy_sheds_lowest_priority_owner() {
        let mut state = state_with(&[("low", 100, 100), ("high", 900, 900)]);
        state.resources.cas.insert(3, CasResource { system_id: 3, max_sessions: 2,
                                                     owner_client_ids: Vec::new() });
        let low = state.register(None, "low", 1, None).unwrap();
        let high = state.register(None, "high", 2, None).unwrap();
        state.request_cas(low, 3).unwrap();
        state.request_cas(high, 3).unwrap();
        state.update_cas_info(3, 1);
        let owners = &state.resources.cas.get(&3).unwrap().owner_client_ids;
        assert_eq!(1, owners.len());
        assert!(owners.contains(&high));
    }
}
