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

//! Lazy priority recomputation: a client's cached priority is only ever
//! refreshed right before it is needed for a comparison, never kept live.

use crate::config::ForegroundOracle;
use crate::priority::PriorityTable;
use crate::registry::ClientRegistry;
use crate::types::ClientId;

pub(crate) struct PriorityEngine;
impl PriorityEngine {
    /// Recomputes `client`'s priority from the table unless it has been
    /// explicitly overridden via `update_priority`.
    pub(crate) fn refresh(client_id: ClientId, clients: &mut ClientRegistry,
                           table: &PriorityTable, oracle: &dyn ForegroundOracle) {
        let Some(client) = clients.get_mut(client_id) else { return };
        if client.priority_overwritten { return }
        let key = client.foreground_key();
        let fg = oracle.is_foreground(&key);
        if let Ok(p) = table.priority(&client.use_case, fg) {
            client.priority = p;
        }
    }

    /// Refreshes `owner` and every client sharing its frontends, then
    /// returns the highest priority across the whole group. Used whenever a
    /// candidate frontend holder must be compared against a challenger.
    pub(crate) fn highest_for_frontend(owner_id: ClientId, clients: &mut ClientRegistry,
                                        table: &PriorityTable, oracle: &dyn ForegroundOracle)
                                        -> i32 {
        PriorityEngine::refresh(owner_id, clients, table, oracle);
        let sharees: Vec<ClientId> = clients.get(owner_id)
            .map(|c| c.share_fe_clients.iter().copied().collect())
            .unwrap_or_default();
        let mut highest = clients.get(owner_id).map(|c| c.priority).unwrap_or(i32::MIN);
        for sharee in sharees {
            PriorityEngine::refresh(sharee, clients, table, oracle);
            if let Some(c) = clients.get(sharee) { highest = highest.max(c.priority); }
        }
        highest
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::AlwaysBackground;
    use crate::types::ClientProfile;

    #[test]
    fn refresh_is_noop_when_overridden() {
        let mut clients = ClientRegistry::new();
        let id = clients.reserve_id();
        let mut profile = ClientProfile::new(id, None, "playback", 1, None);
        profile.priority = 999;
        profile.priority_overwritten = true;
        clients.insert(profile);
        let table = PriorityTable::new(&[("playback".to_string(), 1, 1)]);
        PriorityEngine::refresh(id, &mut clients, &table, &AlwaysBackground);
        assert_eq!(999, clients.get(id).unwrap().priority);
    }

    #[test]
    fn highest_for_frontend_considers_sharees() {
        let mut clients = ClientRegistry::new();
        let table = PriorityTable::new(&[
            ("low_case".to_string(), 100, 50),
            ("high_case".to_string(), 100, 800)
        ]);
        let owner = clients.reserve_id();
        clients.insert(ClientProfile::new(owner, None, "low_case", 1, None));
        let sharee = clients.reserve_id();
        clients.insert(ClientProfile::new(sharee, None, "high_case", 2, None));
        clients.get_mut(owner).unwrap().share_fe_clients.insert(sharee);
        let highest = PriorityEngine::highest_for_frontend(owner, &mut clients, &table,
                                                             &AlwaysBackground);
        assert_eq!(800, highest);
    }
}
