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

//! Client profile storage, keyed by a never-reused id sequence.

use std::collections::BTreeMap;
use crate::types::{ClientId, ClientProfile};

pub(crate) struct ClientRegistry {
    clients: BTreeMap<ClientId, ClientProfile>,
    next_id: ClientId
}
impl ClientRegistry {
    pub(crate) fn new() -> ClientRegistry {
        ClientRegistry { clients: BTreeMap::new(), next_id: 0 }
    }

    /// Reserves and returns a fresh client id. Ids are never reused within
    /// the registry's lifetime, even after the client that held one departs.
    pub(crate) fn reserve_id(&mut self) -> ClientId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn insert(&mut self, profile: ClientProfile) {
        self.clients.insert(profile.id, profile);
    }

    pub(crate) fn get(&self, id: ClientId) -> Option<&ClientProfile> { self.clients.get(&id) }

    pub(crate) fn get_mut(&mut self, id: ClientId) -> Option<&mut ClientProfile> {
        self.clients.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: ClientId) -> Option<ClientProfile> {
        self.clients.remove(&id)
    }

    pub(crate) fn contains(&self, id: ClientId) -> bool { self.clients.contains_key(&id) }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &ClientProfile> { self.clients.values() }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ClientProfile> {
        self.clients.values_mut()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ids_are_never_reused() {
        let mut reg = ClientRegistry::new();
        let a = reg.reserve_id();
        reg.insert(ClientProfile::new(a, None, "playback", 1, None));
        reg.remove(a);
        let b = reg.reserve_id();
        assert_ne!(a, b);
    }

    #[test]
    fn lookup_reflects_insert_and_remove() {
        let mut reg = ClientRegistry::new();
        let id = reg.reserve_id();
        assert!(! reg.contains(id));
        reg.insert(ClientProfile::new(id, None, "playback", 1, None));
        assert!(reg.contains(id));
        reg.remove(id);
        assert!(! reg.contains(id));
    }
}
