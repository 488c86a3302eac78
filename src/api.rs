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

//! Public boundary of the crate. `Arbiter` is a cheap, cloneable handle onto
//! one shared, mutex-protected `ArbiterState`; every method here validates
//! its arguments before taking the lock, then delegates to `ArbiterState`
//! while holding it for the duration of the call and releases it before
//! returning.

use std::sync::{Arc, Mutex};
use std::sync::mpsc::Receiver;
use crate::arbiter::ArbiterState;
use crate::config::ArbiterConfig;
use crate::deathwatch::DeathWatcher;
use crate::errorhandling::{ArbiterError, ArbiterResult};
use crate::handle::ResourceType;
use crate::types::{ClientId, FrontendInfo, ReclaimCallback};

/// Entry point for every tuner resource operation. Clone and share across
/// threads; all clones refer to the same underlying state.
#[derive(Clone)]
pub struct Arbiter {
    state: Arc<Mutex<ArbiterState>>
}
impl Arbiter {
    /// Creates a new arbiter with no frontends, LNBs, CAS or CiCam resources
    /// registered. Use `set_frontend_info_list`/`set_lnb_info_list`/
    /// `update_cas_info`/`update_cicam_info` to populate the inventory.
    pub fn new(config: ArbiterConfig) -> Arbiter {
        Arbiter { state: Arc::new(Mutex::new(ArbiterState::new(config))) }
    }

    /// Registers a new client. `session_tag`, when given, is the key the
    /// foreground oracle is queried with instead of `process_id`.
    /// `death_rx`, when given, is watched for channel disconnect; the client
    /// is unregistered automatically once the sending half is dropped.
    pub fn register(&self, session_tag: Option<String>, use_case: &str, process_id: u32,
                     reclaim_callback: Option<Box<dyn ReclaimCallback>>,
                     death_rx: Option<Receiver<()>>) -> ArbiterResult<ClientId> {
        let client_id = {
            let mut guard = self.state.lock().unwrap();
            guard.register(session_tag, use_case, process_id, reclaim_callback)?
        };
        DeathWatcher::register(&self.state, client_id, death_rx);
        Ok(client_id)
    }

    /// Unregisters `client_id` and releases everything it owns. Noop if the
    /// client is already unregistered.
    pub fn unregister(&self, client_id: ClientId) {
        self.state.lock().unwrap().unregister(client_id);
    }

    /// Overrides the priority the table would otherwise compute for
    /// `client_id`. Returns `false` if the client is not registered.
    pub fn update_priority(&self, client_id: ClientId, priority: i32, nice_value: i32) -> bool {
        self.state.lock().unwrap().update_priority(client_id, priority, nice_value)
    }

    pub fn request_frontend(&self, client_id: ClientId, fe_type: u8) -> ArbiterResult<u32> {
        self.state.lock().unwrap().request_frontend(client_id, fe_type)
    }

    pub fn share_frontend(&self, client_id: ClientId, target_id: ClientId) -> ArbiterResult<()> {
        self.state.lock().unwrap().share_frontend(client_id, target_id)
    }

    pub fn release_frontend(&self, handle: u32, client_id: ClientId) -> ArbiterResult<()> {
        self.state.lock().unwrap().release_frontend(handle, client_id)
    }

    pub fn request_lnb(&self, client_id: ClientId) -> ArbiterResult<u32> {
        self.state.lock().unwrap().request_lnb(client_id)
    }

    pub fn release_lnb(&self, handle: u32, client_id: ClientId) -> ArbiterResult<()> {
        self.state.lock().unwrap().release_lnb(handle, client_id)
    }

    pub fn request_cas(&self, client_id: ClientId, system_id: u8) -> ArbiterResult<u32> {
        self.state.lock().unwrap().request_cas(client_id, system_id)
    }

    pub fn release_cas(&self, handle: u32, client_id: ClientId) -> ArbiterResult<()> {
        self.state.lock().unwrap().release_cas(handle, client_id)
    }

    pub fn request_cicam(&self, client_id: ClientId, cicam_id: u8) -> ArbiterResult<u32> {
        self.state.lock().unwrap().request_cicam(client_id, cicam_id)
    }

    pub fn release_cicam(&self, handle: u32, client_id: ClientId) -> ArbiterResult<()> {
        self.state.lock().unwrap().release_cicam(handle, client_id)
    }

    /// Demuxes and descramblers are never tracked per client; every call
    /// succeeds with a fresh handle.
    pub fn request_demux(&self) -> u32 {
        self.state.lock().unwrap().request_demux()
    }

    pub fn request_descrambler(&self) -> u32 {
        self.state.lock().unwrap().request_descrambler()
    }

    /// Reports the HAL's current frontend inventory. Frontends absent from
    /// `infos` are removed and their owners silently lose them, with no
    /// reclaim callback invoked; frontends present but unknown are added.
    pub fn set_frontend_info_list(&self, infos: Vec<FrontendInfo>) {
        self.state.lock().unwrap().set_frontend_info_list(infos);
    }

    /// Reports the HAL's current LNB inventory, same semantics as
    /// `set_frontend_info_list`.
    pub fn set_lnb_info_list(&self, ids: Vec<u8>) {
        self.state.lock().unwrap().set_lnb_info_list(ids);
    }

    /// Declares or resizes a CAS system's session pool. Shrinking below
    /// current occupancy sheds the lowest-priority owners with no callback.
    /// `max_sessions == 0` removes the pool entirely.
    pub fn update_cas_info(&self, system_id: u8, max_sessions: u32) {
        self.state.lock().unwrap().update_cas_info(system_id, max_sessions);
    }

    /// Declares or resizes a CiCam's session pool, same semantics as
    /// `update_cas_info`.
    pub fn update_cicam_info(&self, cicam_id: u8, max_sessions: u32) {
        self.state.lock().unwrap().update_cicam_info(cicam_id, max_sessions);
    }

    /// Snapshots the live map for `res_type`, leaving it empty. Used around
    /// a HAL reconfiguration window that might fail partway through.
    pub fn store_resource_map(&self, res_type: ResourceType) {
        self.state.lock().unwrap().store_map(res_type);
    }

    pub fn clear_resource_map(&self, res_type: ResourceType) {
        self.state.lock().unwrap().clear_map(res_type);
    }

    pub fn restore_resource_map(&self, res_type: ResourceType) {
        self.state.lock().unwrap().restore_map(res_type);
    }

    /// Returns whether at least one frontend of `fe_type` has no owner.
    pub fn has_unused_frontend(&self, fe_type: u8) -> bool {
        self.state.lock().unwrap().has_unused_frontend(fe_type)
    }

    /// Returns whether `client_id` would lose an arbitration against every
    /// current holder of a frontend of `fe_type`.
    pub fn is_lowest_priority(&self, client_id: ClientId, fe_type: u8) -> ArbiterResult<bool> {
        self.state.lock().unwrap().is_lowest_priority(client_id, fe_type)
    }

    /// Returns whether `challenger_id` outranks `holder_id`. `false` for
    /// either id not being registered, no error is raised.
    pub fn is_higher_priority(&self, challenger_id: ClientId, holder_id: ClientId) -> bool {
        self.state.lock().unwrap().is_higher_priority(challenger_id, holder_id)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::AlwaysBackground;
    use crate::types::FrontendInfo;

    fn arbiter() -> Arbiter {
        let config = ArbiterConfig::new(vec![("playback".to_string(), 500, 500)],
                                         Box::new(AlwaysBackground));
        Arbiter::new(config)
    }

    #[test]
    fn register_then_request_frontend_round_trips_through_the_lock() {
        let arb = arbiter();
        arb.set_frontend_info_list(vec![FrontendInfo { id: 0, fe_type: 1, exclusive_group_id: 0 }]);
        let client = arb.register(None, "playback", 1, None, None).unwrap();
        let handle = arb.request_frontend(client, 1).unwrap();
        assert!(arb.release_frontend(handle, client).is_ok());
    }

    #[test]
    fn unregister_unknown_client_is_a_noop() {
        let arb = arbiter();
        arb.unregister(9999);
    }

    #[test]
    fn death_watch_unregisters_client_on_channel_drop() {
        let arb = arbiter();
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let client = arb.register(None, "playback", 1, None, Some(rx)).unwrap();
        drop(tx);
        for _ in 0..200 {
            if ! arb.state.lock().unwrap().clients.contains(client) { return }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        panic!("client was not unregistered after death watch channel closed");
    }

    #[test]
    fn register_rejects_unknown_use_case() {
        let arb = arbiter();
        assert_eq!(Err(ArbiterError::UnknownUseCase { use_case: "voip".to_string() }),
                   arb.register(None, "voip", 1, None, None));
    }
}
