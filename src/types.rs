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

//! Core data model: client profiles and the four resource kinds.

use std::collections::BTreeSet;

/// Unique, monotonically assigned client identity. Never reused within a
/// process lifetime.
pub type ClientId = u32;

/// Fire-and-forget notification delivered to a client that has just had, or
/// is about to have, one or more resources forcibly withdrawn.
/// Invoked while the arbiter holds its global lock; implementations must
/// enqueue the work elsewhere rather than process it inline.
/// Returns `false` if delivery failed, in which case the reclaim that
/// triggered it fails with `ReclaimFailed` and no state is mutated.
pub trait ReclaimCallback: Send {
    fn on_reclaim(&self) -> bool;
}

/// One row of a HAL-reported frontend configuration, as passed to
/// `set_frontend_info_list`.
pub struct FrontendInfo {
    pub id: u8,
    pub fe_type: u8,
    pub exclusive_group_id: u32
}

/// Per-client bookkeeping: use case, cached priority, and every resource the
/// client currently owns or shares in.
pub struct ClientProfile {
    pub(crate) id: ClientId,
    pub(crate) session_tag: Option<String>,
    pub(crate) use_case: String,
    pub(crate) process_id: u32,
    pub(crate) priority: i32,
    pub(crate) priority_overwritten: bool,
    pub(crate) nice_value: i32,
    pub(crate) in_use_frontends: BTreeSet<u8>,
    pub(crate) share_fe_clients: BTreeSet<ClientId>,
    pub(crate) in_use_lnbs: BTreeSet<u8>,
    pub(crate) in_use_cas_system_id: Option<u8>,
    pub(crate) in_use_cicam_id: Option<u8>,
    pub(crate) reclaim_callback: Option<Box<dyn ReclaimCallback>>
}
impl ClientProfile {
    pub(crate) fn new(id: ClientId, session_tag: Option<String>, use_case: &str,
                       process_id: u32, reclaim_callback: Option<Box<dyn ReclaimCallback>>)
                       -> ClientProfile {
        ClientProfile {
            id,
            session_tag,
            use_case: use_case.to_string(),
            process_id,
            priority: 0,
            priority_overwritten: false,
            nice_value: 0,
            in_use_frontends: BTreeSet::new(),
            share_fe_clients: BTreeSet::new(),
            in_use_lnbs: BTreeSet::new(),
            in_use_cas_system_id: None,
            in_use_cicam_id: None,
            reclaim_callback
        }
    }

    /// Process id the foreground oracle should be queried with: the session
    /// tag, when present, stands in for the calling process.
    pub(crate) fn foreground_key(&self) -> String {
        self.session_tag.clone().unwrap_or_else(|| self.process_id.to_string())
    }
}

/// Frontend: the scarcest resource, grouped into exclusive sets that cannot
/// operate concurrently.
pub(crate) struct FrontendResource {
    pub(crate) id: u8,
    pub(crate) fe_type: u8,
    pub(crate) exclusive_group_id: u32,
    pub(crate) exclusive_group_members: BTreeSet<u8>,
    pub(crate) owner_client_id: Option<ClientId>
}

/// Low-noise-block down-converter: counted, never shared.
pub(crate) struct LnbResource {
    pub(crate) id: u8,
    pub(crate) owner_client_id: Option<ClientId>
}

/// Conditional-access session pool for one CAS system.
pub(crate) struct CasResource {
    pub(crate) system_id: u8,
    pub(crate) max_sessions: u32,
    pub(crate) owner_client_ids: Vec<ClientId>
}

/// CiCam session pool.
pub(crate) struct CiCamResource {
    pub(crate) cicam_id: u8,
    pub(crate) max_sessions: u32,
    pub(crate) owner_client_ids: Vec<ClientId>
}
