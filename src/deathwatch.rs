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

//! Observes liveness of a client's reclaim-callback endpoint.
//!
//! One background thread per watched client blocks on the disconnect of an
//! `mpsc` channel; when the sending half is dropped, `recv` wakes with an
//! error and the watcher schedules an `unregister` through the arbiter,
//! under the same global mutex every other operation uses.

use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::thread;
use crate::arbiter::ArbiterState;
use crate::types::ClientId;
use crate::{arbdebug, arbinfo};

pub(crate) struct DeathWatcher;
impl DeathWatcher {
    /// Spawns a watcher thread for `client_id`, unless one is already
    /// running for it. A client registered with no callback channel has no
    /// liveness signal and is accepted silently without a watcher.
    pub(crate) fn register(state: &Arc<Mutex<ArbiterState>>, client_id: ClientId,
                            rx: Option<Receiver<()>>) {
        let Some(rx) = rx else { return };
        {
            let mut guard = state.lock().unwrap();
            if ! guard.watched_clients.insert(client_id) { return }
        }
        let state = Arc::clone(state);
        thread::spawn(move || DeathWatcher::run(state, client_id, rx));
    }

    fn run(state: Arc<Mutex<ArbiterState>>, client_id: ClientId, rx: Receiver<()>) {
        loop {
            match rx.recv() {
                Ok(()) => continue,
                Err(_) => {
                    arbinfo!("death watch: client {} callback channel closed", client_id);
                    let mut guard = state.lock().unwrap();
                    guard.watched_clients.remove(&client_id);
                    guard.unregister(client_id);
                    arbdebug!("death watch: client {} unregistered", client_id);
                    break
                }
            }
        }
    }
}
