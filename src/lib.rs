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

//! Arbitrates access to a fixed pool of TV tuner resources - frontends, LNBs,
//! CAS and CiCam sessions, demuxes and descramblers - among competing
//! clients of a set-top box.
//!
//! Every decision is made under a single global lock against a cached,
//! lazily recomputed per-client priority. A client that already holds the
//! scarcest resource type can still be displaced by a strictly higher
//! priority challenger; ties always favor the current holder. Displacement
//! runs a two-phase reclaim: every affected client's callback is asked to
//! confirm first, and state is mutated only if every one of them agrees.
//!
//! `Arbiter` is the sole public entry point; everything else in the crate is
//! implementation detail reachable only through it.

#[macro_use]
extern crate lazy_static;

mod api;
mod arbiter;
mod collections;
mod config;
mod deathwatch;
mod engine;
mod errorhandling;
mod handle;
mod logmacros;
mod priority;
mod registry;
mod types;

pub use api::Arbiter;
pub use config::{ArbiterConfig, ForegroundOracle};
pub use errorhandling::{ArbiterError, ArbiterResult};
pub use handle::{ResourceType, INVALID_HANDLE};
pub use logmacros::{set_sink, Level, LogSink};
pub use types::{ClientId, FrontendInfo, ReclaimCallback};
