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

//! End-to-end scenarios against the public `Arbiter` boundary only.

use std::sync::mpsc;
use tuner_arbiter::{Arbiter, ArbiterConfig, ArbiterError, ForegroundOracle, FrontendInfo,
                     ReclaimCallback};

struct RecordingCallback {
    tx: mpsc::Sender<()>
}
impl ReclaimCallback for RecordingCallback {
    fn on_reclaim(&self) -> bool { self.tx.send(()).is_ok() }
}

struct Background;
impl ForegroundOracle for Background {
    fn is_foreground(&self, _process_key: &str) -> bool { false }
}

fn arbiter_with(rows: &[(&str, i32, i32)]) -> Arbiter {
    let rows = rows.iter().map(|(u, f, b)| (u.to_string(), *f, *b)).collect();
    Arbiter::new(ArbiterConfig::new(rows, Box::new(Background)))
}

#[test]
fn sibling_grouping_grants_both_frontends_in_one_call() {
    let arb = arbiter_with(&[("playback", 500, 500)]);
    arb.set_frontend_info_list(vec![
        FrontendInfo { id: 0, fe_type: 1, exclusive_group_id: 7 },
        FrontendInfo { id: 1, fe_type: 1, exclusive_group_id: 7 }
    ]);
    let client = arb.register(None, "playback", 100, None, None).unwrap();
    let handle = arb.request_frontend(client, 1).unwrap();
    assert!(arb.release_frontend(handle, client).is_ok());
}

#[test]
fn sibling_denial_ties_favor_the_holder() {
    let arb = arbiter_with(&[("playback", 500, 500)]);
    arb.set_frontend_info_list(vec![
        FrontendInfo { id: 0, fe_type: 1, exclusive_group_id: 7 },
        FrontendInfo { id: 1, fe_type: 1, exclusive_group_id: 7 }
    ]);
    let a = arb.register(None, "playback", 100, None, None).unwrap();
    arb.request_frontend(a, 1).unwrap();
    let b = arb.register(None, "playback", 200, None, None).unwrap();
    assert_eq!(Err(ArbiterError::Denied), arb.request_frontend(b, 1));
}

#[test]
fn sibling_reclaim_displaces_a_lower_priority_group_holder() {
    let arb = arbiter_with(&[("low", 100, 100), ("high", 900, 900)]);
    arb.set_frontend_info_list(vec![
        FrontendInfo { id: 0, fe_type: 1, exclusive_group_id: 7 },
        FrontendInfo { id: 1, fe_type: 1, exclusive_group_id: 7 }
    ]);
    let (tx, rx) = mpsc::channel();
    let low = arb.register(None, "low", 100,
                            Some(Box::new(RecordingCallback { tx })), None).unwrap();
    arb.request_frontend(low, 1).unwrap();
    let high = arb.register(None, "high", 200, None, None).unwrap();
    let handle = arb.request_frontend(high, 1).unwrap();
    assert!(arb.release_frontend(handle, high).is_ok());
    assert!(rx.try_recv().is_ok());
}

#[test]
fn share_then_reclaim_evicts_the_whole_group() {
    let arb = arbiter_with(&[("low", 100, 100), ("high", 900, 900)]);
    arb.set_frontend_info_list(vec![FrontendInfo { id: 0, fe_type: 1, exclusive_group_id: 0 }]);
    let owner = arb.register(None, "low", 100, None, None).unwrap();
    arb.request_frontend(owner, 1).unwrap();
    let sharer = arb.register(None, "low", 200, None, None).unwrap();
    arb.share_frontend(sharer, owner).unwrap();

    let high = arb.register(None, "high", 300, None, None).unwrap();
    assert!(arb.request_frontend(high, 1).is_ok());
    // owner and sharer both lost the frontend; neither can share or release it anymore
    assert!(arb.share_frontend(owner, sharer).is_err());
}

#[test]
fn cas_semaphore_enforces_max_sessions_then_reclaims() {
    let arb = arbiter_with(&[("low", 100, 100), ("mid", 400, 400), ("high", 900, 900)]);
    arb.update_cas_info(5, 2);
    let d = arb.register(None, "mid", 100, None, None).unwrap();
    let e = arb.register(None, "mid", 200, None, None).unwrap();
    arb.request_cas(d, 5).unwrap();
    arb.request_cas(e, 5).unwrap();

    let f = arb.register(None, "high", 300, None, None).unwrap();
    assert!(arb.request_cas(f, 5).is_ok());
}

#[test]
fn live_removal_drops_one_frontend_and_keeps_its_sibling() {
    let arb = arbiter_with(&[("playback", 500, 500)]);
    arb.set_frontend_info_list(vec![
        FrontendInfo { id: 0, fe_type: 1, exclusive_group_id: 0 },
        FrontendInfo { id: 1, fe_type: 1, exclusive_group_id: 0 }
    ]);
    let client = arb.register(None, "playback", 100, None, None).unwrap();
    let handle = arb.request_frontend(client, 1).unwrap();

    arb.set_frontend_info_list(vec![FrontendInfo { id: 1, fe_type: 1, exclusive_group_id: 0 }]);
    assert!(! arb.has_unused_frontend(1));
    // the pre-reconfiguration handle still decodes (same resource type and id range),
    // but whichever frontend it names is either gone or reassigned bookkeeping, so a
    // second client of the same type is still fully denied rather than finding a free one
    let other = arb.register(None, "playback", 200, None, None).unwrap();
    assert_eq!(Err(ArbiterError::Denied), arb.request_frontend(other, 1));
    let _ = handle;
}

#[test]
fn is_lowest_priority_reports_false_with_no_holders() {
    let arb = arbiter_with(&[("playback", 500, 500)]);
    let client = arb.register(None, "playback", 100, None, None).unwrap();
    assert_eq!(Ok(false), arb.is_lowest_priority(client, 1));
}
