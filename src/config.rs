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

//! Startup configuration and the external collaborators the arbiter queries.

/// Pull-model foreground detector. The arbiter queries it at most once per
/// client per request and never subscribes, so a slow implementation cannot
/// leave the arbiter holding a stale cache.
pub trait ForegroundOracle: Send {
    fn is_foreground(&self, process_key: &str) -> bool;
}

/// Oracle that treats every process as background. Useful for tests and for
/// callers that have no foreground signal to offer.
pub(crate) struct AlwaysBackground;
impl ForegroundOracle for AlwaysBackground {
    fn is_foreground(&self, _process_key: &str) -> bool { false }
}

/// Construction-time configuration for an `Arbiter`.
/// Priority rows and capacity limits are supplied by the caller; the file
/// format such values might originally come from is an external concern.
pub struct ArbiterConfig {
    pub(crate) priority_rows: Vec<(String, i32, i32)>,
    pub(crate) foreground_oracle: Box<dyn ForegroundOracle>
}
impl ArbiterConfig {
    /// Creates a configuration with the given priority rows and a custom
    /// foreground oracle.
    pub fn new(priority_rows: Vec<(String, i32, i32)>,
               foreground_oracle: Box<dyn ForegroundOracle>) -> ArbiterConfig {
        ArbiterConfig { priority_rows, foreground_oracle }
    }
}
impl Default for ArbiterConfig {
    fn default() -> Self {
        ArbiterConfig { priority_rows: Vec::new(), foreground_oracle: Box::new(AlwaysBackground) }
    }
}
