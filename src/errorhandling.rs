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

//! Error type returned by all arbiter operations.

use std::fmt;

/// Errors an `Arbiter` operation can return.
/// Each variant carries the context needed to format a useful message without
/// a separate resource table, since the taxonomy is fixed and small.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArbiterError {
    /// A use case was referenced that has no row in the priority table.
    UnknownUseCase { use_case: String },
    /// A client id was used that is not currently registered.
    Unregistered { client_id: u32 },
    /// The requested resource is owned by one or more clients of equal or
    /// higher priority and cannot be reclaimed.
    Busy,
    /// `share_frontend` was called against an owner that holds no frontend.
    TargetHasNoFrontend { owner_id: u32 },
    /// The operation is not permitted for the caller in its current state.
    Denied,
    /// A reclaim in progress was rejected by the client's callback.
    ReclaimFailed { client_id: u32 },
    /// A handle failed to decode, or decoded to a resource type it does not
    /// belong to.
    BadHandle { handle: u32 },
    /// The caller does not own the resource referenced by the handle.
    NotOwner { client_id: u32, handle: u32 },
    /// A resource id was referenced that is not in the registry.
    UnknownResource { resource_id: i32 }
}
impl fmt::Display for ArbiterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArbiterError::UnknownUseCase { use_case } =>
                write!(f, "use case {} is not defined in the priority table", use_case),
            ArbiterError::Unregistered { client_id } =>
                write!(f, "client {} is not registered", client_id),
            ArbiterError::Busy =>
                write!(f, "client already holds a frontend"),
            ArbiterError::TargetHasNoFrontend { owner_id } =>
                write!(f, "client {} holds no frontend to share", owner_id),
            ArbiterError::Denied =>
                write!(f, "operation denied for caller"),
            ArbiterError::ReclaimFailed { client_id } =>
                write!(f, "reclaim of client {}'s resource was rejected", client_id),
            ArbiterError::BadHandle { handle } =>
                write!(f, "handle {:#010x} is invalid", handle),
            ArbiterError::NotOwner { client_id, handle } =>
                write!(f, "client {} does not own handle {:#010x}", client_id, handle),
            ArbiterError::UnknownResource { resource_id } =>
                write!(f, "resource {} is not registered", resource_id)
        }
    }
}
impl std::error::Error for ArbiterError {}

/// Result type used throughout the crate for error handling.
pub type ArbiterResult<T> = Result<T, ArbiterError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_includes_context() {
        let e = ArbiterError::UnknownUseCase { use_case: "voip".to_string() };
        assert!(format!("{}", e).contains("voip"));
        let e = ArbiterError::BadHandle { handle: 0xdead_beef };
        assert!(format!("{}", e).contains("0xdeadbeef"));
    }
}
