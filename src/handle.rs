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

//! Opaque resource handles.
//!
//! A handle is a 32-bit integer with bits 31..24 carrying the resource type,
//! bits 23..16 the resource id within that type, and bits 15..0 a monotonic
//! request tag that lets callers tell repeated grants of the same resource
//! apart. The tag is not consulted by equality or ownership checks.

use crate::errorhandling::ArbiterError;

/// Sentinel handle value returned when a request could not be granted.
pub const INVALID_HANDLE: u32 = u32::MAX;

/// The four owned resource types plus the two always-available ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Frontend,
    Lnb,
    Cas,
    CiCam,
    Demux,
    Descrambler
}
impl ResourceType {
    fn tag(self) -> u8 {
        match self {
            ResourceType::Frontend => 0,
            ResourceType::Lnb => 1,
            ResourceType::Cas => 2,
            ResourceType::CiCam => 3,
            ResourceType::Demux => 4,
            ResourceType::Descrambler => 5
        }
    }

    fn from_tag(tag: u8) -> Option<ResourceType> {
        match tag {
            0 => Some(ResourceType::Frontend),
            1 => Some(ResourceType::Lnb),
            2 => Some(ResourceType::Cas),
            3 => Some(ResourceType::CiCam),
            4 => Some(ResourceType::Demux),
            5 => Some(ResourceType::Descrambler),
            _ => None
        }
    }
}

/// Encodes and decodes opaque resource handles.
/// A zero-state type; the monotonic tag counter it needs lives on the
/// resource registry so every resource type shares one process-wide sequence,
/// consistent with the design note that the request counter is part of the
/// single mutex-protected aggregate.
pub(crate) struct HandleCodec;
impl HandleCodec {
    /// Builds a handle from its parts. `tag` wraps silently on overflow,
    /// callers obtain it from `ResourceRegistry::next_tag`.
    pub(crate) fn encode(res_type: ResourceType, resource_id: u8, tag: u16) -> u32 {
        ((res_type.tag() as u32) << 24) | ((resource_id as u32) << 16) | (tag as u32)
    }

    /// Decodes a handle, verifying it carries the expected resource type.
    pub(crate) fn decode(handle: u32, expected: ResourceType) -> Result<u8, ArbiterError> {
        if handle == INVALID_HANDLE { return Err(ArbiterError::BadHandle { handle }) }
        let tag = ((handle >> 24) & 0xff) as u8;
        let res_type = ResourceType::from_tag(tag).ok_or(ArbiterError::BadHandle { handle })?;
        if res_type != expected { return Err(ArbiterError::BadHandle { handle }) }
        Ok(((handle >> 16) & 0xff) as u8)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip() {
        let h = HandleCodec::encode(ResourceType::Frontend, 3, 42);
        assert_eq!(3, HandleCodec::decode(h, ResourceType::Frontend).unwrap());
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let h = HandleCodec::encode(ResourceType::Lnb, 1, 0);
        assert!(HandleCodec::decode(h, ResourceType::Frontend).is_err());
    }

    #[test]
    fn tag_does_not_affect_equality_of_decoded_id() {
        let h1 = HandleCodec::encode(ResourceType::Cas, 5, 0);
        let h2 = HandleCodec::encode(ResourceType::Cas, 5, 65535);
        assert_eq!(HandleCodec::decode(h1, ResourceType::Cas).unwrap(),
                   HandleCodec::decode(h2, ResourceType::Cas).unwrap());
        assert_ne!(h1, h2);
    }

    #[test]
    fn invalid_handle_is_rejected() {
        assert!(HandleCodec::decode(INVALID_HANDLE, ResourceType::Frontend).is_err());
    }

    #[test]
    fn tags_never_collide_across_types() {
        let fe = HandleCodec::encode(ResourceType::Frontend, 0, 0);
        let lnb = HandleCodec::encode(ResourceType::Lnb, 0, 0);
        assert_ne!(fe, lnb);
    }
}
