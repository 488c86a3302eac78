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

//! Static use-case to priority mapping, fixed at startup.

use crate::collections::MapWithDefault;
use crate::errorhandling::ArbiterError;

/// Upper bound of the priority range, inclusive.
pub const MAX_PRIORITY: i32 = 1000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct PriorityRow {
    fg_priority: i32,
    bg_priority: i32
}

/// Maps `(use_case, foreground?)` to a priority in `[0, MAX_PRIORITY]`.
/// Built once from caller-supplied rows; an unlisted use case carries no
/// row at all, `is_defined` reports that explicitly rather than silently
/// returning a default priority.
pub(crate) struct PriorityTable {
    rows: MapWithDefault<PriorityRow>
}
impl PriorityTable {
    /// Builds a table from `(use_case, fg_priority, bg_priority)` rows.
    pub(crate) fn new(rows: &[(String, i32, i32)]) -> PriorityTable {
        let mut table = MapWithDefault::<PriorityRow>::default();
        for (use_case, fg, bg) in rows {
            table.insert(use_case, PriorityRow { fg_priority: *fg, bg_priority: *bg });
        }
        PriorityTable { rows: table }
    }

    /// Indicates whether `use_case` has an explicit row.
    pub(crate) fn is_defined(&self, use_case: &str) -> bool {
        self.rows.contains(use_case)
    }

    /// Returns the priority for `use_case` in the given foreground state.
    pub(crate) fn priority(&self, use_case: &str, foreground: bool) -> Result<i32, ArbiterError> {
        if ! self.is_defined(use_case) {
            return Err(ArbiterError::UnknownUseCase { use_case: use_case.to_string() })
        }
        let row = self.rows.get(use_case);
        Ok(if foreground { row.fg_priority } else { row.bg_priority })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unknown_use_case_is_rejected() {
        let table = PriorityTable::new(&[]);
        assert!(! table.is_defined("voip"));
        assert!(table.priority("voip", true).is_err());
    }

    #[test]
    fn foreground_and_background_rows_are_distinct() {
        let table = PriorityTable::new(&[("playback".to_string(), 500, 200)]);
        assert!(table.is_defined("playback"));
        assert_eq!(500, table.priority("playback", true).unwrap());
        assert_eq!(200, table.priority("playback", false).unwrap());
    }

    #[test]
    fn foreground_priority_at_least_background_is_representable() {
        let table = PriorityTable::new(&[("live".to_string(), MAX_PRIORITY, MAX_PRIORITY)]);
        assert_eq!(table.priority("live", true).unwrap(), table.priority("live", false).unwrap());
    }
}
