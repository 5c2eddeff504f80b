// Copyright 2024
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::BTreeSet;

/// Which segments of a stream a reader yields.
///
/// The two variants are the two modes of selection. Switching mode discards
/// the set kept by the other mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every segment except the excluded ones.
    IncludeAll { excluded: BTreeSet<u64> },
    /// Only the included segments.
    ExcludeAll { included: BTreeSet<u64> },
}

impl Default for Selection {
    fn default() -> Self {
        Selection::IncludeAll {
            excluded: BTreeSet::new(),
        }
    }
}

impl Selection {
    /// Adds `segment` to the included set, leaving include-all mode if needed.
    pub fn include(&mut self, segment: u64) {
        match self {
            Selection::ExcludeAll { included } => {
                included.insert(segment);
            }
            Selection::IncludeAll { .. } => {
                *self = Selection::ExcludeAll {
                    included: BTreeSet::from([segment]),
                };
            }
        }
    }

    /// Adds `segment` to the excluded set, leaving exclude-all mode if needed.
    pub fn exclude(&mut self, segment: u64) {
        match self {
            Selection::IncludeAll { excluded } => {
                excluded.insert(segment);
            }
            Selection::ExcludeAll { .. } => {
                *self = Selection::IncludeAll {
                    excluded: BTreeSet::from([segment]),
                };
            }
        }
    }

    pub fn include_all(&mut self) {
        *self = Selection::default();
    }

    pub fn exclude_all(&mut self) {
        *self = Selection::ExcludeAll {
            included: BTreeSet::new(),
        };
    }

    /// Returns true if `segment` is selected.
    pub fn contains(&self, segment: u64) -> bool {
        match self {
            Selection::IncludeAll { excluded } => !excluded.contains(&segment),
            Selection::ExcludeAll { included } => included.contains(&segment),
        }
    }

    /// Selected segments below `count`, ascending.
    pub fn selected(&self, count: u64) -> Vec<u64> {
        match self {
            Selection::IncludeAll { excluded } => (0..count).filter(|s| !excluded.contains(s)).collect(),
            Selection::ExcludeAll { included } => included.range(..count).copied().collect(),
        }
    }
}
