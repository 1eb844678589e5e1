use crate::board::Fingerprint;

use rustc_hash::FxHashMap;

/// When a board that was already expanded may be expanded again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevisitPolicy {
    /// A board is expanded at most once, whatever budget it is reached with.
    #[default]
    FirstVisit,
    /// A board is expanded again when reached with a larger depth budget.
    DeeperBudget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VisitEntry {
    index: u32,
    depth_remaining: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Visit {
    New,
    /// Already explored; `lookback` counts the boards discovered since.
    Seen { lookback: usize },
}

#[derive(Debug, Default)]
pub(crate) struct VisitedStates {
    policy: RevisitPolicy,
    entries: FxHashMap<Fingerprint, VisitEntry>,
}

impl VisitedStates {
    pub(crate) fn new(policy: RevisitPolicy) -> Self {
        Self {
            policy,
            entries: FxHashMap::default(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Records a visit and tells whether the board should be expanded.
    pub(crate) fn visit(&mut self, key: Fingerprint, depth_remaining: i32) -> Visit {
        let next_index = self.entries.len() as u32;
        match self.entries.get_mut(&key) {
            Some(entry) => {
                if self.policy == RevisitPolicy::DeeperBudget
                    && depth_remaining > entry.depth_remaining
                {
                    entry.depth_remaining = depth_remaining;
                    Visit::New
                } else {
                    Visit::Seen {
                        lookback: (next_index - entry.index) as usize,
                    }
                }
            }
            None => {
                self.entries.insert(
                    key,
                    VisitEntry {
                        index: next_index,
                        depth_remaining,
                    },
                );
                Visit::New
            }
        }
    }
}
