//! The `ActiveColumnsLog` records which columns won at every timestep.
//!
//! It is append-only: each timestep is written at most once and no entry is ever overwritten.
//! Timesteps need not arrive in order, so a timestep skipped because its input was rejected can be
//! recorded later. Downstream consumers (e.g. a temporal memory) read it through the spatial pooler
//! that owns it.
//!
//! History can grow without bound. A retention limit keeps only the newest timesteps. Once an
//! entry is evicted, every timestep at or before it is closed: the log can no longer tell whether
//! such a timestep was written, so it refuses them with `StaleTimestep`.

use crate::error::{Result, SpatialPoolerError};
use fxhash::FxHashMap;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct ActiveColumnsLog {
    /// Winners per timestep, each sorted ascending.
    entries: FxHashMap<u64, Vec<usize>>,

    /// Retained timesteps in timestep order.
    order: BTreeSet<u64>,

    /// Maximum number of retained timesteps. `None` keeps everything.
    retention: Option<usize>,

    /// Newest timestep dropped by retention.
    evicted_through: Option<u64>,

    /// The most recent timestep ever recorded, evicted or not.
    latest: Option<u64>,
}

impl ActiveColumnsLog {
    /// Creates an empty log keeping at most `retention` timesteps.
    pub fn new(retention: Option<usize>) -> Self {
        Self {
            entries: FxHashMap::default(),
            order: BTreeSet::new(),
            retention,
            evicted_through: None,
            latest: None,
        }
    }

    /// Fails unless `timestep` can still be written: `DuplicateTimestep` if it is already recorded,
    /// `StaleTimestep` if retention has moved past it.
    pub fn check_timestep(&self, timestep: u64) -> Result<()> {
        if self.entries.contains_key(&timestep) {
            return Err(SpatialPoolerError::DuplicateTimestep { timestep });
        }
        match self.evicted_through {
            Some(evicted_through) if timestep <= evicted_through => {
                Err(SpatialPoolerError::StaleTimestep {
                    timestep,
                    evicted_through,
                })
            }
            _ => Ok(()),
        }
    }

    /// Records the winners of `timestep`. The log is left unchanged on error.
    pub fn record(&mut self, timestep: u64, mut columns: Vec<usize>) -> Result<()> {
        self.check_timestep(timestep)?;

        columns.sort_unstable();
        columns.dedup();

        self.entries.insert(timestep, columns);
        self.order.insert(timestep);
        self.latest = self.latest.max(Some(timestep));

        if let Some(limit) = self.retention {
            while self.order.len() > limit {
                if let Some(oldest) = self.order.pop_first() {
                    self.entries.remove(&oldest);
                    self.evicted_through = self.evicted_through.max(Some(oldest));
                }
            }
        }

        Ok(())
    }

    /// Winners of `timestep`, if it is recorded and still retained.
    #[inline]
    pub fn get(&self, timestep: u64) -> Option<&[usize]> {
        self.entries.get(&timestep).map(Vec::as_slice)
    }

    #[inline]
    pub fn contains(&self, timestep: u64) -> bool {
        self.entries.contains_key(&timestep)
    }

    /// The retained entry with the highest timestep.
    pub fn latest(&self) -> Option<(u64, &[usize])> {
        let t = *self.order.last()?;
        self.get(t).map(|cols| (t, cols))
    }

    /// Highest timestep ever recorded, including evicted ones.
    #[inline]
    pub fn latest_timestep(&self) -> Option<u64> {
        self.latest
    }

    /// Newest timestep dropped by retention. Nothing at or before it can be recorded.
    #[inline]
    pub fn evicted_through(&self) -> Option<u64> {
        self.evicted_through
    }

    #[inline]
    pub fn retention(&self) -> Option<usize> {
        self.retention
    }

    /// Number of retained timesteps.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Retained entries in timestep order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[usize])> + '_ {
        self.order
            .iter()
            .filter_map(move |&t| self.entries.get(&t).map(|cols| (t, cols.as_slice())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_get() {
        let mut log = ActiveColumnsLog::new(None);
        log.record(0, vec![3, 1, 2]).unwrap();
        log.record(4, vec![]).unwrap();

        assert_eq!(log.get(0), Some(&[1, 2, 3][..]));
        assert_eq!(log.get(4), Some(&[][..]));
        assert_eq!(log.get(2), None);
        assert_eq!(log.latest(), Some((4, &[][..])));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_entries_are_never_overwritten() {
        let mut log = ActiveColumnsLog::new(None);
        log.record(1, vec![5]).unwrap();

        let err = log.record(1, vec![6]).unwrap_err();
        assert_eq!(err, SpatialPoolerError::DuplicateTimestep { timestep: 1 });
        assert_eq!(log.get(1), Some(&[5][..]));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_skipped_timestep_can_be_filled_later() {
        let mut log = ActiveColumnsLog::new(None);
        log.record(2, vec![1]).unwrap();
        log.record(4, vec![2]).unwrap();

        log.record(3, vec![7]).unwrap();
        log.record(0, vec![]).unwrap();

        let kept: Vec<u64> = log.iter().map(|(t, _)| t).collect();
        assert_eq!(kept, vec![0, 2, 3, 4]);
        assert_eq!(log.get(3), Some(&[7][..]));
        assert_eq!(log.latest(), Some((4, &[2][..])));
        assert_eq!(log.latest_timestep(), Some(4));
        assert_eq!(
            log.record(3, vec![]),
            Err(SpatialPoolerError::DuplicateTimestep { timestep: 3 })
        );
    }

    #[test]
    fn test_retention_evicts_oldest() {
        let mut log = ActiveColumnsLog::new(Some(2));
        for t in 0..5 {
            log.record(t, vec![t as usize]).unwrap();
        }

        let kept: Vec<u64> = log.iter().map(|(t, _)| t).collect();
        assert_eq!(kept, vec![3, 4]);
        assert!(!log.contains(0));
        assert_eq!(log.evicted_through(), Some(2));
        assert_eq!(
            log.record(2, vec![]),
            Err(SpatialPoolerError::StaleTimestep {
                timestep: 2,
                evicted_through: 2
            })
        );
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_retention_evicts_lowest_timestep() {
        let mut log = ActiveColumnsLog::new(Some(2));
        log.record(5, vec![]).unwrap();
        log.record(9, vec![]).unwrap();
        log.record(7, vec![]).unwrap();

        let kept: Vec<u64> = log.iter().map(|(t, _)| t).collect();
        assert_eq!(kept, vec![7, 9]);
        assert_eq!(log.evicted_through(), Some(5));

        // 6 is older than every retained entry, so it is evicted straight away.
        log.record(6, vec![]).unwrap();
        assert!(!log.contains(6));
        assert_eq!(log.evicted_through(), Some(6));

        log.record(8, vec![]).unwrap();
        let kept: Vec<u64> = log.iter().map(|(t, _)| t).collect();
        assert_eq!(kept, vec![8, 9]);
        assert_eq!(log.evicted_through(), Some(7));
    }
}
