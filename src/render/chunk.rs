use std::ops::Range;

use crate::error::{VisualizerError, VisualizerResult};

/// Contiguous frame range rendered and written by one worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub worker: usize,
    pub frames: Range<usize>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

/// Frames and chunks owned by one worker, in increasing frame order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerPlan {
    pub worker: usize,
    pub chunks: Vec<Chunk>,
}

impl WorkerPlan {
    pub fn frames(&self) -> Range<usize> {
        let start = self.chunks.first().map_or(0, |c| c.frames.start);
        let end = self.chunks.last().map_or(start, |c| c.frames.end);
        start..end
    }
}

/// Assignment of every frame of a run to exactly one worker.
///
/// Each worker owns one contiguous block so that concatenating the workers'
/// outputs in worker order preserves frame order. Every block is made of
/// `rounds - 1` full chunks of `chunk_size` frames, then one chunk from the
/// final set, which splits the remaining frames equally between workers (the
/// first `remainder % workers` get one more). A worker whose share of the
/// final set is zero gets no final chunk, so no chunk is ever empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkPlan {
    pub total_frames: usize,
    pub chunk_size: usize,
    pub workers: Vec<WorkerPlan>,
}

impl ChunkPlan {
    pub fn new(total_frames: usize, chunk_size: usize, workers: usize) -> VisualizerResult<Self> {
        if total_frames == 0 {
            return Err(VisualizerError::invalid_range("there are no frames to render"));
        }
        if chunk_size == 0 {
            return Err(VisualizerError::configuration("chunk size must be at least 1"));
        }
        if workers == 0 {
            return Err(VisualizerError::configuration("worker count must be at least 1"));
        }

        let workers = workers.min(total_frames);
        let rounds = total_frames.div_ceil(workers * chunk_size);
        let full_rounds = rounds - 1;
        let remainder = total_frames - full_rounds * workers * chunk_size;
        let (base, extra) = (remainder / workers, remainder % workers);

        let mut plans = Vec::with_capacity(workers);
        let mut cursor = 0;
        for worker in 0..workers {
            let mut chunks = Vec::with_capacity(rounds);
            for _ in 0..full_rounds {
                chunks.push(Chunk {
                    worker,
                    frames: cursor..cursor + chunk_size,
                });
                cursor += chunk_size;
            }
            let last = base + usize::from(worker < extra);
            if last > 0 {
                chunks.push(Chunk {
                    worker,
                    frames: cursor..cursor + last,
                });
                cursor += last;
            }
            plans.push(WorkerPlan { worker, chunks });
        }
        debug_assert_eq!(cursor, total_frames);

        Ok(Self {
            total_frames,
            chunk_size,
            workers: plans,
        })
    }

    pub fn num_chunks(&self) -> usize {
        self.workers.iter().map(|w| w.chunks.len()).sum()
    }

    #[allow(dead_code)]
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.workers.iter().flat_map(|w| w.chunks.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exact_cover(plan: &ChunkPlan) {
        let mut seen = vec![0u8; plan.total_frames];
        for chunk in plan.chunks() {
            for f in chunk.frames.clone() {
                seen[f] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1), "frames covered more or less than once");
    }

    #[test]
    fn chunks_partition_all_frames_exactly_once() {
        for total in [1usize, 2, 7, 30, 64, 100, 257, 1000, 1801] {
            for chunk_size in [1usize, 3, 16, 128] {
                for workers in [1usize, 2, 3, 8, 16] {
                    let plan = ChunkPlan::new(total, chunk_size, workers).unwrap();
                    assert_exact_cover(&plan);

                    let chunks: Vec<_> = plan.chunks().collect();
                    assert!(chunks.iter().all(|c| !c.frames.is_empty()));
                    for pair in chunks.windows(2) {
                        assert_eq!(pair[0].frames.end, pair[1].frames.start);
                    }

                    let rounds = total.div_ceil(plan.workers.len() * chunk_size);
                    for w in &plan.workers {
                        assert!(!w.chunks.is_empty());
                        assert!(w.chunks.len() == rounds || w.chunks.len() + 1 == rounds);
                    }
                }
            }
        }
    }

    #[test]
    fn chunk_count_rounds_up_to_a_multiple_of_workers() {
        // ceil(1000 / (4 * 64)) = 4 rounds
        let plan = ChunkPlan::new(1000, 64, 4).unwrap();
        assert_eq!(plan.num_chunks(), 16);
        assert!(plan.workers.iter().all(|w| w.chunks.len() == 4));
    }

    #[test]
    fn final_chunk_set_splits_remainder_equally() {
        // 3 full rounds use 3 * 4 * 64 = 768 frames, 232 remain: 58 each
        let plan = ChunkPlan::new(1000, 64, 4).unwrap();
        for w in &plan.workers {
            let (last, full) = w.chunks.split_last().unwrap();
            assert!(full.iter().all(|c| c.len() == 64));
            assert_eq!(last.len(), 58);
        }

        // 10 frames over 4 workers: 3, 3, 2, 2
        let plan = ChunkPlan::new(10, 64, 4).unwrap();
        let sizes: Vec<_> = plan.workers.iter().map(|w| w.frames().len()).collect();
        assert_eq!(sizes, vec![3, 3, 2, 2]);
    }

    #[test]
    fn zero_shares_of_the_final_set_are_skipped() {
        // 2 full rounds use 12 frames, the single remaining frame goes to worker 0
        let plan = ChunkPlan::new(13, 2, 3).unwrap();
        let ranges: Vec<Vec<_>> = plan
            .workers
            .iter()
            .map(|w| w.chunks.iter().map(|c| c.frames.clone()).collect())
            .collect();
        assert_eq!(
            ranges,
            vec![vec![0..2, 2..4, 4..5], vec![5..7, 7..9], vec![9..11, 11..13]]
        );
        assert_eq!(plan.num_chunks(), 7);
    }

    #[test]
    fn workers_own_contiguous_blocks_in_order() {
        let plan = ChunkPlan::new(500, 32, 3).unwrap();
        let mut expected_start = 0;
        for (i, w) in plan.workers.iter().enumerate() {
            assert_eq!(w.worker, i);
            assert_eq!(w.frames().start, expected_start);
            assert!(w.chunks.iter().all(|c| c.worker == i));
            expected_start = w.frames().end;
        }
        assert_eq!(expected_start, 500);
    }

    #[test]
    fn idle_workers_are_not_planned() {
        let plan = ChunkPlan::new(3, 8, 16).unwrap();
        assert_eq!(plan.workers.len(), 3);
        assert!(plan.chunks().all(|c| c.len() == 1));
    }

    #[test]
    fn rejects_empty_inputs() {
        assert!(ChunkPlan::new(0, 8, 2).is_err());
        assert!(ChunkPlan::new(10, 0, 2).is_err());
        assert!(ChunkPlan::new(10, 8, 0).is_err());
    }
}
