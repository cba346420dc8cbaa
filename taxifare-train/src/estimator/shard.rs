use std::ops::Range;

/// splits `n` batch rows into at most `workers` contiguous shards of nearly
/// equal size. a shard never holds fewer than two rows, so fewer shards are
/// produced when the batch is small. a batch of fewer than two rows yields
/// no shards.
pub fn shard_ranges(n: usize, workers: usize) -> Vec<Range<usize>> {
    if n < 2 {
        return vec![];
    }
    let k = workers.min(n / 2).max(1);
    let base = n / k;
    let extra = n % k;
    let mut start = 0;
    (0..k)
        .map(|i| {
            let len = base + usize::from(i < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}
