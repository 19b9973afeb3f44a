use std::io::{Read, Seek, SeekFrom};

use crate::byte_range::ByteRange;
use crate::error::Result;
use crate::needle::Needle;

const INITIAL_RADIUS_NEEDLE_FACTOR: u64 = 64;
const MIN_INITIAL_RADIUS: u64 = 256;
const DEFAULT_SAMPLE_LEN: u64 = 64 * 1024;

/// Partitions a seekable source into roughly `desired_chunks` delimiter-aligned byte ranges.
///
/// Each interior boundary is found by searching an ever-widening window centered on an evenly
/// spaced target offset for the delimiter occurrence closest to it (ties broken toward the
/// preceding occurrence). The delimiter bytes themselves fall in the gap between two ranges, in
/// neither: handing each returned range to its own [`Spliterator`](crate::Spliterator) and
/// concatenating the results in order is equivalent to spliterating the whole source in one pass.
pub fn plan_chunks<R: Read + Seek>(
    source: &mut R,
    needle: &Needle,
    desired_chunks: usize,
) -> Result<Vec<ByteRange>> {
    let total_len = source.seek(SeekFrom::End(0))?;
    let max_chunks = (total_len / needle.len().max(1) as u64).min(total_len);
    let effective_n = (desired_chunks.max(1) as u64).min(max_chunks.max(1));

    if effective_n <= 1 || total_len == 0 {
        return Ok(vec![ByteRange::new(0, total_len as usize)]);
    }

    let initial_radius = (needle.len() as u64 * INITIAL_RADIUS_NEEDLE_FACTOR).max(MIN_INITIAL_RADIUS);

    let mut ranges = Vec::with_capacity(effective_n as usize);
    let mut prev_end = 0u64;
    let mut cut = 0u64;

    while cut < effective_n - 1 {
        let chunks_remaining = effective_n - cut;
        let target = prev_end + (total_len - prev_end) / chunks_remaining;

        match find_boundary_near(source, needle, target, prev_end, total_len, initial_radius)? {
            Some((chunk_end, next_start)) => {
                ranges.push(ByteRange::new(prev_end as usize, chunk_end as usize));
                prev_end = next_start;
                cut += 1;
            }
            // No further delimiter in the remaining source: stop cutting early, the tail becomes
            // one final chunk rather than `desired_chunks` worth.
            None => break,
        }
    }
    ranges.push(ByteRange::new(prev_end as usize, total_len as usize));

    Ok(ranges)
}

/// Partitions a seekable source into `desired_segments` delimiter-aligned byte ranges.
///
/// A thin naming-parity wrapper over [`plan_chunks`]: callers migrating off record-oriented
/// seeking code that expects a `segments`-shaped entry point can use this name instead.
pub fn segments<R: Read + Seek>(
    source: &mut R,
    needle: &Needle,
    desired_segments: usize,
) -> Result<Vec<ByteRange>> {
    plan_chunks(source, needle, desired_segments)
}

/// Estimates the number of delimiter-bounded records in a seekable source without scanning it in
/// full: counts delimiter occurrences in a leading sample of up to `DEFAULT_SAMPLE_LEN` bytes and
/// extrapolates that density over the whole source. Exact if the sample already covers the whole
/// source.
pub fn approx_count<R: Read + Seek>(source: &mut R, needle: &Needle) -> Result<u64> {
    let total_len = source.seek(SeekFrom::End(0))?;
    if total_len == 0 {
        return Ok(0);
    }

    let sample_len = DEFAULT_SAMPLE_LEN.min(total_len);
    source.seek(SeekFrom::Start(0))?;
    let mut buf = vec![0u8; sample_len as usize];
    source.read_exact(&mut buf)?;

    let mut sample_count = 0u64;
    let mut search_pos = 0usize;
    while let Some(at) = needle.search(&buf, search_pos, buf.len()) {
        sample_count += 1;
        search_pos = at + needle.len();
    }
    // The sample's tail byte is not itself a delimiter: whatever trails the last occurrence in
    // the sample is still one (partial) record, same as a source with no trailing delimiter.
    sample_count += 1;

    if sample_len >= total_len {
        return Ok(sample_count);
    }

    let density = sample_count as f64 / sample_len as f64;
    Ok((density * total_len as f64).round().max(1.0) as u64)
}

/// Searches an ever-widening window centered on `target` (clamped to `[prev_end, total_len]`)
/// for the delimiter occurrence closest to it. Returns `(chunk_end, next_start)` — the byte just
/// before the delimiter, and the byte just past it — or `None` if the remaining source holds no
/// more delimiter occurrences at all.
fn find_boundary_near<R: Read + Seek>(
    source: &mut R,
    needle: &Needle,
    target: u64,
    prev_end: u64,
    total_len: u64,
    initial_radius: u64,
) -> Result<Option<(u64, u64)>> {
    let mut radius = initial_radius;
    loop {
        let lo = target.saturating_sub(radius).max(prev_end);
        let hi = (target + radius).min(total_len);
        let window_is_whole_remainder = lo == prev_end && hi == total_len;

        if lo < hi {
            source.seek(SeekFrom::Start(lo))?;
            let mut buf = vec![0u8; (hi - lo) as usize];
            source.read_exact(&mut buf)?;

            let mut best: Option<u64> = None;
            let mut best_dist = u64::MAX;
            let mut search_pos = 0usize;
            while let Some(at) = needle.search(&buf, search_pos, buf.len()) {
                let abs = lo + at as u64;
                let dist = abs.abs_diff(target);
                if dist < best_dist || (dist == best_dist && best.is_none_or(|b| abs < b)) {
                    best = Some(abs);
                    best_dist = dist;
                }
                search_pos = at + needle.len();
            }

            if let Some(pos) = best {
                return Ok(Some((pos, pos + needle.len() as u64)));
            }
        }

        if window_is_whole_remainder {
            return Ok(None);
        }
        radius = radius.saturating_mul(2).max(1);
    }
}
