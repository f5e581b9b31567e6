//! Splitting files into shard fragments and reassembling them.
//!
//! A file of `len` bytes spread over `n` shards is cut into `n` contiguous
//! ranges of `len / n` bytes. The last range also carries the `len % n`
//! remainder, so every byte lands in exactly one fragment.
//!
//! Fragments travel over concurrent, unordered network calls. [`merge`]
//! restores the original byte order by sorting on shard id before
//! concatenating, never by arrival order.

use bytes::{Bytes, BytesMut};

/// Identifier of a shard node, and of the fragment position it holds.
pub type ShardId = i64;

/// One contiguous fragment of a file, tagged with the shard that stores it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shard {
    pub shard_id: ShardId,
    pub data: Bytes,
}

impl Shard {
    pub fn new(shard_id: ShardId, data: Bytes) -> Self {
        Self { shard_id, data }
    }
}

/// Split `content` into one fragment per entry of `shard_ids`.
///
/// Fragment `i` goes to the `i`th smallest shard id, whatever order the ids
/// are passed in, which is the order [`merge`] reassembles by. Fragments are
/// zero-copy slices of `content`.
pub fn split(content: &Bytes, shard_ids: &[ShardId]) -> crate::Result<Vec<Shard>> {
    if shard_ids.is_empty() {
        return Err(crate::Error::NoShards);
    }
    if content.is_empty() {
        return Err(crate::Error::EmptyContent);
    }

    let mut ordered = shard_ids.to_vec();
    ordered.sort_unstable();
    if let Some(pair) = ordered.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(crate::Error::DuplicateShard(pair[0]));
    }

    let n = shard_ids.len();
    let part_size = content.len() / n;

    let shards = ordered
        .iter()
        .enumerate()
        .map(|(i, shard_id)| {
            let start = i * part_size;
            let end = if i + 1 == n {
                content.len()
            } else {
                start + part_size
            };
            Shard::new(*shard_id, content.slice(start..end))
        })
        .collect();

    Ok(shards)
}

/// Reassemble fragments into the original content.
///
/// Fragments are ordered by ascending shard id regardless of the order they
/// were collected in.
pub fn merge(mut fragments: Vec<Shard>) -> Bytes {
    fragments.sort_by_key(|shard| shard.shard_id);

    if fragments.len() == 1 {
        return fragments.swap_remove(0).data;
    }

    let total = fragments.iter().map(|shard| shard.data.len()).sum();
    let mut merged = BytesMut::with_capacity(total);
    for shard in &fragments {
        merged.extend_from_slice(&shard.data);
    }
    merged.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(len: usize) -> Bytes {
        Bytes::from((0..len).map(|i| (i % 251) as u8).collect::<Vec<u8>>())
    }

    #[test]
    fn test_split_even_three_ways() {
        let content = payload(132);
        let shards = split(&content, &[1, 2, 3]).unwrap();

        assert_eq!(shards.len(), 3);
        for shard in &shards {
            assert_eq!(shard.data.len(), 44);
        }
        assert_eq!(shards[0].data, content.slice(0..44));
        assert_eq!(shards[2].data, content.slice(88..132));
        assert_eq!(merge(shards), content);
    }

    #[test]
    fn test_split_single_shard_is_whole_payload() {
        let content = Bytes::from_static(b"hello world");
        let shards = split(&content, &[7]).unwrap();

        assert_eq!(shards, vec![Shard::new(7, content.clone())]);
        assert_eq!(merge(shards), Bytes::from_static(b"hello world"));
    }

    #[test]
    fn test_split_remainder_goes_to_last_shard() {
        let content = payload(100);
        let shards = split(&content, &[1, 2, 3]).unwrap();

        let sizes: Vec<usize> = shards.iter().map(|s| s.data.len()).collect();
        assert_eq!(sizes, vec![33, 33, 34]);
        assert_eq!(merge(shards), content);
    }

    #[test]
    fn test_split_fewer_bytes_than_shards() {
        let content = Bytes::from_static(b"ab");
        let shards = split(&content, &[1, 2, 3]).unwrap();

        let sizes: Vec<usize> = shards.iter().map(|s| s.data.len()).collect();
        assert_eq!(sizes, vec![0, 0, 2]);
        assert_eq!(merge(shards), content);
    }

    #[test]
    fn test_split_rejects_empty_inputs() {
        assert!(matches!(
            split(&Bytes::new(), &[1, 2]),
            Err(crate::Error::EmptyContent)
        ));
        assert!(matches!(
            split(&payload(10), &[]),
            Err(crate::Error::NoShards)
        ));
    }

    #[test]
    fn test_split_rejects_duplicate_shard_ids() {
        assert!(matches!(
            split(&payload(10), &[1, 2, 1]),
            Err(crate::Error::DuplicateShard(1))
        ));
    }

    #[test]
    fn test_split_assigns_fragments_by_ascending_id() {
        let content = Bytes::from_static(b"AAABBBCCC");
        let shards = split(&content, &[3, 1, 2]).unwrap();

        assert_eq!(
            shards,
            vec![
                Shard::new(1, Bytes::from_static(b"AAA")),
                Shard::new(2, Bytes::from_static(b"BBB")),
                Shard::new(3, Bytes::from_static(b"CCC")),
            ]
        );
        assert_eq!(merge(shards), content);
    }

    #[test]
    fn test_roundtrip_with_unsorted_ids() {
        let content = payload(100);
        let shards = split(&content, &[30, 10, 20]).unwrap();

        let sizes: Vec<usize> = shards.iter().map(|s| s.data.len()).collect();
        assert_eq!(sizes, vec![33, 33, 34]);
        assert_eq!(shards[2].shard_id, 30);
        assert_eq!(merge(shards), content);
    }

    #[test]
    fn test_merge_orders_by_shard_id_not_arrival() {
        let content = payload(90);
        let mut shards = split(&content, &[10, 20, 30]).unwrap();
        shards.reverse();
        shards.swap(0, 1);

        assert_eq!(merge(shards), content);
    }

    #[test]
    fn test_merge_respects_non_contiguous_ids() {
        // Shard ids need not be dense; only their relative order matters.
        let content = payload(64);
        let shards = split(&content, &[3, 42, 1000, 1001]).unwrap();
        assert_eq!(merge(shards), content);
    }

    #[test]
    fn test_roundtrip_across_lengths() {
        for len in [1usize, 2, 5, 131, 132, 133, 4096, 10_007] {
            let content = payload(len);
            for n in 1..=5i64 {
                let ids: Vec<ShardId> = (1..=n).collect();
                let shards = split(&content, &ids).unwrap();
                assert_eq!(merge(shards), content, "len={len} n={n}");
            }
        }
    }
}
