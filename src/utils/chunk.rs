use std::num::NonZeroUsize;

/// Splits `items` into consecutive chunks of `size`. Only the last chunk may
/// be shorter.
pub fn chunk<T>(items: Vec<T>, size: NonZeroUsize) -> Vec<Vec<T>> {
    let size = size.get();
    let mut chunks = Vec::with_capacity(items.len().div_ceil(size));
    let mut items = items.into_iter().peekable();

    while items.peek().is_some() {
        chunks.push(items.by_ref().take(size).collect());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn chunk_count_is_ceiling_and_concat_restores_input() {
        for len in [0usize, 1, 4, 5, 6, 17, 100] {
            for n in [1usize, 2, 5, 7, 100, 500] {
                let items: Vec<usize> = (0..len).collect();
                let chunks = chunk(items.clone(), size(n));

                assert_eq!(chunks.len(), len.div_ceil(n), "len={} size={}", len, n);
                assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= n));
                assert_eq!(chunks.concat(), items);
            }
        }
    }

    #[test]
    fn only_last_chunk_is_short() {
        let chunks = chunk((0..7).collect::<Vec<_>>(), size(3));
        assert_eq!(chunks, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]);
    }
}
