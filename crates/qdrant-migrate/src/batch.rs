//! Batching of identifier lists.
//!
//! Reader and writer both work on bounded chunks of the identifier list. The
//! chunking is a free function parameterized by a per-batch callback so it can
//! be shared without any type hierarchy.

use std::future::Future;

use crate::error::{Error, Result};

/// Default number of identifiers per batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Largest batch the source accepts in one fetch.
pub const MAX_BATCH_SIZE: usize = 1000;

/// One chunk of the full identifier list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a, T> {
    /// Zero-based batch number.
    pub index: usize,
    /// Position of the first item within the full list.
    pub offset: usize,
    /// Items of this batch, in input order.
    pub items: &'a [T],
}

impl<T> Batch<'_, T> {
    /// Number of items in the batch.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Splits `items` into consecutive batches of at most `batch_size`.
///
/// # Errors
///
/// Returns [`Error::Config`] if `batch_size` is zero.
pub fn batches<T>(items: &[T], batch_size: usize) -> Result<impl Iterator<Item = Batch<'_, T>>> {
    if batch_size == 0 {
        return Err(Error::Config(
            "batch_size must be greater than 0".to_string(),
        ));
    }

    Ok(items
        .chunks(batch_size)
        .enumerate()
        .map(move |(index, items)| Batch {
            index,
            offset: index * batch_size,
            items,
        }))
}

/// Runs `f` on every batch in order, stopping at the first error.
///
/// Each callback future is awaited before the next batch is produced, so at
/// most one batch is in flight. Returns the per-batch outputs in order.
///
/// # Errors
///
/// Returns the first error produced by `f`, or [`Error::Config`] for a zero
/// batch size.
pub async fn try_for_each_batch<'a, T, R, F, Fut>(
    items: &'a [T],
    batch_size: usize,
    mut f: F,
) -> Result<Vec<R>>
where
    F: FnMut(Batch<'a, T>) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let mut outputs = Vec::with_capacity(items.len().div_ceil(batch_size.max(1)));
    for batch in batches(items, batch_size)? {
        outputs.push(f(batch).await?);
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_batches_split_with_remainder() {
        let ids = vec!["1", "2", "3"];
        let result: Vec<_> = batches(&ids, 2).unwrap().collect();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].items, &["1", "2"]);
        assert_eq!(result[0].offset, 0);
        assert_eq!(result[1].items, &["3"]);
        assert_eq!(result[1].offset, 2);
        assert_eq!(result[1].index, 1);
    }

    #[test]
    fn test_batches_empty_input() {
        let ids: Vec<String> = Vec::new();
        assert_eq!(batches(&ids, 10).unwrap().count(), 0);
    }

    #[test]
    fn test_batches_zero_size_rejected() {
        let ids = vec![1, 2, 3];
        assert!(matches!(batches(&ids, 0), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_try_for_each_batch_collects_outputs() {
        let ids: Vec<u32> = (0..5).collect();
        let sums = try_for_each_batch(&ids, 2, |batch| async move {
            Ok::<_, Error>(batch.items.iter().sum::<u32>())
        })
        .await
        .unwrap();

        assert_eq!(sums, vec![1, 5, 4]);
    }

    #[tokio::test]
    async fn test_try_for_each_batch_stops_on_first_error() {
        let ids: Vec<u32> = (0..10).collect();
        let mut seen = Vec::new();
        let result = try_for_each_batch(&ids, 3, |batch| {
            seen.push(batch.index);
            async move {
                if batch.index == 1 {
                    Err(Error::Config("boom".to_string()))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(seen, vec![0, 1]);
    }

    proptest! {
        #[test]
        fn prop_batches_partition_input(
            items in proptest::collection::vec(any::<u32>(), 0..500),
            batch_size in 1usize..64,
        ) {
            let parts: Vec<_> = batches(&items, batch_size).unwrap().collect();

            let flattened: Vec<u32> = parts.iter().flat_map(|b| b.items.iter().copied()).collect();
            prop_assert_eq!(&flattened, &items);

            for (i, part) in parts.iter().enumerate() {
                prop_assert!(!part.is_empty());
                prop_assert!(part.len() <= batch_size);
                prop_assert_eq!(part.index, i);
                prop_assert_eq!(part.offset, i * batch_size);
            }
        }
    }
}
