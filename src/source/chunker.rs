use crate::core::error::Result;
use crate::core::types::Record;

/// Groups a record stream into batches of `batch_size`.
///
/// A stream error is yielded once, discarding the partial batch, and ends
/// iteration; the records of that batch are re-read on resume.
pub struct Chunker<I> {
    records: I,
    batch_size: usize,
    done: bool,
}

impl<I> Chunker<I>
where
    I: Iterator<Item = Result<Record>>,
{
    pub fn new(records: I, batch_size: usize) -> Self {
        Chunker {
            records,
            batch_size: batch_size.max(1),
            done: false,
        }
    }
}

impl<I> Iterator for Chunker<I>
where
    I: Iterator<Item = Result<Record>>,
{
    type Item = Result<Vec<Record>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut batch = Vec::with_capacity(self.batch_size.min(4096));
        while batch.len() < self.batch_size {
            match self.records.next() {
                Some(Ok(record)) => batch.push(record),
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{Error, ErrorKind};

    fn records(n: i64) -> Vec<Result<Record>> {
        (0..n).map(|i| Ok(Record::new().with("name", i))).collect()
    }

    #[test]
    fn last_batch_is_short() {
        let sizes: Vec<usize> = Chunker::new(records(7).into_iter(), 3)
            .map(|batch| batch.unwrap().len())
            .collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[test]
    fn empty_stream_yields_nothing() {
        assert_eq!(Chunker::new(records(0).into_iter(), 3).count(), 0);
    }

    #[test]
    fn error_drops_partial_batch_and_stops() {
        let mut input = records(4);
        input.push(Err(Error::disconnected("lost connection")));
        input.extend(records(2));

        let mut chunker = Chunker::new(input.into_iter(), 3);
        assert_eq!(chunker.next().unwrap().unwrap().len(), 3);
        let err = chunker.next().unwrap().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Disconnected);
        assert!(chunker.next().is_none());
    }
}
