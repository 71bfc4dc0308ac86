/// A consecutive group of items processed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<T> {
    pub index: usize,
    pub items: Vec<T>,
}

/// Split `items` into consecutive groups of `batch_size`, preserving order.
///
/// The last group holds the remainder. A `batch_size` of zero is treated as one.
pub fn partition<T>(items: Vec<T>, batch_size: usize) -> Vec<Batch<T>> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::with_capacity(items.len().div_ceil(batch_size));
    let mut current = Vec::with_capacity(batch_size);

    for item in items {
        current.push(item);
        if current.len() == batch_size {
            let index = batches.len();
            let items = std::mem::replace(&mut current, Vec::with_capacity(batch_size));
            batches.push(Batch { index, items });
        }
    }
    if !current.is_empty() {
        let index = batches.len();
        batches.push(Batch {
            index,
            items: current,
        });
    }
    batches
}
