//! Adjacent-run reduction shared by duplicate merging and skip folding

/// Collapse runs of adjacent items for which `same(previous, next)` holds,
/// folding each `next` into the run's first item with `merge`.
///
/// Order is preserved and items that never touch an equal neighbour are
/// returned untouched.
pub fn coalesce<T, S, M>(items: impl IntoIterator<Item = T>, mut same: S, mut merge: M) -> Vec<T>
where
    S: FnMut(&T, &T) -> bool,
    M: FnMut(&mut T, T),
{
    let mut result: Vec<T> = Vec::new();
    for item in items {
        match result.last_mut() {
            Some(previous) if same(previous, &item) => merge(previous, item),
            _ => result.push(item),
        }
    }
    result
}
