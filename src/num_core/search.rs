//! Binary search over sorted slices driven by a signed distance function.
//!
//! The distance returned for an element is negative when the element is too small, zero on a
//! match and positive when it is too big. The two variants differ in how they break ties inside
//! a run of matching elements and in what they report when nothing matches.

/// Index of the **first** matching element, or of the largest too-small element otherwise.
///
/// Arguments
/// ---------
/// * `items`: slice sorted so that `distance` is non-decreasing along it
/// * `distance`: signed distance of an element to the target
///
/// Return
/// ----------
/// * the first index with zero distance if any
/// * otherwise the index of the last element with negative distance
/// * `-1` when every element is too big, `len - 1` when every element is too small
///
/// See also
/// ------------
/// * [`search_high`] – same search biased toward the end of a run of matches
pub fn search_low<T, F>(items: &[T], distance: F) -> isize
where
    F: Fn(&T) -> f64,
{
    let first_not_small = items.partition_point(|x| distance(x) < 0.0);
    if first_not_small < items.len() && distance(&items[first_not_small]) == 0.0 {
        first_not_small as isize
    } else {
        first_not_small as isize - 1
    }
}

/// Index of the **last** matching element, or of the smallest too-big element otherwise.
///
/// Arguments
/// ---------
/// * `items`: slice sorted so that `distance` is non-decreasing along it
/// * `distance`: signed distance of an element to the target
///
/// Return
/// ----------
/// * the last index with zero distance if any
/// * otherwise the index of the first element with positive distance
/// * `len` when every element is too small, `0` when every element is too big
pub fn search_high<T, F>(items: &[T], distance: F) -> isize
where
    F: Fn(&T) -> f64,
{
    let first_big = items.partition_point(|x| distance(x) <= 0.0);
    if first_big > 0 && distance(&items[first_big - 1]) == 0.0 {
        first_big as isize - 1
    } else {
        first_big as isize
    }
}
