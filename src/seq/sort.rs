//! Quicksort (Hoare partition, middle pivot) with a parallel index array.
//!
//! The sort is not stable: equal elements may be reordered by pivot swaps.

use super::SeqError;

/// Sorted copy of `x`.
pub fn sort<T: Ord + Copy>(x: &[T]) -> Vec<T> {
    arg_sort(x).0
}

/// Sorted copy of `x` together with the original position of each element.
pub fn arg_sort<T: Ord + Copy>(x: &[T]) -> (Vec<T>, Vec<usize>) {
    let mut values = x.to_vec();
    let mut indexes: Vec<usize> = (0..x.len()).collect();
    if !values.is_empty() {
        let right = values.len() as isize - 1;
        quick_sort(&mut values, 0, right, &mut indexes);
    }
    (values, indexes)
}

/// Gather: `y[i] = x[idx[i]]`.
pub fn sort_by_indexes<T: Copy>(x: &[T], idx: &[usize]) -> Result<Vec<T>, SeqError> {
    idx.iter()
        .map(|&i| x.get(i).copied().ok_or(SeqError::IndexOutOfBounds))
        .collect()
}

fn quick_sort<T: Ord + Copy>(arr: &mut [T], left: isize, right: isize, indexes: &mut [usize]) {
    if left >= right {
        return;
    }
    let pivot = arr[(left + (right - left) / 2) as usize];
    let (mut i, mut j) = (left, right);
    while i <= j {
        while arr[i as usize] < pivot {
            i += 1;
        }
        while pivot < arr[j as usize] {
            j -= 1;
        }
        if i <= j {
            arr.swap(i as usize, j as usize);
            indexes.swap(i as usize, j as usize);
            i += 1;
            j -= 1;
        }
    }
    if left < j {
        quick_sort(arr, left, j, indexes);
    }
    if i < right {
        quick_sort(arr, i, right, indexes);
    }
}
