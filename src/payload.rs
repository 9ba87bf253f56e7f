//! Payload generation: tagged send buffers and sentinel-seeded receive
//! buffers.

use crate::element::Element;
use crate::plan::DistributionTable;
use crate::LayoutMode;

/// Fill the root's flattened send buffer for the given table.
///
/// Walks the element index space `[0, span)` with a cursor over the table,
/// advancing to the next rank when the index reaches the current rank's
/// `displacement + count` boundary. Every owned cell receives the owning
/// rank's tag; in skip mode, cells below the current rank's displacement are
/// gap cells and receive the sentinel.
///
/// With 4 ranks and 9 data elements the packed buffer is
/// `[1, 1, 2, 2, 3, 3, 4, 4, 4]`; with stride 2 the skip buffer is
/// `[-1, -1, 1, 1, -1, -1, 2, 2, -1, -1, 3, 3, -1, -1, 4, 4, 4]`.
pub fn fill_send_buffer<T: Element>(table: &DistributionTable, mode: LayoutMode) -> Vec<T> {
    let counts = table.counts();
    let displs = table.displs();
    let num_ranks = table.len();

    let mut buf = Vec::with_capacity(table.span());
    let mut r_idx = 0usize;
    let mut boundary = if num_ranks > 1 {
        (displs[0] + counts[0]) as usize
    } else {
        0
    };

    for i in 0..table.span() {
        if num_ranks > r_idx + 1 && i == boundary {
            r_idx += 1;
            boundary = (displs[r_idx] + counts[r_idx]) as usize;
        }
        let value = if mode == LayoutMode::Skip && i < displs[r_idx] as usize {
            T::sentinel()
        } else {
            T::tag(r_idx as i32)
        };
        buf.push(value);
    }
    buf
}

/// A receive buffer of `count` cells, each seeded with the sentinel so that
/// cells the transport never writes are detectable as mismatches.
pub fn sentinel_recv_buffer<T: Element>(count: usize) -> Vec<T> {
    vec![T::sentinel(); count]
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn plan(total: usize, n: i32, mode: LayoutMode, stride: usize) -> DistributionTable {
        DistributionTable::plan(total, n, mode, stride).unwrap()
    }

    #[test]
    fn packed_buffer_tags_every_cell() {
        let table = plan(9, 4, LayoutMode::Packed, 2);
        let buf: Vec<i32> = fill_send_buffer(&table, LayoutMode::Packed);
        assert_eq!(buf, vec![1, 1, 2, 2, 3, 3, 4, 4, 4]);
    }

    #[test]
    fn skip_buffer_interleaves_sentinel_gaps() {
        let table = plan(9, 4, LayoutMode::Skip, 2);
        let buf: Vec<i32> = fill_send_buffer(&table, LayoutMode::Skip);
        assert_eq!(
            buf,
            vec![-1, -1, 1, 1, -1, -1, 2, 2, -1, -1, 3, 3, -1, -1, 4, 4, 4]
        );
    }

    #[test]
    fn complex_packed_buffer() {
        let table = plan(5, 2, LayoutMode::Packed, 0);
        assert_eq!(table.counts(), &[2, 3]);
        let buf: Vec<Complex64> = fill_send_buffer(&table, LayoutMode::Packed);
        let one = Complex64::new(1.0, 1.0);
        let two = Complex64::new(2.0, 2.0);
        assert_eq!(buf, vec![one, one, two, two, two]);
    }

    #[test]
    fn single_rank_packed_is_all_ones() {
        let table = plan(4, 1, LayoutMode::Packed, 2);
        let buf: Vec<i32> = fill_send_buffer(&table, LayoutMode::Packed);
        assert_eq!(buf, vec![1, 1, 1, 1]);
    }

    #[test]
    fn single_rank_skip_keeps_the_leading_gap() {
        let table = plan(4, 1, LayoutMode::Skip, 2);
        let buf: Vec<i32> = fill_send_buffer(&table, LayoutMode::Skip);
        assert_eq!(buf, vec![-1, -1, 1, 1, 1, 1]);
    }

    #[test]
    fn every_owned_slice_carries_only_its_tag() {
        for mode in [LayoutMode::Packed, LayoutMode::Skip] {
            let table = plan(23, 5, mode, 3);
            let buf: Vec<i32> = fill_send_buffer(&table, mode);
            for rank in 0..table.len() as i32 {
                let start = table.displs()[rank as usize] as usize;
                let slice = &buf[start..start + table.count_for(rank)];
                assert!(slice.iter().all(|&v| v == i32::tag(rank)));
            }
        }
    }

    #[test]
    fn recv_buffer_is_sentinel_seeded() {
        let buf: Vec<i32> = sentinel_recv_buffer(3);
        assert_eq!(buf, vec![-1, -1, -1]);
        let buf: Vec<Complex64> = sentinel_recv_buffer(2);
        assert!(buf.iter().all(|&v| v == Complex64::sentinel()));
    }
}
