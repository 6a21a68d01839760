//! Client-side pagination over an already sorted list

use serde::Serialize;

/// One page of items plus navigation data
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// 1-based page shown
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    /// 1-based rank of the first item on this page
    pub first_rank: usize,
    pub items: Vec<T>,
    /// Page buttons to show; `None` marks a gap
    pub window: Vec<Option<usize>>,
}

/// Number of pages needed for `total` items
pub fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Page to show for a request: out-of-range pages fall back to page 1
pub fn clamp_page(requested: usize, total: usize, page_size: usize) -> usize {
    let pages = total_pages(total, page_size);
    if requested == 0 || requested > pages {
        1
    } else {
        requested
    }
}

/// Slice `items` to the requested page
pub fn paginate<T: Clone>(items: &[T], requested: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let page = clamp_page(requested, items.len(), page_size);
    let pages = total_pages(items.len(), page_size);

    let start = ((page - 1) * page_size).min(items.len());
    let end = (start + page_size).min(items.len());

    Page {
        page,
        page_size,
        total_pages: pages,
        total_items: items.len(),
        first_rank: start + 1,
        items: items[start..end].to_vec(),
        window: page_window(page, pages),
    }
}

/// First, last and current ±1, with gaps between non-adjacent pages
pub fn page_window(current: usize, pages: usize) -> Vec<Option<usize>> {
    let mut window = Vec::new();
    let mut previous: Option<usize> = None;

    for page in 1..=pages {
        if page != 1 && page != pages && page.abs_diff(current) > 1 {
            continue;
        }
        if previous.is_some_and(|prev| page - prev > 1) {
            window.push(None);
        }
        window.push(Some(page));
        previous = Some(page);
    }

    window
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twenty_three_items_two_pages() {
        let items: Vec<usize> = (1..=23).collect();

        let first = paginate(&items, 1, 15);
        assert_eq!(first.items, (1..=15).collect::<Vec<_>>());
        assert_eq!(first.total_pages, 2);

        let second = paginate(&items, 2, 15);
        assert_eq!(second.items, (16..=23).collect::<Vec<_>>());
        assert_eq!(second.first_rank, 16);

        let beyond = paginate(&items, 3, 15);
        assert_eq!(beyond.page, 1);
        assert_eq!(beyond.items, first.items);
    }

    #[test]
    fn test_empty_list() {
        let page = paginate::<usize>(&[], 4, 15);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 0);
        assert!(page.items.is_empty());
        assert!(page.window.is_empty());
    }

    #[test]
    fn test_page_window_gaps() {
        assert_eq!(page_window(1, 2), vec![Some(1), Some(2)]);
        assert_eq!(page_window(5, 10), vec![Some(1), None, Some(4), Some(5), Some(6), None, Some(10)]);
        assert_eq!(page_window(2, 4), vec![Some(1), Some(2), Some(3), Some(4)]);
    }
}
