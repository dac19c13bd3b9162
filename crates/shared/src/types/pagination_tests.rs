use super::*;
use rstest::rstest;

#[test]
fn test_page_request_default() {
    let request = PageRequest::default();
    assert_eq!(request.page, 1);
    assert_eq!(request.limit, 20);
}

#[test]
fn test_page_request_offset() {
    let request = PageRequest { page: 1, limit: 20 };
    assert_eq!(request.offset(), 0);

    let request = PageRequest { page: 3, limit: 20 };
    assert_eq!(request.offset(), 40);
}

#[rstest]
#[case(None, None, 1, 20)]
#[case(Some(0), Some(0), 1, 1)]
#[case(Some(4), Some(500), 4, 100)]
#[case(Some(2), Some(50), 2, 50)]
fn test_page_request_from_query(
    #[case] page: Option<u64>,
    #[case] limit: Option<u64>,
    #[case] expected_page: u64,
    #[case] expected_limit: u64,
) {
    let request = PageRequest::from_query(page, limit);
    assert_eq!(request.page, expected_page);
    assert_eq!(request.limit, expected_limit);
}

#[test]
fn test_paged_map_keeps_total() {
    let page = Paged::new(vec![1, 2, 3], 42);
    let mapped = page.map(|n| n * 10);

    assert_eq!(mapped.rows, vec![10, 20, 30]);
    assert_eq!(mapped.total_count, 42);
}

#[test]
fn test_pager_new() {
    let pager = Pager::new(PageRequest { page: 2, limit: 10 }, 25);
    assert_eq!(
        pager,
        Pager {
            total: 25,
            page: 2,
            limit: 10
        }
    );
}
