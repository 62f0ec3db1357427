use super::*;
use std::time::Duration;

fn page_of(items: Vec<u32>) -> Page<u32> {
    Page {
        total_elements: items.len() as u64,
        total_pages: 1,
        content: items,
        page: None,
        size: None,
    }
}

#[tokio::test(start_paused = true)]
async fn keyword_settles_only_after_typing_pauses() {
    let debouncer = Debouncer::default();
    let mut settled = debouncer.subscribe();

    debouncer.push("s").await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    debouncer.push("so").await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    debouncer.push("soil").await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(debouncer.current(), "");
    assert!(!settled.has_changed().expect("sender alive"));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(settled.has_changed().expect("sender alive"));
    assert_eq!(*settled.borrow_and_update(), "soil");
}

#[tokio::test(start_paused = true)]
async fn flush_settles_immediately_and_cancels_pending_input() {
    let debouncer = Debouncer::new(Duration::from_millis(300));

    debouncer.push("draft").await;
    debouncer.flush("final").await;
    assert_eq!(debouncer.current(), "final");

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(debouncer.current(), "final");
}

#[tokio::test(start_paused = true)]
async fn repeating_the_settled_keyword_does_not_notify() {
    let debouncer = Debouncer::new(Duration::from_millis(50));
    let mut settled = debouncer.subscribe();

    debouncer.push("x").await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    settled.borrow_and_update();

    debouncer.push("x").await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(!settled.has_changed().expect("sender alive"));
}

#[test]
fn only_the_latest_ticket_is_current() {
    let generation = RequestGeneration::new();
    let first = generation.begin();
    let second = generation.begin();

    assert!(first < second);
    assert!(!generation.is_current(first));
    assert!(generation.is_current(second));
}

#[test]
fn stale_responses_are_dropped() {
    let mut list = ListState::<u32>::default();
    let slow = list.begin_request();
    let fast = list.begin_request();

    assert!(list.accept(fast, page_of(vec![2])));
    assert!(!list.accept(slow, page_of(vec![1])));
    assert_eq!(list.items(), &[2]);
}

#[test]
fn keyword_change_resets_to_first_page() {
    let mut list = ListState::<u32>::new(20);
    list.set_page(3);

    assert!(!list.set_keyword(""));
    assert_eq!(list.query().page, 3);

    assert!(list.set_keyword("soil"));
    assert_eq!(list.query().page, 0);
    assert_eq!(list.query().size, 20);
}

#[test]
fn blank_keyword_means_no_filter() {
    let mut query = ListQuery::default();
    assert_eq!(query.keyword_filter(), None);
    query.keyword = "  soil ".to_string();
    assert_eq!(query.keyword_filter().as_deref(), Some("soil"));
    assert_eq!(ListState::<u32>::default().total_pages(), 0);
}

#[tokio::test(start_paused = true)]
async fn overlapping_fetches_keep_only_the_newest_page() {
    let mut list = ListState::<u32>::default();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    for (keyword, latency_ms, item) in [("so", 200, 1), ("soil", 50, 2)] {
        assert!(list.set_keyword(keyword));
        let ticket = list.begin_request();
        let tx = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(latency_ms)).await;
            let _ = tx.send((ticket, page_of(vec![item])));
        });
    }
    drop(tx);

    let mut applied = Vec::new();
    while let Some((ticket, page)) = rx.recv().await {
        let current = list.is_current(ticket);
        applied.push((list.accept(ticket, page), current));
    }

    assert_eq!(applied, vec![(true, true), (false, false)]);
    assert_eq!(list.items(), &[2]);
}
