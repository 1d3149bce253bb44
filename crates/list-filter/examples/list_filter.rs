//! Console walkthrough of the lazy filter pipeline.
//!
//! Generates 6000 items, then replays a scripted session on the event loop:
//! a typing burst, a sort toggle, a reload and a cleared query. Each
//! published view is printed as it arrives.
//!
//! Run with: cargo run -p list-filter --example list_filter
//! Set `RUST_LOG=list_filter=debug` to watch the debounce and worker.

use std::sync::Arc;
use std::time::Duration;

use list_filter::{Item, ItemProvider, LazyFilter, SortRule, title_contains};
use list_filter_core::{EventLoop, EventLoopHandle};
use tracing_subscriber::EnvFilter;

/// Run `step` on the loop thread `at` after startup.
fn schedule(handle: &EventLoopHandle, at: u64, step: impl FnOnce() + Send + 'static) {
    handle.start_timer(Duration::from_millis(at), step);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("list_filter=info")),
        )
        .init();

    let event_loop = EventLoop::new();
    let handle = event_loop.handle();

    let provider = Arc::new(ItemProvider::new(handle.clone()));
    provider.load_now();
    println!("Generated {} items", provider.store().len());

    let filter: Arc<LazyFilter<Item>> = Arc::new(LazyFilter::new(
        provider.store().clone(),
        title_contains,
        SortRule::TitleAscending,
        handle.clone(),
    )?);

    filter.subscribe(|view| {
        let preview: Vec<&str> = view.iter().take(3).map(Item::title).collect();
        println!(
            "[generation {}] {} items, first: {:?}",
            view.generation(),
            view.len(),
            preview
        );
    })?;
    filter.sort_rule_changed().connect(|rule| println!("Sort: {rule}"));
    filter.query_changed().connect(|query| println!("Query: {query:?}"));

    // A typing burst inside one debounce window: only "ab3" is computed.
    for (i, text) in ["a", "ab", "ab3"].into_iter().enumerate() {
        let filter = filter.clone();
        schedule(&handle, 400 + 50 * i as u64, move || {
            let _ = filter.set_query(text);
        });
    }

    let toggle = filter.clone();
    schedule(&handle, 1200, move || {
        let _ = toggle.set_sort_rule(toggle.sort_rule().toggled());
    });

    let reload = provider.clone();
    schedule(&handle, 1800, move || {
        if let Ok(sequence) = reload.reload() {
            println!("Reload #{sequence} requested");
        }
    });

    let clear = filter.clone();
    schedule(&handle, 2600, move || {
        let _ = clear.set_query("");
    });

    let finish = filter.clone();
    let quit = handle.clone();
    schedule(&handle, 3400, move || {
        println!("Stats: {:?}", finish.stats());
        finish.dispose();
        quit.quit();
    });

    event_loop.run()?;
    Ok(())
}
