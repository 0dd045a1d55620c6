//! Catalog commands.

use qkart_storefront::Storefront;
use qkart_storefront::error::AppError;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Instant, sleep_until};

use super::{CommandError, Output};

/// List the full catalog.
pub async fn products(storefront: &Storefront, out: &Output) -> Result<(), CommandError> {
    storefront.load().await?;
    out.products(&storefront.products())
}

/// Run one search right away.
pub async fn search(storefront: &Storefront, out: &Output, text: &str) -> Result<(), CommandError> {
    let found = storefront.search_now(text).await.map_err(AppError::from)?;
    out.products(&found)
}

/// Read search box contents from stdin, one line per keystroke.
///
/// Lines go through the search debouncer, so a burst of input produces one
/// search. Results are printed whenever a search settles. After end of
/// input, waits for the pending search before exiting.
pub async fn browse(storefront: &Storefront, out: &Output) -> Result<(), CommandError> {
    storefront.load().await?;
    let config = storefront.state().config();
    let grace = config.search_debounce + config.request_timeout;

    let mut searches = storefront.subscribe_searches();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut deadline: Option<Instant> = None;
    let mut awaiting = false;

    loop {
        tokio::select! {
            line = lines.next_line(), if deadline.is_none() => match line? {
                Some(text) => {
                    storefront.on_search_input(text);
                    awaiting = true;
                }
                None => {
                    if !awaiting {
                        break;
                    }
                    deadline = Some(Instant::now() + grace);
                }
            },
            changed = searches.changed() => {
                if changed.is_err() {
                    break;
                }
                out.products(&storefront.filtered_products())?;
                awaiting = storefront.search_pending();
                if deadline.is_some() && !awaiting {
                    break;
                }
            },
            () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                tracing::warn!("Timed out waiting for search results");
                break;
            },
        }
    }
    Ok(())
}
