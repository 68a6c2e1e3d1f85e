use anyhow::Context;
use scraper::Html;
use tracing::{debug, info};

use crate::{selector, session::Session, Result, PENSION_LINK_TITLE};

/// Finds the "My Workplace Pension" link on the landing page and returns its target
/// relative to the session base URL, i.e. with the leading `/<organisation>` removed.
pub fn find_pension_link(html: &str, organisation: &str) -> Result<Option<String>> {
    let doc = Html::parse_document(html);
    let anchor_sel = selector("a[title]")?;

    let href = doc
        .select(&anchor_sel)
        .filter(|a| a.value().attr("title") == Some(PENSION_LINK_TITLE))
        .find_map(|a| a.value().attr("href"));

    Ok(href.map(|h| h.replacen(&format!("/{organisation}"), "", 1)))
}

/// Follows the pension link from the post-login page and returns the details page body.
///
/// A missing link is an error: it is also what a rejected login looks like.
pub fn open_pension_details(
    session: &Session,
    landing_page: &str,
    organisation: &str,
) -> Result<String> {
    let link = find_pension_link(landing_page, organisation)?.with_context(|| {
        format!("\"{PENSION_LINK_TITLE}\" link not found on the post-login page (login rejected?)")
    })?;
    debug!(%link, "pension link");
    info!("opening pension details");
    session.get(&link)
}
