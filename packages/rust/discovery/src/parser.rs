//! Search results page parser.
//!
//! Organic results on the DuckDuckGo HTML endpoint are anchors carrying the
//! `result__a` class. Their `href` is either the target URL itself or a
//! protocol-relative redirect of the form `//duckduckgo.com/l/?uddg=<target>`.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

/// Organic result anchors.
static RESULT_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.result__a").expect("result link selector"));

/// Query parameter holding the real target in redirect links.
const REDIRECT_PARAM: &str = "uddg";

/// Extract candidate hrefs from a results page, in document order.
///
/// Redirect wrappers are unwrapped; everything else is passed through as-is
/// and left for the resolver to validate.
pub(crate) fn parse_result_links(html: &str, base: &Url) -> Vec<String> {
    let doc = Html::parse_document(html);

    doc.select(&RESULT_LINK_SEL)
        .filter_map(|el| el.value().attr("href"))
        .map(|href| unwrap_redirect(href.trim(), base))
        .filter(|href| !href.is_empty())
        .collect()
}

/// Turn a redirect href into its target; leave ordinary hrefs untouched.
fn unwrap_redirect(href: &str, base: &Url) -> String {
    if !href.starts_with("//") && !href.starts_with("/l/") {
        return href.to_string();
    }

    let Ok(resolved) = base.join(href) else {
        return href.to_string();
    };

    let is_redirect = resolved
        .host_str()
        .is_some_and(|h| h == "duckduckgo.com" || h.ends_with(".duckduckgo.com"))
        && resolved.path().starts_with("/l/");

    if is_redirect {
        if let Some((_, target)) = resolved.query_pairs().find(|(k, _)| k == REDIRECT_PARAM) {
            return target.into_owned();
        }
    }

    resolved.to_string()
}
