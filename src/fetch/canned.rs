// src/fetch/canned.rs
// =============================================================================
// A small, fixed documentation site used by the `demo` command.
//
// The pages link back to each other (pkg/ -> root, fmt/ -> pkg/, ...) and
// two of them link to cmd/, which does not exist. That makes it a handy
// graph for watching cycle handling and error reporting without a network.
// =============================================================================

use crate::traverse::StaticExpander;

pub const CANNED_ROOT: &str = "https://golang.org/";

/// Builds the canned site: four pages plus a dangling link to `cmd/`.
pub fn canned_site() -> StaticExpander<String, String> {
    let page = |url: &str, body: &str, links: &[&str]| {
        (
            url.to_string(),
            body.to_string(),
            links.iter().map(|link| link.to_string()).collect::<Vec<_>>(),
        )
    };

    [
        page(
            "https://golang.org/",
            "The Go Programming Language",
            &["https://golang.org/pkg/", "https://golang.org/cmd/"],
        ),
        page(
            "https://golang.org/pkg/",
            "Packages",
            &[
                "https://golang.org/",
                "https://golang.org/cmd/",
                "https://golang.org/pkg/fmt/",
                "https://golang.org/pkg/os/",
            ],
        ),
        page(
            "https://golang.org/pkg/fmt/",
            "Package fmt",
            &["https://golang.org/", "https://golang.org/pkg/"],
        ),
        page(
            "https://golang.org/pkg/os/",
            "Package os",
            &["https://golang.org/", "https://golang.org/pkg/"],
        ),
    ]
    .into_iter()
    .collect()
}
