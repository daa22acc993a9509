//! The navigation bar shown at the top of every page behind the log-in.

use maud::{Markup, html};

use crate::endpoints;

/// The pages in the navigation bar as (URL, title) pairs, in display order.
const LINKS: [(&str, &str); 5] = [
    (endpoints::ROOT, "Expenses"),
    (endpoints::ADD_EXPENSE, "Add expense"),
    (endpoints::CATEGORIES, "Categories"),
    (endpoints::STRUCTURE, "Chart"),
    (endpoints::LOG_OUT, "Log out"),
];

const LINK_STYLE: &str = "rounded-lg px-3 py-2 text-sm font-semibold text-gray-700 \
    hover:bg-blue-50 hover:text-blue-700 dark:text-gray-300 dark:hover:bg-gray-800 \
    dark:hover:text-blue-300";

const CURRENT_LINK_STYLE: &str = "rounded-lg px-3 py-2 text-sm font-semibold bg-blue-700 \
    text-white dark:bg-blue-600";

/// Render the navigation bar with the link for `active_endpoint` marked as the
/// current page.
///
/// The chart and monthly view pick up the selected period from the period
/// cookie, so their links carry no query.
pub fn nav_bar(active_endpoint: &str) -> Markup {
    html!(
        nav class="bg-white border-b border-gray-200 dark:bg-gray-900 dark:border-gray-700"
        {
            div class="max-w-screen-xl mx-auto p-4 flex flex-wrap items-center justify-between gap-4"
            {
                a href=(endpoints::ROOT) class="text-2xl font-semibold whitespace-nowrap dark:text-white"
                {
                    "Spendbook"
                }

                ul class="flex flex-wrap gap-2" aria-label="Primary"
                {
                    @for (url, title) in LINKS {
                        @let is_current = url == active_endpoint && url != endpoints::LOG_OUT;

                        li {
                            a
                                href=(url)
                                class=(if is_current { CURRENT_LINK_STYLE } else { LINK_STYLE })
                                aria-current=[is_current.then_some("page")]
                            {
                                (title)
                            }
                        }
                    }
                }
            }
        }
    )
}
