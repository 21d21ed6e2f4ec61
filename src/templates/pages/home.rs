// templates/pages/home.rs

use crate::templates::{card, desktop_layout};
use maud::{html, Markup};

pub fn home_page(search_configured: bool) -> Markup {
    desktop_layout(
        "Search",
        html! {
            main class="container" {
                h1 { "Find Fix & Flip Deals" }

                @if !search_configured {
                    p style="color: #b45309;" {
                        "Listing search is not configured. Set ZILLOW_API_KEY and restart."
                    }
                }

                (card("Search", search_form()))

                (card("How deals are scored", html! {
                    p {
                        "Each listing is offered at 70% of its estimated value minus rehab "
                        "at $25, $40 and $60 per square foot. The best of the three "
                        "scenarios sets the 1 to 10 deal score."
                    }
                    p { "Addresses analyzed in the last 30 days are skipped." }
                }))
            }
        },
    )
}

fn search_form() -> Markup {
    html! {
        form action="/search" method="post" style="display: grid; gap: 0.6rem; max-width: 420px;" {
            label for="location" { "Location (city, county or ZIP)" }
            input type="text" name="location" id="location" required placeholder="Atlanta, GA";

            label for="min_price" { "Min price" }
            input type="number" name="min_price" id="min_price" min="0" step="1000";

            label for="max_price" { "Max price" }
            input type="number" name="max_price" id="max_price" min="0" step="1000";

            label for="beds_min" { "Min beds" }
            input type="number" name="beds_min" id="beds_min" min="0";

            label for="baths_min" { "Min baths" }
            input type="number" name="baths_min" id="baths_min" min="0";

            label for="screen_count" { "Listings to analyze" }
            input type="number" name="screen_count" id="screen_count" min="1" max="200" value="20";

            label for="analyze_count" { "Detail lookups" }
            input type="number" name="analyze_count" id="analyze_count" min="0" max="50" value="5";

            label {
                input type="checkbox" name="include_trends" value="1";
                " Include value history"
            }
            label {
                input type="checkbox" name="save" value="1" checked;
                " Save results"
            }

            button type="submit" style="padding: 8px 16px; font-size: 16px; cursor: pointer;" { "Analyze" }
        }
    }
}
