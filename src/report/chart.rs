//! The pie chart of yearly spending by category.
//!
//! The chart is an ECharts configuration built with charming, serialised to
//! JSON and initialised by a script in the page head.

use charming::{
    Chart,
    component::{Legend, Title},
    element::{JsFunction, Orient, Tooltip, Trigger},
    series::Pie,
};
use maud::PreEscaped;

use crate::html::HeadElement;

/// The element ID of the chart container.
pub const CHART_ID: &str = "category-chart";

/// Build a pie chart with one slice per (category, total) pair.
pub fn category_pie_chart(year: i32, totals: &[(String, f64)]) -> Chart {
    let data = totals
        .iter()
        .map(|(category, total)| (*total, category.as_str()))
        .collect::<Vec<_>>();

    Chart::new()
        .title(
            Title::new()
                .text("Spending by category")
                .subtext(year.to_string())
                .left("center"),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().orient(Orient::Vertical).left("left"))
        .series(
            Pie::new()
                .name("Expenses")
                .radius("60%")
                .data(data),
        )
}

/// Generates the JavaScript that renders `chart` into the container with [CHART_ID].
///
/// Follows the browser's dark mode setting and resizes with the window.
pub fn chart_script(chart: &Chart) -> HeadElement {
    let script = format!(
        r#"document.addEventListener('DOMContentLoaded', function() {{
            const chartDom = document.getElementById("{CHART_ID}");
            const chart = echarts.init(chartDom);
            const option = {};
            chart.setOption(option);

            window.addEventListener('resize', chart.resize);

            const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
            const updateTheme = () => {{
                const isDarkMode = darkModeMediaQuery.matches;
                chart.setTheme(isDarkMode ? 'dark' : 'default');
            }}
            darkModeMediaQuery.addEventListener('change', updateTheme);
            updateTheme();
        }});"#,
        chart
    );

    HeadElement::ScriptSource(PreEscaped(script))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

#[cfg(test)]
mod chart_tests {
    use crate::html::HeadElement;

    use super::{CHART_ID, category_pie_chart, chart_script};

    #[test]
    fn chart_has_a_slice_per_category() {
        let totals = vec![("Food".to_owned(), 10.25), ("Rent".to_owned(), 1000.0)];

        let options = category_pie_chart(2024, &totals).to_string();

        assert!(options.contains("\"pie\""), "got {options}");
        assert!(options.contains("\"Food\""), "got {options}");
        assert!(options.contains("\"Rent\""), "got {options}");
        assert!(options.contains("2024"), "got {options}");
    }

    #[test]
    fn script_targets_chart_container() {
        let chart = category_pie_chart(2024, &[]);

        let HeadElement::ScriptSource(script) = chart_script(&chart) else {
            panic!("want inline script");
        };

        assert!(script.0.contains(CHART_ID));
        assert!(script.0.contains("DOMContentLoaded"));
    }
}
