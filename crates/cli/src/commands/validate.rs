//! `validate`: parse every definition without opening a browser

use anyhow::Context;

use sauce_harness::{HarnessConfig, SuiteLoader};

use crate::output::{self, OutputFormat, SuiteOverview};

pub fn execute(config: &HarnessConfig, format: OutputFormat) -> anyhow::Result<i32> {
    let loader = SuiteLoader::new(config.paths.data_dir.clone());

    let mut overview = Vec::new();
    for id in loader.discover() {
        let suite = loader
            .load(&id)
            .with_context(|| format!("Invalid definitions for suite '{}'", id))?;
        overview.push(SuiteOverview::from(&suite));
    }
    output::print_list(&overview, format);

    let search = &config.paths.product_search_config;
    if search.exists() {
        let product = loader.load_product_search(search)?;
        output::print_success(&format!(
            "Product search for '{}' at ${} is valid",
            product.name(),
            product.expected_price()
        ));
    } else {
        output::print_warning(&format!("No product search document at {}", search.display()));
    }

    Ok(0)
}
